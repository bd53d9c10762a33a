//! Graphics backend abstraction.
//!
//! [`RenderBackend`] is the only way the renderer touches the device. It
//! exposes immediate-style state changes (clear, pipeline, shader, uniform,
//! texture binding) and vertex-batch draws without leaking device objects:
//! shaders are backend-owned programs referenced by [`RenderBackend::Shader`],
//! textures by [`TextureHandle`](crate::texture::TextureHandle).
//!
//! Implementations:
//! - [`WgpuBackend`]: records the frame and replays it into one wgpu render pass
//! - [`RecordingBackend`]: headless, keeps a call trace (tests, tooling)
//!
//! Both share the bookkeeping rules in `state` and the shader reflection in
//! `reflect`, so redundant-bind elimination, idempotent upload and resize
//! validation behave identically.

mod recording;
mod reflect;
mod state;
mod vertex;
mod wgpu_backend;

pub use recording::{BackendCall, RecordedShader, RecordingBackend};
pub use reflect::{ShaderError, ShaderStage};
pub use state::Viewport;
pub use vertex::{ColoredVertex, TexturedVertex, Topology, VertexBatch, VertexKind};
pub use wgpu_backend::{WgpuBackend, WgpuShader};

pub(crate) use reflect::ProgramLayout;
pub(crate) use state::DeviceState;

use glam::Mat4;

use crate::paint::Color;
use crate::texture::Texture;

/// Fixed-function state applied to subsequent draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineSettings {
    /// Alpha blending with `(src_alpha, one_minus_src_alpha)`.
    pub blend: bool,
    /// Depth testing against the surface depth buffer.
    pub depth_test: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            blend: true,
            depth_test: false,
        }
    }
}

/// Identifier of a shader program inside one backend instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ShaderId(pub(crate) u32);

impl ShaderId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Device operations consumed by the renderer.
///
/// Failures never propagate: invalid handles, missing surfaces and empty
/// batches are logged (where useful) and ignored.
pub trait RenderBackend {
    /// Backend-specific shader program handle.
    ///
    /// Owned by whoever called [`create_shader`](Self::create_shader) and
    /// returned through [`release_shader`](Self::release_shader).
    type Shader;

    /// Binds the backend to its surface and creates the reusable buffers.
    ///
    /// Logs and returns without effect when no surface is attached.
    fn initialize(&mut self);

    fn is_initialized(&self) -> bool;

    /// Sets the clear color and clears color + depth.
    fn clear(&mut self, color: Color);

    fn set_pipeline(&mut self, settings: PipelineSettings);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Updates the viewport after a surface resize. Ignored if either side is `<= 0`.
    fn resize(&mut self, width: i32, height: i32);

    /// Compiles and links a program. `None` (logged) on failure.
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Option<Self::Shader>;

    fn release_shader(&mut self, shader: Self::Shader);

    fn use_shader(&mut self, shader: &Self::Shader);

    /// Sets a `mat4x4<f32>` uniform declared by `shader`.
    fn set_uniform_mat4(&mut self, shader: &Self::Shader, name: &str, value: &Mat4);

    /// Uploads `batch` and draws `batch.len()` vertices with the current state.
    fn draw(&mut self, batch: VertexBatch<'_>);

    /// Creates the device texture for `texture` unless it already has a handle.
    fn upload_texture(&mut self, texture: &Texture);

    /// Frees the device texture behind `texture` and resets its handle.
    fn release_texture(&mut self, texture: &Texture);

    /// Binds `texture` (uploading it first if needed). `None` unbinds.
    fn bind_texture(&mut self, texture: Option<&Texture>);

    fn unbind_texture(&mut self);
}
