use std::collections::{HashMap, HashSet};

use glam::Mat4;

use crate::paint::Color;
use crate::texture::{Texture, TextureHandle};

use super::reflect::reflect_program;
use super::{
    DeviceState, PipelineSettings, ProgramLayout, RenderBackend, ShaderId, Topology,
    VertexBatch, VertexKind, Viewport,
};

/// A device call as observed by [`RecordingBackend`].
///
/// Only calls that would reach the device are recorded: a redundant bind or a
/// rejected resize leaves no entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Initialize,
    Clear(Color),
    SetPipeline(PipelineSettings),
    SetViewport(Viewport),
    CreateShader(ShaderId),
    ReleaseShader(ShaderId),
    UseShader(ShaderId),
    SetUniformMat4 {
        shader: ShaderId,
        name: String,
        value: [f32; 16],
    },
    Draw {
        kind: VertexKind,
        topology: Topology,
        vertex_count: usize,
        shader: ShaderId,
        texture: TextureHandle,
    },
    UploadTexture {
        handle: TextureHandle,
        name: String,
    },
    ReleaseTexture(TextureHandle),
    BindTexture(TextureHandle),
    UnbindTexture,
}

/// Shader handle issued by [`RecordingBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct RecordedShader {
    id: ShaderId,
}

impl RecordedShader {
    #[inline]
    pub fn id(&self) -> ShaderId {
        self.id
    }
}

/// Headless backend that applies the same state rules as the device backend
/// and keeps a trace of the resulting device calls.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    surface: Option<(u32, u32)>,
    initialized: bool,
    state: DeviceState,
    programs: HashMap<ShaderId, ProgramLayout>,
    textures: HashSet<TextureHandle>,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    /// Creates a backend with a virtual `width`×`height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: Some((width, height)),
            ..Self::default()
        }
    }

    /// Creates a backend with no surface attached; `initialize` will fail.
    pub fn detached() -> Self {
        Self::default()
    }

    #[inline]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Returns and clears the recorded trace.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    #[inline]
    pub fn bound_texture(&self) -> TextureHandle {
        self.state.bound_texture
    }

    #[inline]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        self.state.settings
    }

    /// Number of device textures currently alive.
    #[inline]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of shader programs currently alive.
    #[inline]
    pub fn live_shaders(&self) -> usize {
        self.programs.len()
    }

    fn ready(&self, op: &str) -> bool {
        if !self.initialized {
            log::warn!("RecordingBackend: {op} before initialize; ignored");
        }
        self.initialized
    }
}

impl RenderBackend for RecordingBackend {
    type Shader = RecordedShader;

    fn initialize(&mut self) {
        let Some((width, height)) = self.surface else {
            log::error!("RecordingBackend: no surface attached; initialize skipped");
            return;
        };
        if self.initialized {
            return;
        }
        self.state.viewport = Viewport::new(0, 0, width, height);
        self.initialized = true;
        self.calls.push(BackendCall::Initialize);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(BackendCall::Clear(color));
    }

    fn set_pipeline(&mut self, settings: PipelineSettings) {
        self.state.settings = settings;
        self.calls.push(BackendCall::SetPipeline(settings));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
        self.calls.push(BackendCall::SetViewport(viewport));
    }

    fn resize(&mut self, width: i32, height: i32) {
        if let Some(viewport) = self.state.resize(width, height) {
            self.surface = Some((viewport.width, viewport.height));
            self.calls.push(BackendCall::SetViewport(viewport));
        }
    }

    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Option<RecordedShader> {
        if !self.ready("create_shader") {
            return None;
        }
        let layout = match reflect_program(vertex_src, fragment_src) {
            Ok(layout) => layout,
            Err(e) => {
                log::error!("RecordingBackend: shader creation failed: {e}");
                return None;
            }
        };
        let id = self.state.allocate_shader();
        self.programs.insert(id, layout);
        self.calls.push(BackendCall::CreateShader(id));
        Some(RecordedShader { id })
    }

    fn release_shader(&mut self, shader: RecordedShader) {
        if self.programs.remove(&shader.id).is_some() {
            self.state.forget_shader(shader.id);
            self.calls.push(BackendCall::ReleaseShader(shader.id));
        }
    }

    fn use_shader(&mut self, shader: &RecordedShader) {
        if !self.programs.contains_key(&shader.id) {
            log::warn!("RecordingBackend: use_shader with unknown shader {:?}", shader.id);
            return;
        }
        self.state.current_shader = Some(shader.id);
        self.calls.push(BackendCall::UseShader(shader.id));
    }

    fn set_uniform_mat4(&mut self, shader: &RecordedShader, name: &str, value: &Mat4) {
        let Some(layout) = self.programs.get(&shader.id) else {
            log::warn!("RecordingBackend: set_uniform_mat4 with unknown shader {:?}", shader.id);
            return;
        };
        if !layout.has_uniform(name) {
            log::warn!("RecordingBackend: shader {:?} has no uniform '{name}'", shader.id);
            return;
        }
        self.calls.push(BackendCall::SetUniformMat4 {
            shader: shader.id,
            name: name.to_string(),
            value: value.to_cols_array(),
        });
    }

    fn draw(&mut self, batch: VertexBatch<'_>) {
        if batch.is_empty() || !self.ready("draw") {
            return;
        }
        let Some(shader) = self.state.current_shader else {
            log::warn!("RecordingBackend: draw without a shader in use");
            return;
        };
        let Some(layout) = self.programs.get(&shader) else { return };
        if layout.vertex_kind != batch.kind() {
            log::warn!(
                "RecordingBackend: {:?} batch drawn with a {:?} shader; skipped",
                batch.kind(),
                layout.vertex_kind
            );
            return;
        }
        let texture = match batch.kind() {
            VertexKind::Textured if self.state.bound_texture.is_none() => {
                log::warn!("RecordingBackend: textured draw with no texture bound; skipped");
                return;
            }
            VertexKind::Textured => self.state.bound_texture,
            VertexKind::Colored => TextureHandle::NONE,
        };
        self.calls.push(BackendCall::Draw {
            kind: batch.kind(),
            topology: batch.topology(),
            vertex_count: batch.len(),
            shader,
            texture,
        });
    }

    fn upload_texture(&mut self, texture: &Texture) {
        if texture.is_uploaded() || !self.ready("upload_texture") {
            return;
        }
        let handle = self.state.allocate_texture();
        self.textures.insert(handle);
        texture.set_device_handle(handle);
        self.calls.push(BackendCall::UploadTexture {
            handle,
            name: texture.name().to_string(),
        });
    }

    fn release_texture(&mut self, texture: &Texture) {
        let handle = texture.device_handle();
        if !self.textures.remove(&handle) {
            return;
        }
        self.state.forget_texture(handle);
        texture.set_device_handle(TextureHandle::NONE);
        self.calls.push(BackendCall::ReleaseTexture(handle));
    }

    fn bind_texture(&mut self, texture: Option<&Texture>) {
        let Some(texture) = texture else {
            self.unbind_texture();
            return;
        };
        self.upload_texture(texture);
        let handle = texture.device_handle();
        if !self.textures.contains(&handle) {
            log::warn!("RecordingBackend: texture '{}' is not resident", texture.name());
            return;
        }
        if self.state.bind(handle) {
            self.calls.push(BackendCall::BindTexture(handle));
        }
    }

    fn unbind_texture(&mut self) {
        if self.state.unbind() {
            self.calls.push(BackendCall::UnbindTexture);
        }
    }
}
