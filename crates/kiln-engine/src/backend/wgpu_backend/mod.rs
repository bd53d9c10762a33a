//! [`RenderBackend`] over wgpu.
//!
//! wgpu has no immediate mode, so the backend records the frame: every `draw`
//! copies its vertices into a CPU arena and snapshots the state it was issued
//! under (program, uniform values, pipeline settings, bound texture, viewport).
//! [`WgpuBackend::present`] uploads the arenas once and replays the draws in a
//! single render pass.

mod arena;
mod pipeline;
mod program;
mod textures;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use glam::Mat4;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::surface::create_depth_view;
use crate::device::{Gpu, GpuInit, SurfaceErrorAction, SurfaceFrame};
use crate::paint::Color;
use crate::texture::{Texture, TextureHandle};

use super::reflect::{reflect_program, MAT4_SIZE, TEXTURE_GROUP, UNIFORM_GROUP};
use super::{
    DeviceState, PipelineSettings, RenderBackend, ShaderId, VertexBatch, VertexKind, Viewport,
};

use arena::Arena;
use pipeline::{PipelineKey, TargetFormats};
use program::Program;
use textures::{fits_dimension, TextureRegistry};

/// Shader program handle issued by [`WgpuBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct WgpuShader {
    id: ShaderId,
}

impl WgpuShader {
    #[inline]
    pub fn id(&self) -> ShaderId {
        self.id
    }
}

/// One recorded draw.
struct DrawRecord {
    shader: ShaderId,
    key: PipelineKey,
    vertices: Range<u64>,
    vertex_count: u32,
    /// Dynamic offsets into the uniform arena, one per uniform slot.
    uniform_offsets: Vec<u32>,
    texture: TextureHandle,
    viewport: Viewport,
}

#[derive(Default)]
struct FrameRecord {
    clear: Option<Color>,
    draws: Vec<DrawRecord>,
}

struct DepthTarget {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// wgpu implementation of [`RenderBackend`] bound to one window surface.
pub struct WgpuBackend<'w> {
    window: Option<&'w Window>,
    init: GpuInit,
    gpu: Option<Gpu<'w>>,

    state: DeviceState,
    programs: HashMap<ShaderId, Program>,
    textures: TextureRegistry,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,

    vertex_arena: Arena,
    uniform_arena: Arena,

    record: FrameRecord,
    frame: Option<SurfaceFrame>,
    depth: Option<DepthTarget>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates a backend that will bind to `window` on [`initialize`](RenderBackend::initialize).
    pub fn new(window: &'w Window, init: GpuInit) -> Self {
        Self::with_window(Some(window), init)
    }

    /// Creates a backend with no surface; `initialize` logs an error and does nothing.
    pub fn detached() -> Self {
        Self::with_window(None, GpuInit::default())
    }

    fn with_window(window: Option<&'w Window>, init: GpuInit) -> Self {
        Self {
            window,
            init,
            gpu: None,
            state: DeviceState::default(),
            programs: HashMap::new(),
            textures: TextureRegistry::default(),
            texture_bgl: None,
            sampler: None,
            vertex_arena: Arena::new("kiln vertex arena", wgpu::BufferUsages::VERTEX, 1),
            uniform_arena: Arena::new("kiln uniform arena", wgpu::BufferUsages::UNIFORM, 256),
            record: FrameRecord::default(),
            frame: None,
            depth: None,
        }
    }

    /// The underlying device, once initialized.
    #[inline]
    pub fn gpu(&self) -> Option<&Gpu<'w>> {
        self.gpu.as_ref()
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    /// Number of device textures currently alive.
    #[inline]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Acquires the surface texture for the coming frame.
    ///
    /// Optional: [`present`](Self::present) acquires on its own when needed.
    pub fn begin_frame(&mut self) -> Result<(), SurfaceErrorAction> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(SurfaceErrorAction::SkipFrame);
        };
        if self.frame.is_none() {
            self.frame = Some(gpu.acquire()?);
        }
        Ok(())
    }

    /// Encodes the recorded frame into one render pass, submits and presents it.
    ///
    /// The recording is reset whether or not a frame could be presented.
    pub fn present(&mut self) -> Result<(), SurfaceErrorAction> {
        let result = self.encode_and_present();
        self.record = FrameRecord::default();
        self.vertex_arena.reset();
        self.uniform_arena.reset();
        result
    }

    fn encode_and_present(&mut self) -> Result<(), SurfaceErrorAction> {
        self.begin_frame()?;
        let (Some(gpu), Some(frame)) = (self.gpu.as_ref(), self.frame.take()) else {
            return Err(SurfaceErrorAction::SkipFrame);
        };
        let device = gpu.device();
        let queue = gpu.queue();
        let (width, height) = frame.size();

        self.vertex_arena.upload(device, queue);
        self.uniform_arena.upload(device, queue);

        if self
            .depth
            .as_ref()
            .is_none_or(|d| d.size != (width, height))
        {
            self.depth = Some(DepthTarget {
                view: create_depth_view(device, gpu.depth_format(), width, height),
                size: (width, height),
            });
        }

        let uniform_groups = self.uniform_bind_groups(device);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kiln frame encoder"),
        });

        {
            let color_load = match self.record.clear {
                Some(c) => wgpu::LoadOp::Clear(c.into()),
                None => wgpu::LoadOp::Load,
            };
            let depth_view = self.depth.as_ref().map(|d| &d.view);

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let Some(vertex_buffer) = self.vertex_arena.buffer() else {
                return Err(SurfaceErrorAction::SkipFrame);
            };

            for draw in &self.record.draws {
                let Some(program) = self.programs.get(&draw.shader) else { continue };
                let Some(pipeline) = program.pipeline(draw.key) else { continue };
                let Some(uniforms) = uniform_groups.get(&draw.shader) else { continue };
                let Some(viewport) = draw.viewport.clamped_to(width, height) else {
                    continue;
                };

                if program.vertex_kind() == VertexKind::Textured {
                    let Some(texture) = self.textures.get(draw.texture) else {
                        log::warn!("WgpuBackend: texture {:?} released before present", draw.texture);
                        continue;
                    };
                    rpass.set_bind_group(TEXTURE_GROUP, &texture.bind_group, &[]);
                }

                rpass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(UNIFORM_GROUP, uniforms, &draw.uniform_offsets);
                rpass.set_vertex_buffer(0, vertex_buffer.slice(draw.vertices.clone()));
                rpass.draw(0..draw.vertex_count, 0..1);
            }
        }

        gpu.present(frame, encoder.finish());
        Ok(())
    }

    /// One group-0 bind group per program used this frame, over the whole uniform arena.
    fn uniform_bind_groups(&self, device: &wgpu::Device) -> HashMap<ShaderId, wgpu::BindGroup> {
        let mut groups = HashMap::new();
        let Some(buffer) = self.uniform_arena.buffer() else {
            return groups;
        };

        for draw in &self.record.draws {
            if groups.contains_key(&draw.shader) {
                continue;
            }
            let Some(program) = self.programs.get(&draw.shader) else { continue };
            let entries: Vec<_> = program
                .layout()
                .uniforms
                .iter()
                .map(|slot| wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(MAT4_SIZE),
                    }),
                })
                .collect();
            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kiln uniform bind group"),
                layout: program.uniform_bgl(),
                entries: &entries,
            });
            groups.insert(draw.shader, group);
        }
        groups
    }

    fn ready(&self, op: &str) -> bool {
        if self.gpu.is_none() {
            log::warn!("WgpuBackend: {op} before initialize; ignored");
            return false;
        }
        true
    }

    fn target_formats(gpu: &Gpu<'_>) -> TargetFormats {
        TargetFormats {
            color: gpu.surface_format(),
            depth: gpu.depth_format(),
        }
    }
}

impl RenderBackend for WgpuBackend<'_> {
    type Shader = WgpuShader;

    fn initialize(&mut self) {
        if self.gpu.is_some() {
            return;
        }
        let Some(window) = self.window else {
            log::error!("WgpuBackend: no window surface attached; initialize skipped");
            return;
        };

        let gpu = match pollster::block_on(Gpu::new(window, self.init.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("WgpuBackend: GPU initialization failed: {e:#}");
                return;
            }
        };

        let device = gpu.device();
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        self.uniform_arena = Arena::new("kiln uniform arena", wgpu::BufferUsages::UNIFORM, alignment);
        let max_buffer = device.limits().max_buffer_size;
        self.vertex_arena.set_limit(max_buffer);
        self.uniform_arena.set_limit(max_buffer);
        self.vertex_arena.reserve(device, 0);
        self.uniform_arena.reserve(device, MAT4_SIZE);
        self.texture_bgl = Some(TextureRegistry::create_layout(device));
        self.sampler = Some(TextureRegistry::create_sampler(device));

        let size = gpu.size();
        self.state.viewport = Viewport::new(0, 0, size.width, size.height);
        log::info!("WgpuBackend initialized ({}x{})", size.width, size.height);
        self.gpu = Some(gpu);
    }

    fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    fn clear(&mut self, color: Color) {
        self.record.draws.clear();
        self.vertex_arena.reset();
        self.uniform_arena.reset();
        self.record.clear = Some(color);
    }

    fn set_pipeline(&mut self, settings: PipelineSettings) {
        self.state.settings = settings;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    fn resize(&mut self, width: i32, height: i32) {
        let Some(viewport) = self.state.resize(width, height) else {
            log::trace!("WgpuBackend: ignoring resize to {width}x{height}");
            return;
        };
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(PhysicalSize::new(viewport.width, viewport.height));
        }
        // A held frame belongs to the old configuration.
        self.frame = None;
        self.depth = None;
    }

    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Option<WgpuShader> {
        if !self.ready("create_shader") {
            return None;
        }
        let layout = match reflect_program(vertex_src, fragment_src) {
            Ok(layout) => layout,
            Err(e) => {
                log::error!("WgpuBackend: shader creation failed: {e}");
                return None;
            }
        };
        let (Some(gpu), Some(texture_bgl)) = (self.gpu.as_ref(), self.texture_bgl.as_ref()) else {
            return None;
        };

        let id = self.state.allocate_shader();
        let label = format!("kiln program {}", id.raw());
        let program = Program::new(gpu.device(), label, layout, vertex_src, fragment_src, texture_bgl);
        self.programs.insert(id, program);
        log::debug!("WgpuBackend: created program {id:?}");
        Some(WgpuShader { id })
    }

    fn release_shader(&mut self, shader: WgpuShader) {
        if self.programs.remove(&shader.id).is_some() {
            self.state.forget_shader(shader.id);
            self.record.draws.retain(|d| d.shader != shader.id);
        }
    }

    fn use_shader(&mut self, shader: &WgpuShader) {
        if !self.programs.contains_key(&shader.id) {
            log::warn!("WgpuBackend: use_shader with unknown shader {:?}", shader.id);
            return;
        }
        self.state.current_shader = Some(shader.id);
    }

    fn set_uniform_mat4(&mut self, shader: &WgpuShader, name: &str, value: &Mat4) {
        let Some(program) = self.programs.get_mut(&shader.id) else {
            log::warn!("WgpuBackend: set_uniform_mat4 with unknown shader {:?}", shader.id);
            return;
        };
        if !program.set_uniform(name, *value) {
            log::warn!("WgpuBackend: shader {:?} has no uniform '{name}'", shader.id);
        }
    }

    fn draw(&mut self, batch: VertexBatch<'_>) {
        if batch.is_empty() || !self.ready("draw") {
            return;
        }
        let Some(shader) = self.state.current_shader else {
            log::warn!("WgpuBackend: draw without a shader in use");
            return;
        };
        let (Some(gpu), Some(program)) = (self.gpu.as_ref(), self.programs.get_mut(&shader)) else {
            return;
        };
        if program.vertex_kind() != batch.kind() {
            log::warn!(
                "WgpuBackend: {:?} batch drawn with a {:?} shader; skipped",
                batch.kind(),
                program.vertex_kind()
            );
            return;
        }
        let texture = match batch.kind() {
            VertexKind::Textured if self.state.bound_texture.is_none() => {
                log::warn!("WgpuBackend: textured draw with no texture bound; skipped");
                return;
            }
            VertexKind::Textured => self.state.bound_texture,
            VertexKind::Colored => TextureHandle::NONE,
        };

        let uniform_bytes =
            program.uniform_block().count() as u64 * self.uniform_arena.stride(MAT4_SIZE);
        let vertex_bytes = batch.as_bytes().len() as u64;
        if !self.vertex_arena.fits(vertex_bytes) || !self.uniform_arena.fits(uniform_bytes) {
            log::error!(
                "WgpuBackend: {} vertices exceed the device buffer limit; draw dropped",
                batch.len()
            );
            return;
        }

        let key = PipelineKey::new(batch.topology(), self.state.settings);
        program.ensure_pipeline(gpu.device(), key, Self::target_formats(gpu));

        let uniform_offsets = program
            .uniform_block()
            .map(|m| self.uniform_arena.push(bytemuck::cast_slice(&m.to_cols_array())).start as u32)
            .collect();
        let vertices = self.vertex_arena.push(batch.as_bytes());

        self.record.draws.push(DrawRecord {
            shader,
            key,
            vertices,
            vertex_count: batch.len() as u32,
            uniform_offsets,
            texture,
            viewport: self.state.viewport,
        });
    }

    fn upload_texture(&mut self, texture: &Texture) {
        if texture.is_uploaded() || !self.ready("upload_texture") {
            return;
        }
        let (Some(gpu), Some(layout), Some(sampler)) =
            (self.gpu.as_ref(), self.texture_bgl.as_ref(), self.sampler.as_ref())
        else {
            return;
        };

        let max_dimension = gpu.device().limits().max_texture_dimension_2d;
        if !fits_dimension(texture.width(), texture.height(), max_dimension) {
            log::error!(
                "WgpuBackend: texture '{}' ({}x{}) exceeds the device limit of {max_dimension}; not uploaded",
                texture.name(),
                texture.width(),
                texture.height()
            );
            return;
        }

        let handle = self.state.allocate_texture();
        self.textures
            .insert(gpu.device(), gpu.queue(), layout, sampler, handle, texture);
        texture.set_device_handle(handle);
        log::debug!(
            "WgpuBackend: uploaded '{}' ({}x{}) as {handle:?}",
            texture.name(),
            texture.width(),
            texture.height()
        );
    }

    fn release_texture(&mut self, texture: &Texture) {
        let handle = texture.device_handle();
        if !self.textures.remove(handle) {
            return;
        }
        self.state.forget_texture(handle);
        texture.set_device_handle(TextureHandle::NONE);
        log::debug!("WgpuBackend: released '{}'", texture.name());
    }

    fn bind_texture(&mut self, texture: Option<&Texture>) {
        let Some(texture) = texture else {
            self.unbind_texture();
            return;
        };
        self.upload_texture(texture);
        let handle = texture.device_handle();
        if !self.textures.contains(handle) {
            log::warn!("WgpuBackend: texture '{}' is not resident", texture.name());
            return;
        }
        self.state.bind(handle);
    }

    fn unbind_texture(&mut self) {
        self.state.unbind();
    }
}

impl Drop for WgpuBackend<'_> {
    fn drop(&mut self) {
        if self.textures.len() > 0 {
            log::debug!("WgpuBackend: freeing {} textures", self.textures.len());
        }
        self.textures.clear();
        self.programs.clear();
    }
}
