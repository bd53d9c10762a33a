use std::ops::Range;
use std::rc::Rc;

use crate::backend::{
    ColoredVertex, PipelineSettings, RenderBackend, TexturedVertex, VertexBatch,
};
use crate::camera::ViewProjection;
use crate::paint::Color;
use crate::texture::Texture;

use super::shaders;

/// Fixed-function toggles applied by [`PrimitiveRenderer::set_pipeline`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrimitiveSettings {
    pub depth_test: bool,
    pub blend: bool,
}

impl Default for PrimitiveSettings {
    fn default() -> Self {
        let p = PipelineSettings::default();
        Self {
            depth_test: p.depth_test,
            blend: p.blend,
        }
    }
}

impl From<PrimitiveSettings> for PipelineSettings {
    fn from(s: PrimitiveSettings) -> Self {
        PipelineSettings {
            blend: s.blend,
            depth_test: s.depth_test,
        }
    }
}

/// Contiguous textured vertices sharing one texture.
#[derive(Debug)]
struct TextureRun {
    texture: Rc<Texture>,
    vertices: Range<usize>,
}

/// Immediate-style 2D batcher.
///
/// `S` is the shader handle type of the backend it draws through
/// (`RenderBackend::Shader`).
///
/// Draw calls during a frame only append vertices. [`end_frame`](Self::end_frame)
/// flushes them in a fixed order (colored triangles, colored lines, then one draw
/// per texture run) and resets every list.
///
/// Coordinates are world units, Y up; the camera passed to `end_frame` maps
/// them to clip space.
pub struct PrimitiveRenderer<S> {
    flat_shader: Option<S>,
    textured_shader: Option<S>,

    colored: Vec<ColoredVertex>,
    lines: Vec<ColoredVertex>,
    textured: Vec<TexturedVertex>,
    runs: Vec<TextureRun>,
}

impl<S> Default for PrimitiveRenderer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PrimitiveRenderer<S> {
    pub fn new() -> Self {
        Self {
            flat_shader: None,
            textured_shader: None,
            colored: Vec::new(),
            lines: Vec::new(),
            textured: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Creates the flat and textured programs on `backend`.
    ///
    /// If either fails the renderer stays inert and every flush is skipped.
    pub fn initialize<B: RenderBackend<Shader = S>>(&mut self, backend: &mut B) {
        if self.is_initialized() {
            return;
        }
        if !backend.is_initialized() {
            log::error!("PrimitiveRenderer: backend is not initialized");
            return;
        }

        let flat = backend.create_shader(shaders::FLAT_VERTEX, shaders::FLAT_FRAGMENT);
        let textured = backend.create_shader(shaders::TEXTURED_VERTEX, shaders::TEXTURED_FRAGMENT);

        match (flat, textured) {
            (Some(flat), Some(textured)) => {
                self.flat_shader = Some(flat);
                self.textured_shader = Some(textured);
                log::debug!("PrimitiveRenderer initialized");
            }
            (flat, textured) => {
                log::error!("PrimitiveRenderer: failed to create shaders; renderer disabled");
                for shader in flat.into_iter().chain(textured) {
                    backend.release_shader(shader);
                }
            }
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.flat_shader.is_some() && self.textured_shader.is_some()
    }

    pub fn clear<B: RenderBackend<Shader = S>>(&mut self, backend: &mut B, color: Color) {
        backend.clear(color);
    }

    pub fn set_pipeline<B: RenderBackend<Shader = S>>(
        &mut self,
        backend: &mut B,
        settings: PrimitiveSettings,
    ) {
        backend.set_pipeline(settings.into());
    }

    /// Drops everything accumulated so far.
    pub fn begin_frame(&mut self) {
        self.colored.clear();
        self.lines.clear();
        self.textured.clear();
        self.runs.clear();
    }

    /// Axis-aligned rectangle with its bottom-left corner at `(x, y)`.
    pub fn draw_quad(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let v = |x, y| ColoredVertex::new(x, y, 0.0, color);
        self.colored.extend_from_slice(&[
            v(x, y),
            v(x + w, y),
            v(x + w, y + h),
            v(x, y),
            v(x + w, y + h),
            v(x, y + h),
        ]);
    }

    /// Textured rectangle centered at `(x, y)`. `None` draws nothing.
    pub fn draw_textured_quad(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        texture: Option<&Rc<Texture>>,
    ) {
        let Some(texture) = texture else { return };

        let (hw, hh) = (w * 0.5, h * 0.5);
        let (l, r, b, t) = (x - hw, x + hw, y - hh, y + hh);
        let vert = |x, y, u, v| TexturedVertex::new(x, y, 0.0, Color::WHITE, u, v);

        let start = self.textured.len();
        self.textured.extend_from_slice(&[
            vert(l, b, 0.0, 1.0),
            vert(r, b, 1.0, 1.0),
            vert(r, t, 1.0, 0.0),
            vert(l, b, 0.0, 1.0),
            vert(r, t, 1.0, 0.0),
            vert(l, t, 0.0, 0.0),
        ]);
        let end = self.textured.len();

        match self.runs.last_mut() {
            Some(run) if Rc::ptr_eq(&run.texture, texture) => run.vertices.end = end,
            _ => self.runs.push(TextureRun {
                texture: Rc::clone(texture),
                vertices: start..end,
            }),
        }
    }

    /// One-pixel line segment.
    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
        self.lines.extend_from_slice(&[
            ColoredVertex::new(x1, y1, 0.0, color),
            ColoredVertex::new(x2, y2, 0.0, color),
        ]);
    }

    /// Square of side `size` centered at `(x, y)`.
    pub fn draw_point(&mut self, x: f32, y: f32, size: f32, color: Color) {
        let half = size * 0.5;
        self.draw_quad(x - half, y - half, size, size, color);
    }

    /// Flushes every batch through `backend` and resets the renderer.
    pub fn end_frame<B: RenderBackend<Shader = S>>(
        &mut self,
        backend: &mut B,
        camera: &impl ViewProjection,
    ) {
        self.flush(backend, camera);
        self.begin_frame();
    }

    fn flush<B: RenderBackend<Shader = S>>(&self, backend: &mut B, camera: &impl ViewProjection) {
        let (Some(flat), Some(textured)) = (&self.flat_shader, &self.textured_shader) else {
            if !self.colored.is_empty() || !self.lines.is_empty() || !self.runs.is_empty() {
                log::error!("PrimitiveRenderer: end_frame before initialize; batches dropped");
            }
            return;
        };
        let view_proj = camera.view_projection();

        if !self.colored.is_empty() || !self.lines.is_empty() {
            backend.use_shader(flat);
            backend.set_uniform_mat4(flat, shaders::VIEW_PROJ_UNIFORM, &view_proj);
            backend.draw(VertexBatch::Triangles(&self.colored));
            backend.draw(VertexBatch::Lines(&self.lines));
        }

        for run in &self.runs {
            backend.bind_texture(Some(&run.texture));
            backend.use_shader(textured);
            backend.set_uniform_mat4(textured, shaders::VIEW_PROJ_UNIFORM, &view_proj);
            backend.draw(VertexBatch::Textured(&self.textured[run.vertices.clone()]));
            backend.unbind_texture();
        }
    }

    /// Releases both programs on `backend`.
    pub fn release<B: RenderBackend<Shader = S>>(mut self, backend: &mut B) {
        if let Some(shader) = self.flat_shader.take() {
            backend.release_shader(shader);
        }
        if let Some(shader) = self.textured_shader.take() {
            backend.release_shader(shader);
        }
    }

    fn holds_shaders(&self) -> bool {
        self.flat_shader.is_some() || self.textured_shader.is_some()
    }

    #[inline]
    pub fn colored_vertices(&self) -> &[ColoredVertex] {
        &self.colored
    }

    #[inline]
    pub fn line_vertices(&self) -> &[ColoredVertex] {
        &self.lines
    }

    #[inline]
    pub fn textured_vertices(&self) -> &[TexturedVertex] {
        &self.textured
    }

    /// Texture of the most recent textured quad this frame.
    #[inline]
    pub fn active_texture(&self) -> Option<&Rc<Texture>> {
        self.runs.last().map(|run| &run.texture)
    }
}

impl<S> Drop for PrimitiveRenderer<S> {
    fn drop(&mut self) {
        if self.holds_shaders() {
            log::warn!(
                "PrimitiveRenderer dropped without release; its shaders stay live until the backend is dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::backend::{BackendCall, RecordedShader, RecordingBackend, Topology, VertexKind};

    fn setup() -> (RecordingBackend, PrimitiveRenderer<RecordedShader>) {
        let mut backend = RecordingBackend::new(800, 600);
        backend.initialize();
        let mut renderer = PrimitiveRenderer::new();
        renderer.initialize(&mut backend);
        backend.take_calls();
        (backend, renderer)
    }

    fn texture(name: &str) -> Rc<Texture> {
        Rc::new(Texture::new(name, 2, 2, vec![255; 16]).unwrap())
    }

    fn draws(calls: &[BackendCall]) -> Vec<&BackendCall> {
        calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Draw { .. }))
            .collect()
    }

    // ── accumulation ──────────────────────────────────────────────────────

    #[test]
    fn quad_emits_two_triangles_covering_rect() {
        let (_, mut r) = setup();
        r.begin_frame();
        r.draw_quad(10.0, 20.0, 30.0, 40.0, Color::RED);

        let v = r.colored_vertices();
        assert_eq!(v.len(), 6);
        let pos: Vec<[f32; 2]> = v.iter().map(|v| [v.position[0], v.position[1]]).collect();
        assert_eq!(
            pos,
            vec![
                [10.0, 20.0],
                [40.0, 20.0],
                [40.0, 60.0],
                [10.0, 20.0],
                [40.0, 60.0],
                [10.0, 60.0],
            ]
        );
        assert!(v.iter().all(|v| v.position[2] == 0.0 && v.color == Color::RED.to_array()));
    }

    #[test]
    fn n_quads_emit_six_vertices_each() {
        let (_, mut r) = setup();
        for i in 0..5 {
            r.draw_quad(i as f32, 0.0, 1.0, 1.0, Color::WHITE);
        }
        assert_eq!(r.colored_vertices().len(), 30);
    }

    #[test]
    fn point_is_centered_quad() {
        let (_, mut a) = setup();
        let (_, mut b) = setup();
        a.draw_point(5.0, 5.0, 4.0, Color::GREEN);
        b.draw_quad(3.0, 3.0, 4.0, 4.0, Color::GREEN);
        assert_eq!(a.colored_vertices(), b.colored_vertices());
    }

    #[test]
    fn textured_quad_is_centered_with_flipped_uvs() {
        let (_, mut r) = setup();
        let t = texture("t");
        r.draw_textured_quad(0.0, 0.0, 100.0, 50.0, Some(&t));

        let v = r.textured_vertices();
        assert_eq!(v.len(), 6);
        assert_eq!(v[0].position, [-50.0, -25.0, 0.0]);
        assert_eq!(v[0].uv, [0.0, 1.0]);
        assert_eq!(v[1].uv, [1.0, 1.0]);
        assert_eq!(v[2].position, [50.0, 25.0, 0.0]);
        assert_eq!(v[2].uv, [1.0, 0.0]);
        assert_eq!(v[5].uv, [0.0, 0.0]);
        assert!(v.iter().all(|v| v.color == Color::WHITE.to_array()));
        assert!(Rc::ptr_eq(r.active_texture().unwrap(), &t));
    }

    #[test]
    fn textured_quad_without_texture_is_a_no_op() {
        let (_, mut r) = setup();
        r.draw_textured_quad(0.0, 0.0, 10.0, 10.0, None);
        assert!(r.textured_vertices().is_empty());
        assert!(r.active_texture().is_none());
    }

    #[test]
    fn line_appends_one_segment() {
        let (_, mut r) = setup();
        r.draw_line(0.0, 0.0, 10.0, 5.0, Color::BLUE);
        assert_eq!(r.line_vertices().len(), 2);
        assert!(r.colored_vertices().is_empty());
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn everything_is_empty_after_end_frame() {
        let (mut b, mut r) = setup();
        let t = texture("t");
        r.draw_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.draw_line(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.draw_textured_quad(0.0, 0.0, 1.0, 1.0, Some(&t));
        r.end_frame(&mut b, &Mat4::IDENTITY);

        assert!(r.colored_vertices().is_empty());
        assert!(r.line_vertices().is_empty());
        assert!(r.textured_vertices().is_empty());
        assert!(r.active_texture().is_none());
    }

    #[test]
    fn two_colored_quads_make_one_draw() {
        let (mut b, mut r) = setup();
        r.begin_frame();
        r.draw_quad(0.0, 0.0, 10.0, 10.0, Color::RED);
        r.draw_quad(20.0, 0.0, 10.0, 10.0, Color::BLUE);
        r.end_frame(&mut b, &Mat4::IDENTITY);

        let calls = b.take_calls();
        let draws = draws(&calls);
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            BackendCall::Draw { kind: VertexKind::Colored, topology: Topology::TriangleList, vertex_count: 12, .. }
        ));
        assert!(!calls.iter().any(|c| matches!(c, BackendCall::BindTexture(_))));
    }

    #[test]
    fn textured_quad_is_bound_drawn_and_unbound() {
        let (mut b, mut r) = setup();
        let t = texture("sprite");
        r.begin_frame();
        r.draw_textured_quad(0.0, 0.0, 100.0, 100.0, Some(&t));
        r.end_frame(&mut b, &Mat4::IDENTITY);

        let calls = b.take_calls();
        let bind = calls
            .iter()
            .position(|c| matches!(c, BackendCall::BindTexture(_)))
            .unwrap();
        let draw = calls
            .iter()
            .position(|c| matches!(c, BackendCall::Draw { .. }))
            .unwrap();
        let unbind = calls
            .iter()
            .position(|c| matches!(c, BackendCall::UnbindTexture))
            .unwrap();
        assert!(bind < draw && draw < unbind);
        assert_eq!(draws(&calls).len(), 1);
        assert!(matches!(
            calls[draw],
            BackendCall::Draw { kind: VertexKind::Textured, vertex_count: 6, .. }
        ));
        assert!(t.is_uploaded());
    }

    #[test]
    fn view_projection_reaches_both_programs() {
        let (mut b, mut r) = setup();
        let t = texture("t");
        let vp = Mat4::from_scale(glam::Vec3::new(2.0, 3.0, 1.0));
        r.draw_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.draw_textured_quad(0.0, 0.0, 1.0, 1.0, Some(&t));
        r.end_frame(&mut b, &vp);

        let uniforms: Vec<_> = b
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetUniformMat4 { name, value, .. } => Some((name.clone(), *value)),
                _ => None,
            })
            .collect();
        assert_eq!(uniforms.len(), 2);
        assert!(uniforms
            .iter()
            .all(|(name, value)| name == shaders::VIEW_PROJ_UNIFORM && *value == vp.to_cols_array()));
    }

    #[test]
    fn texture_change_starts_a_new_run() {
        let (mut b, mut r) = setup();
        let a = texture("a");
        let c = texture("c");
        r.draw_textured_quad(0.0, 0.0, 1.0, 1.0, Some(&a));
        r.draw_textured_quad(1.0, 0.0, 1.0, 1.0, Some(&a));
        r.draw_textured_quad(2.0, 0.0, 1.0, 1.0, Some(&c));
        r.end_frame(&mut b, &Mat4::IDENTITY);

        let textured: Vec<_> = b
            .calls()
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { kind: VertexKind::Textured, vertex_count, texture, .. } => {
                    Some((*vertex_count, *texture))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            textured,
            vec![(12, a.device_handle()), (6, c.device_handle())]
        );
        assert_ne!(a.device_handle(), c.device_handle());
    }

    #[test]
    fn lines_use_line_topology_after_triangles() {
        let (mut b, mut r) = setup();
        r.draw_line(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.draw_line(1.0, 1.0, 2.0, 0.0, Color::WHITE);
        r.draw_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.end_frame(&mut b, &Mat4::IDENTITY);

        let calls = b.take_calls();
        let topologies: Vec<_> = draws(&calls)
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Draw { topology, vertex_count, .. } => Some((*topology, *vertex_count)),
                _ => None,
            })
            .collect();
        assert_eq!(
            topologies,
            vec![(Topology::TriangleList, 6), (Topology::LineList, 4)]
        );
    }

    #[test]
    fn empty_frame_issues_no_draws() {
        let (mut b, mut r) = setup();
        r.begin_frame();
        r.end_frame(&mut b, &Mat4::IDENTITY);
        assert!(b.calls().is_empty());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn uninitialized_renderer_drops_batches() {
        let mut b = RecordingBackend::new(100, 100);
        b.initialize();
        b.take_calls();
        let mut r = PrimitiveRenderer::<RecordedShader>::new();
        r.draw_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.end_frame(&mut b, &Mat4::IDENTITY);
        assert!(b.calls().is_empty());
        assert!(r.colored_vertices().is_empty());
    }

    #[test]
    fn initialize_requires_initialized_backend() {
        let mut b = RecordingBackend::detached();
        b.initialize();
        let mut r = PrimitiveRenderer::<RecordedShader>::new();
        r.initialize(&mut b);
        assert!(!r.is_initialized());
    }

    #[test]
    fn release_frees_both_programs() {
        let (mut b, r) = setup();
        assert_eq!(b.live_shaders(), 2);
        r.release(&mut b);
        assert_eq!(b.live_shaders(), 0);
    }

    #[test]
    fn dropping_without_release_keeps_programs_live() {
        let (b, r) = setup();
        assert!(r.holds_shaders());
        drop(r);
        assert_eq!(b.live_shaders(), 2);
    }

    #[test]
    fn release_after_partial_release_frees_the_rest() {
        let (mut b, mut r) = setup();
        if let Some(shader) = r.flat_shader.take() {
            b.release_shader(shader);
        }
        assert!(r.holds_shaders());
        r.release(&mut b);
        assert_eq!(b.live_shaders(), 0);
    }

    #[test]
    fn settings_forward_to_backend() {
        let (mut b, mut r) = setup();
        r.set_pipeline(&mut b, PrimitiveSettings { depth_test: true, blend: false });
        assert_eq!(
            b.pipeline_settings(),
            PipelineSettings { blend: false, depth_test: true }
        );
        r.clear(&mut b, Color::BLACK);
        assert_eq!(b.calls().last(), Some(&BackendCall::Clear(Color::BLACK)));
    }
}
