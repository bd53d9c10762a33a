/// A surface texture acquired for one frame.
///
/// Must be handed back to [`Gpu::present`](super::Gpu::present) promptly; holding
/// it blocks acquisition of the next one.
pub struct SurfaceFrame {
    pub(crate) surface_texture: wgpu::SurfaceTexture,
    pub(crate) view: wgpu::TextureView,
}

impl SurfaceFrame {
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        let t = &self.surface_texture.texture;
        (t.width(), t.height())
    }
}
