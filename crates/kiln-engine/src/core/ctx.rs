use winit::window::Window;

use crate::backend::WgpuBackend;
use crate::input::InputState;
use crate::time::FrameTime;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback borrow, `'w` the window borrow carried by the backend.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub backend: &'a mut WgpuBackend<'w>,
    pub input: &'a InputState,
    pub time: FrameTime,
    pub(crate) exit_requested: bool,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Framebuffer size in physical pixels.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Asks the runtime to close the window after this frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }
}
