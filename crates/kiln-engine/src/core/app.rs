use winit::event::WindowEvent;

use crate::backend::WgpuBackend;

use super::ctx::FrameCtx;

/// What the runtime should do after a callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Callback order: `init` once after the backend is initialized, then per
/// redraw `on_frame`; `on_resize` whenever the surface changes size and
/// `on_exit` once before the window and backend are destroyed.
pub trait App {
    /// Creates renderers and device resources.
    fn init(&mut self, backend: &mut WgpuBackend<'_>) {
        let _ = backend;
    }

    /// Raw window events, after the runtime updated its input state.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// New framebuffer size in physical pixels. The backend has already been resized.
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called once per frame between surface acquire and present.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Releases device resources while the backend is still alive.
    fn on_exit(&mut self, backend: &mut WgpuBackend<'_>) {
        let _ = backend;
    }
}
