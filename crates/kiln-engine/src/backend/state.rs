use std::sync::atomic::{AtomicU32, Ordering};

use crate::texture::TextureHandle;

use super::{PipelineSettings, ShaderId};

/// Viewport rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects the viewport with a `width`×`height` target anchored at the origin.
    pub fn clamped_to(self, width: u32, height: u32) -> Option<Viewport> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.width as i64).min(width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Viewport::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Device-side state mirrored on the CPU.
///
/// Backends consult it before issuing a device call so that redundant binds
/// are skipped and invalid resizes never reach the device.
#[derive(Debug, Default)]
pub(crate) struct DeviceState {
    pub settings: PipelineSettings,
    pub viewport: Viewport,
    pub bound_texture: TextureHandle,
    pub current_shader: Option<ShaderId>,
}

// Handles are unique across every backend in the process, so a registry
// lookup on one backend never matches a resource created by another.
static NEXT_TEXTURE: AtomicU32 = AtomicU32::new(1);
static NEXT_SHADER: AtomicU32 = AtomicU32::new(1);

fn next_id(counter: &AtomicU32) -> u32 {
    loop {
        let id = counter.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

impl DeviceState {
    /// Records a bind request. Returns `true` when the device must actually bind.
    pub fn bind(&mut self, handle: TextureHandle) -> bool {
        if self.bound_texture == handle {
            return false;
        }
        self.bound_texture = handle;
        true
    }

    /// Records an unbind request. Returns `true` when something was bound.
    pub fn unbind(&mut self) -> bool {
        self.bind(TextureHandle::NONE)
    }

    /// Validates a resize; on success the viewport covers the whole surface.
    pub fn resize(&mut self, width: i32, height: i32) -> Option<Viewport> {
        if width <= 0 || height <= 0 {
            return None;
        }
        self.viewport = Viewport::new(0, 0, width as u32, height as u32);
        Some(self.viewport)
    }

    pub fn allocate_texture(&mut self) -> TextureHandle {
        TextureHandle(next_id(&NEXT_TEXTURE))
    }

    pub fn allocate_shader(&mut self) -> ShaderId {
        ShaderId(next_id(&NEXT_SHADER))
    }

    /// Drops references to a texture that is going away.
    pub fn forget_texture(&mut self, handle: TextureHandle) {
        if self.bound_texture == handle {
            self.bound_texture = TextureHandle::NONE;
        }
    }

    /// Drops references to a shader that is going away.
    pub fn forget_shader(&mut self, id: ShaderId) {
        if self.current_shader == Some(id) {
            self.current_shader = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── binding ───────────────────────────────────────────────────────────

    #[test]
    fn second_bind_of_same_handle_is_redundant() {
        let mut s = DeviceState::default();
        let h = s.allocate_texture();
        assert!(s.bind(h));
        assert!(!s.bind(h));
    }

    #[test]
    fn unbind_only_when_bound() {
        let mut s = DeviceState::default();
        assert!(!s.unbind());
        let h = s.allocate_texture();
        s.bind(h);
        assert!(s.unbind());
        assert_eq!(s.bound_texture, TextureHandle::NONE);
    }

    #[test]
    fn forgetting_bound_texture_clears_binding() {
        let mut s = DeviceState::default();
        let h = s.allocate_texture();
        s.bind(h);
        s.forget_texture(h);
        assert!(s.bound_texture.is_none());
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn texture_handles_are_never_zero() {
        let mut s = DeviceState::default();
        let a = s.allocate_texture();
        let b = s.allocate_texture();
        assert!(a.is_some() && b.is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn handles_differ_between_states() {
        let mut first = DeviceState::default();
        let mut second = DeviceState::default();
        assert_ne!(first.allocate_texture(), second.allocate_texture());
        assert_ne!(first.allocate_shader(), second.allocate_shader());
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_rejects_non_positive() {
        let mut s = DeviceState::default();
        s.resize(640, 480);
        assert_eq!(s.resize(0, 100), None);
        assert_eq!(s.resize(100, -1), None);
        assert_eq!(s.viewport, Viewport::new(0, 0, 640, 480));
    }

    #[test]
    fn viewport_clamps_to_target() {
        let v = Viewport::new(-10, 5, 100, 100);
        assert_eq!(v.clamped_to(50, 50), Some(Viewport::new(0, 5, 50, 45)));
        assert_eq!(Viewport::new(60, 0, 10, 10).clamped_to(50, 50), None);
    }
}
