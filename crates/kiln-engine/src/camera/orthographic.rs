use glam::{Mat4, Vec2, Vec3};

use super::ViewProjection;

/// 2D orthographic camera, Y up.
///
/// `ortho_size` is the half height of the visible area in world units; the half
/// width follows from the framebuffer aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub width: f32,
    pub height: f32,
    pub ortho_size: f32,
    pub position: Vec2,
}

impl OrthographicCamera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ortho_size: height * 0.5,
            position: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    /// Updates the framebuffer size; ignored when either side is non-positive.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.width = width;
        self.height = height;
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }

    pub fn projection(&self) -> Mat4 {
        let half_h = self.ortho_size.max(f32::EPSILON);
        let half_w = half_h * self.aspect();
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0))
    }
}

impl ViewProjection for OrthographicCamera {
    fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn clip(cam: &OrthographicCamera, x: f32, y: f32) -> Vec4 {
        cam.view_projection() * Vec4::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn origin_maps_to_clip_center() {
        let cam = OrthographicCamera::new(800.0, 600.0);
        let p = clip(&cam, 0.0, 0.0);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
    }

    #[test]
    fn ortho_size_is_half_height() {
        let mut cam = OrthographicCamera::new(800.0, 600.0);
        cam.ortho_size = 300.0;
        let top = clip(&cam, 0.0, 300.0);
        assert!((top.y - 1.0).abs() < 1e-5);

        // 4:3 aspect → half width is 400 world units.
        let right = clip(&cam, 400.0, 0.0);
        assert!((right.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn position_moves_view() {
        let mut cam = OrthographicCamera::new(100.0, 100.0);
        cam.ortho_size = 50.0;
        cam.set_position(10.0, 20.0);
        let p = clip(&cam, 10.0, 20.0);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
    }

    #[test]
    fn non_positive_viewport_is_ignored() {
        let mut cam = OrthographicCamera::new(100.0, 50.0);
        cam.set_viewport_size(0.0, 10.0);
        assert_eq!((cam.width, cam.height), (100.0, 50.0));
    }

    #[test]
    fn z_zero_lands_inside_depth_range() {
        let cam = OrthographicCamera::new(100.0, 100.0);
        let p = clip(&cam, 0.0, 0.0);
        assert!(p.z >= 0.0 && p.z <= 1.0);
    }
}
