//! Camera collaborators.
//!
//! The renderer only needs a view-projection matrix per flush; anything that
//! can produce one implements [`ViewProjection`].

mod orthographic;

pub use orthographic::OrthographicCamera;

/// Source of the combined world → clip transform.
pub trait ViewProjection {
    /// Returns the current view-projection matrix.
    ///
    /// Uploaded column-major (`Mat4::to_cols_array`), matching WGSL `mat4x4<f32>`.
    fn view_projection(&self) -> glam::Mat4;
}

impl ViewProjection for glam::Mat4 {
    #[inline]
    fn view_projection(&self) -> glam::Mat4 {
        *self
    }
}
