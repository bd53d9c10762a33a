//! Immediate-style 2D rendering on top of [`RenderBackend`](crate::backend::RenderBackend).
//!
//! Convention: world units, +Y up, z = 0. The camera handed to
//! [`PrimitiveRenderer::end_frame`] maps world space to clip space.

mod primitive;
pub mod shaders;

pub use primitive::{PrimitiveRenderer, PrimitiveSettings};
