//! Color model shared by the renderer and the backends.
//!
//! Colors are straight-alpha linear `f32` RGBA. Geometry lives in world units
//! and is described directly by vertex positions.

pub mod color;

pub use color::Color;
