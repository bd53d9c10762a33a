//! Window + runtime loop.
//!
//! Owns the winit event loop and the single window, and wires them to the
//! wgpu backend.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
pub use winit::dpi::LogicalSize;
