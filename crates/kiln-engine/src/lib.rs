//! Kiln engine crate.
//!
//! A small 2D renderer: an immediate-style primitive batcher
//! ([`render::PrimitiveRenderer`]) over a device abstraction
//! ([`backend::RenderBackend`]) with a wgpu implementation, plus the window
//! runtime, input, timing and logging pieces an application needs.

pub mod backend;
pub mod camera;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod texture;
pub mod time;
pub mod window;
