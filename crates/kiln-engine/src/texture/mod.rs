//! Texture resources.
//!
//! A [`Texture`] is a CPU-side RGBA8 image with an identity name. Backends
//! upload it on first use and write the resulting [`TextureHandle`] back.

mod error;
mod resource;

pub use error::TextureError;
pub use resource::{Texture, TextureHandle};
