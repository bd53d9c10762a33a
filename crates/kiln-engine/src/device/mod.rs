//! wgpu device and window surface.
//!
//! [`Gpu`] owns the instance, adapter, device, queue and surface configuration.
//! Rendering code only sees it through [`WgpuBackend`](crate::backend::WgpuBackend).

mod error;
mod frame;
mod gpu;
mod init;
pub(crate) mod surface;

pub use error::SurfaceErrorAction;
pub use frame::SurfaceFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
