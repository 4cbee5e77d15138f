//! Vulkan startup negotiation: picks a physical device for a window surface,
//! resolves its graphics and present queue families, creates the logical
//! device and derives a swapchain configuration the surface accepts.

pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod extensions;
pub mod instance;
pub mod logging;
pub mod physical_device;
pub mod queue_family;
pub mod surface;
pub mod swapchain;

#[cfg(test)]
mod testing;

pub use config::{Config, ValidationConfig};
pub use context::Context;
pub use error::{Error, Result};
