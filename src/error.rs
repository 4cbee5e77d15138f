use ash::vk;
use thiserror::Error;

/// Failures of the startup negotiation. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no suitable GPU found among {candidates} Vulkan devices")]
    NoSuitableDevice { candidates: usize },

    #[error("required device extensions are not supported: {}", .0.join(", "))]
    ExtensionUnsupported(Vec<String>),

    #[error("requested validation layers are not available: {}", .0.join(", "))]
    ValidationLayerUnsupported(Vec<String>),

    #[error("the selected device has no presentation support for the surface")]
    PresentationUnsupported,

    #[error("failed to create the logical device: {0}")]
    DeviceCreation(vk::Result),

    #[error("failed to create the swapchain: {0}")]
    SwapchainCreation(vk::Result),

    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("window handle is unavailable: {0}")]
    Window(#[from] raw_window_handle::HandleError),

    #[error("no Vulkan surface extension for this window system")]
    UnsupportedPlatform,

    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}

pub type Result<T> = std::result::Result<T, Error>;
