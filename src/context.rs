//! One-shot startup negotiation and ownership of its results.

use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};

use crate::{
    config::Config,
    device::Device,
    error::{Error, Result},
    instance::Instance,
    physical_device::{select_physical_device, SelectedPresentation},
    surface::{Surface, SurfaceQueries},
    swapchain::{Swapchain, SwapchainConfig},
};

pub struct Presentation {
    pub surface: Arc<Surface>,
    pub swapchain: Swapchain,
}

/// Owns every handle acquired during startup and releases them in reverse
/// order when dropped. Clones of the inner `Arc`s must not outlive it.
pub struct Context {
    pub instance: Arc<Instance>,
    pub device: Arc<Device>,
    pub presentation: Option<Presentation>,
}

impl Context {
    /// Selects a device able to present to `window`, creates the logical
    /// device and a swapchain. `framebuffer` is the window's size in pixels.
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        framebuffer: vk::Extent2D,
        config: &Config,
    ) -> Result<Self> {
        let instance = Arc::new(Instance::new(config, window.display_handle()?.as_raw())?);
        let surface = Surface::new(window, &instance)
            .map(Arc::new)
            .map_err(|err| {
                unsafe { instance.destroy() };
                err
            })?;
        let surface_queries: &dyn SurfaceQueries = &*surface;
        let (device, presentation) =
            negotiate_device(&instance, Some(surface_queries), config).map_err(|err| {
                unsafe {
                    surface.destroy();
                    instance.destroy();
                }
                err
            })?;
        let swapchain =
            create_swapchain(&device, &surface, presentation, framebuffer).map_err(|err| {
                unsafe {
                    device.destroy();
                    surface.destroy();
                    instance.destroy();
                }
                err
            })?;

        info!(
            "presentation ready: {} swapchain images",
            swapchain.images.len()
        );

        Ok(Self {
            instance,
            device,
            presentation: Some(Presentation { surface, swapchain }),
        })
    }

    /// Selects a graphics-capable device without presentation support.
    pub fn headless(config: &Config) -> Result<Self> {
        let instance = Arc::new(Instance::headless(config)?);
        let (device, _) = negotiate_device(&instance, None, config).map_err(|err| {
            unsafe { instance.destroy() };
            err
        })?;
        Ok(Self {
            instance,
            device,
            presentation: None,
        })
    }

    pub fn swapchain_config(&self) -> Option<&SwapchainConfig> {
        self.presentation
            .as_ref()
            .map(|presentation| &presentation.swapchain.config)
    }
}

fn negotiate_device(
    instance: &Arc<Instance>,
    surface: Option<&dyn SurfaceQueries>,
    config: &Config,
) -> Result<(Arc<Device>, Option<SelectedPresentation>)> {
    let physical_devices = instance.physical_devices()?;
    let selected = select_physical_device(&physical_devices, &config.device_extensions, surface)?;
    let presentation = selected.presentation.clone();
    let device = Device::new(instance.clone(), selected, config)?;
    Ok((Arc::new(device), presentation))
}

/// Derives the configuration from the surface support captured at selection.
fn create_swapchain(
    device: &Arc<Device>,
    surface: &Surface,
    presentation: Option<SelectedPresentation>,
    framebuffer: vk::Extent2D,
) -> Result<Swapchain> {
    let SelectedPresentation {
        queues,
        surface_support,
    } = presentation.ok_or(Error::PresentationUnsupported)?;
    let config = SwapchainConfig::new(&surface_support, queues, framebuffer);
    Swapchain::new(device, surface, config)
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!("releasing Vulkan context");
        unsafe {
            // Nothing useful can be done with a failure while tearing down.
            let _ = self.device.handle.device_wait_idle();
            if let Some(presentation) = &self.presentation {
                presentation.swapchain.destroy();
            }
            self.device.destroy();
            if let Some(presentation) = &self.presentation {
                presentation.surface.destroy();
            }
            self.instance.destroy();
        }
    }
}
