use std::sync::Arc;

use ash::{extensions::khr, vk};
use tracing::{debug, info};

use crate::{
    device::Device,
    error::{Error, Result},
    queue_family::PresentQueues,
    surface::{Surface, SurfaceSupport},
};

pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// `current_extent` width reported when the window decides the surface size.
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    /// Graphics family first, then present family.
    Concurrent([u32; 2]),
}

impl ImageSharing {
    pub fn for_queues(queues: PresentQueues) -> Self {
        if queues.graphics_family == queues.present_family {
            Self::Exclusive
        } else {
            Self::Concurrent([queues.graphics_family, queues.present_family])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(indices) => indices,
        }
    }
}

/// Presentation chain settings, valid for the surface they were derived from.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainConfig {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub sharing: ImageSharing,
}

impl SwapchainConfig {
    /// `framebuffer` is used only when the surface leaves the size to the window.
    ///
    /// `support` must come from a device that passed selection, so its
    /// format list is non-empty.
    pub fn new(support: &SurfaceSupport, queues: PresentQueues, framebuffer: vk::Extent2D) -> Self {
        let capabilities = &support.capabilities;
        Self {
            surface_format: choose_surface_format(&support.formats),
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(capabilities, framebuffer),
            image_count: choose_image_count(capabilities),
            pre_transform: capabilities.current_transform,
            sharing: ImageSharing::for_queues(queues),
        }
    }
}

pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .copied()
        .find(|surface_format| is_same_format(surface_format, &PREFERRED_SURFACE_FORMAT))
        .or_else(|| formats.first().copied())
        .unwrap_or(PREFERRED_SURFACE_FORMAT)
}

pub fn is_same_format(a: &vk::SurfaceFormatKHR, b: &vk::SurfaceFormatKHR) -> bool {
    a.format == b.format && a.color_space == b.color_space
}

/// FIFO is available everywhere, so it is the fallback even when unlisted.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|present_mode| *present_mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != UNDEFINED_EXTENT {
        return capabilities.current_extent;
    }
    let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);
    // Drivers may report min > max; the maximum wins then.
    vk::Extent2D {
        width: framebuffer.width.max(min.width).min(max.width),
        height: framebuffer.height.max(min.height).min(max.height),
    }
}

/// One image more than the minimum; a maximum of 0 means unbounded.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub functions: khr::Swapchain,
    pub config: SwapchainConfig,
    pub images: Vec<vk::Image>,
}

impl Swapchain {
    pub fn new(device: &Arc<Device>, surface: &Surface, config: SwapchainConfig) -> Result<Self> {
        let functions = khr::Swapchain::new(&device.instance.handle, &device.handle);

        info!(
            "creating swapchain: {}x{}, {:?} / {:?}, {:?}, {} images, {:?}",
            config.extent.width,
            config.extent.height,
            config.surface_format.format,
            config.surface_format.color_space,
            config.present_mode,
            config.image_count,
            config.sharing,
        );

        let handle = unsafe {
            functions
                .create_swapchain(
                    &vk::SwapchainCreateInfoKHR::builder()
                        .surface(surface.handle)
                        .min_image_count(config.image_count)
                        .image_format(config.surface_format.format)
                        .image_color_space(config.surface_format.color_space)
                        .image_extent(config.extent)
                        .image_array_layers(1)
                        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                        .image_sharing_mode(config.sharing.mode())
                        .queue_family_indices(config.sharing.queue_family_indices())
                        .pre_transform(config.pre_transform)
                        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                        .present_mode(config.present_mode)
                        .clipped(true)
                        .old_swapchain(vk::SwapchainKHR::null()),
                    None,
                )
                .map_err(Error::SwapchainCreation)?
        };

        let images = unsafe { functions.get_swapchain_images(handle)? };
        debug!("swapchain holds {} images", images.len());

        Ok(Self {
            handle,
            functions,
            config,
            images,
        })
    }

    /// # Safety
    /// The images must no longer be in use by the device.
    pub unsafe fn destroy(&self) {
        self.functions.destroy_swapchain(self.handle, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capabilities;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn assert_format(actual: vk::SurfaceFormatKHR, expected: vk::SurfaceFormatKHR) {
        assert!(
            is_same_format(&actual, &expected),
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn window_sized() -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: extent(UNDEFINED_EXTENT, UNDEFINED_EXTENT),
            min_image_extent: extent(1, 1),
            max_image_extent: extent(4096, 4096),
            ..capabilities()
        }
    }

    #[test]
    fn preferred_format_found_anywhere_in_list() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            PREFERRED_SURFACE_FORMAT,
        ];
        assert_format(choose_surface_format(&formats), PREFERRED_SURFACE_FORMAT);
    }

    #[test]
    fn preferred_format_needs_matching_color_space() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        assert_format(choose_surface_format(&formats), formats[0]);
    }

    #[test]
    fn first_format_used_without_preferred_pair() {
        let linear = format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::PASS_THROUGH_EXT);
        assert_format(choose_surface_format(&[linear]), linear);
    }

    #[test]
    fn mailbox_preferred() {
        let modes = [
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_fallback_even_when_unlisted() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]),
            vk::PresentModeKHR::FIFO
        );
        assert_eq!(
            choose_present_mode(&[
                vk::PresentModeKHR::FIFO_RELAXED,
                vk::PresentModeKHR::FIFO
            ]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn fixed_current_extent_is_authoritative() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: extent(800, 600),
            ..capabilities()
        };
        assert_eq!(
            choose_extent(&capabilities, extent(1280, 720)),
            extent(800, 600)
        );
    }

    #[test]
    fn framebuffer_size_used_when_extent_undefined() {
        assert_eq!(
            choose_extent(&window_sized(), extent(1280, 720)),
            extent(1280, 720)
        );
    }

    #[test]
    fn framebuffer_size_clamped_per_axis() {
        assert_eq!(
            choose_extent(&window_sized(), extent(8000, 10)),
            extent(4096, 10)
        );
        assert_eq!(choose_extent(&window_sized(), extent(0, 0)), extent(1, 1));
    }

    #[test]
    fn inverted_extent_bounds_resolve_to_maximum() {
        let inverted = vk::SurfaceCapabilitiesKHR {
            min_image_extent: extent(1, 1),
            max_image_extent: extent(0, 0),
            ..window_sized()
        };
        assert_eq!(choose_extent(&inverted, extent(1280, 720)), extent(0, 0));

        let one_axis = vk::SurfaceCapabilitiesKHR {
            min_image_extent: extent(2000, 1),
            max_image_extent: extent(1000, 4096),
            ..window_sized()
        };
        assert_eq!(choose_extent(&one_axis, extent(1280, 720)), extent(1000, 720));
    }

    #[test]
    fn image_count_is_minimum_plus_one() {
        let bounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..capabilities()
        };
        assert_eq!(choose_image_count(&bounded), 3);

        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..capabilities()
        };
        assert_eq!(choose_image_count(&unbounded), 3);
    }

    #[test]
    fn image_count_clamped_to_maximum() {
        let tight = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 3,
            ..capabilities()
        };
        assert_eq!(choose_image_count(&tight), 3);
    }

    #[test]
    fn shared_family_is_exclusive() {
        let sharing = ImageSharing::for_queues(PresentQueues {
            graphics_family: 0,
            present_family: 0,
        });
        assert_eq!(sharing, ImageSharing::Exclusive);
        assert_eq!(sharing.mode(), vk::SharingMode::EXCLUSIVE);
        assert!(sharing.queue_family_indices().is_empty());
    }

    #[test]
    fn split_families_are_concurrent() {
        let sharing = ImageSharing::for_queues(PresentQueues {
            graphics_family: 0,
            present_family: 1,
        });
        assert_eq!(sharing, ImageSharing::Concurrent([0, 1]));
        assert_eq!(sharing.mode(), vk::SharingMode::CONCURRENT);
        assert_eq!(sharing.queue_family_indices(), &[0, 1]);
    }

    #[test]
    fn config_combines_choices() {
        let support = SurfaceSupport {
            capabilities: window_sized(),
            formats: vec![
                format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
                PREFERRED_SURFACE_FORMAT,
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        let queues = PresentQueues {
            graphics_family: 2,
            present_family: 0,
        };

        let config = SwapchainConfig::new(&support, queues, extent(960, 540));
        assert_format(config.surface_format, PREFERRED_SURFACE_FORMAT);
        assert_eq!(config.present_mode, vk::PresentModeKHR::FIFO);
        assert_eq!(config.extent, extent(960, 540));
        assert_eq!(config.image_count, 3);
        assert_eq!(config.pre_transform, vk::SurfaceTransformFlagsKHR::IDENTITY);
        assert_eq!(config.sharing, ImageSharing::Concurrent([2, 0]));
    }
}
