use std::{ffi::CStr, sync::Arc};

use ash::{extensions::khr, prelude::VkResult, vk};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use tracing::debug;

use crate::{
    error::{Error, Result},
    instance::Instance,
};

/// The surface queries the negotiation depends on.
///
/// [`Surface`] answers them through the driver; tests answer them from memory.
pub trait SurfaceQueries {
    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool>;

    fn capabilities(&self, physical_device: vk::PhysicalDevice)
        -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn formats(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn present_modes(&self, physical_device: vk::PhysicalDevice)
        -> VkResult<Vec<vk::PresentModeKHR>>;
}

/// Instance extensions needed to create a surface for this display.
pub fn required_extensions(display: RawDisplayHandle) -> Result<Vec<&'static CStr>> {
    let platform = match display {
        RawDisplayHandle::Windows(_) => khr::Win32Surface::name(),
        RawDisplayHandle::Xlib(_) => khr::XlibSurface::name(),
        RawDisplayHandle::Xcb(_) => khr::XcbSurface::name(),
        RawDisplayHandle::Wayland(_) => khr::WaylandSurface::name(),
        _ => return Err(Error::UnsupportedPlatform),
    };
    Ok(vec![khr::Surface::name(), platform])
}

pub struct Surface {
    pub handle: vk::SurfaceKHR,
    pub functions: khr::Surface,
}

impl Surface {
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        instance: &Arc<Instance>,
    ) -> Result<Self> {
        let entry = &instance.entry;
        let handle = match (
            window.display_handle()?.as_raw(),
            window.window_handle()?.as_raw(),
        ) {
            (_, RawWindowHandle::Win32(window_handle)) => {
                let hinstance = window_handle.hinstance.map_or(0, |hinstance| hinstance.get());
                unsafe {
                    khr::Win32Surface::new(entry, &instance.handle).create_win32_surface(
                        &vk::Win32SurfaceCreateInfoKHR::builder()
                            .hinstance(hinstance as vk::HINSTANCE)
                            .hwnd(window_handle.hwnd.get() as vk::HWND),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window_handle)) => {
                let dpy = display
                    .display
                    .ok_or(Error::UnsupportedPlatform)?
                    .as_ptr();
                unsafe {
                    khr::XlibSurface::new(entry, &instance.handle).create_xlib_surface(
                        &vk::XlibSurfaceCreateInfoKHR::builder()
                            .dpy(dpy as *mut vk::Display)
                            .window(window_handle.window as vk::Window),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(window_handle)) => {
                let connection = display
                    .connection
                    .ok_or(Error::UnsupportedPlatform)?
                    .as_ptr();
                unsafe {
                    khr::XcbSurface::new(entry, &instance.handle).create_xcb_surface(
                        &vk::XcbSurfaceCreateInfoKHR::builder()
                            .connection(connection as *mut vk::xcb_connection_t)
                            .window(window_handle.window.get()),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window_handle)) => unsafe {
                khr::WaylandSurface::new(entry, &instance.handle).create_wayland_surface(
                    &vk::WaylandSurfaceCreateInfoKHR::builder()
                        .display(display.display.as_ptr() as *mut vk::wl_display)
                        .surface(window_handle.surface.as_ptr() as *mut vk::wl_surface),
                    None,
                )?
            },
            _ => return Err(Error::UnsupportedPlatform),
        };
        let functions = khr::Surface::new(entry, &instance.handle);
        Ok(Self { handle, functions })
    }

    /// # Safety
    /// No swapchain created for this surface may still be alive.
    pub unsafe fn destroy(&self) {
        self.functions.destroy_surface(self.handle, None);
    }
}

impl SurfaceQueries for Surface {
    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool> {
        unsafe {
            self.functions.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.handle,
            )
        }
    }

    fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.functions
                .get_physical_device_surface_capabilities(physical_device, self.handle)
        }
    }

    fn formats(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.functions
                .get_physical_device_surface_formats(physical_device, self.handle)
        }
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.functions
                .get_physical_device_surface_present_modes(physical_device, self.handle)
        }
    }
}

/// What a device can do with a surface.
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Empty format or present mode lists are returned as-is; see [`Self::is_adequate`].
    pub fn query(
        surface: &(impl SurfaceQueries + ?Sized),
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Self> {
        let capabilities = surface.capabilities(physical_device)?;
        let formats = surface.formats(physical_device)?;
        let present_modes = surface.present_modes(physical_device)?;

        debug!(
            "surface support: {} formats, {} present modes, image count {}..{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unbounded".to_owned()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}
