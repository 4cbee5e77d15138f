use std::{
    ffi::{CStr, CString},
    fmt,
};

use ash::{prelude::VkResult, vk};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    extensions::check_extensions,
    queue_family::{PresentQueues, QueueFamilyIndices, QueueRequirements},
    surface::{SurfaceQueries, SurfaceSupport},
};

#[derive(Debug, Clone, Copy)]
pub struct QueueFamily {
    pub index: u32,
    pub properties: vk::QueueFamilyProperties,
}

/// Everything read about a device at enumeration time.
#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_families: Vec<QueueFamily>,
    pub extensions: Vec<CString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    IncompleteQueueFamilies(QueueFamilyIndices),
    MissingExtensions(Vec<String>),
    InadequateSurface { formats: usize, present_modes: usize },
    SurfaceQueryFailed(vk::Result),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteQueueFamilies(indices) => write!(
                f,
                "missing queue families (graphics: {:?}, present: {:?})",
                indices.graphics_family, indices.present_family
            ),
            Self::MissingExtensions(names) => {
                write!(f, "missing extensions: {}", names.join(", "))
            }
            Self::InadequateSurface {
                formats,
                present_modes,
            } => write!(
                f,
                "surface offers {formats} formats and {present_modes} present modes"
            ),
            Self::SurfaceQueryFailed(err) => write!(f, "surface query failed: {err}"),
        }
    }
}

/// A device under evaluation, with what was learned about it.
#[derive(Debug)]
pub struct PhysicalDeviceCandidate<'a> {
    pub device: &'a PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub extensions: Result<()>,
    pub surface_support: Option<VkResult<SurfaceSupport>>,
    requirements: QueueRequirements,
}

impl<'a> PhysicalDeviceCandidate<'a> {
    /// The surface is queried only once the device's extensions check out.
    /// A failed query is kept and turns into a [`Rejection`].
    pub fn evaluate(
        device: &'a PhysicalDevice,
        required_extensions: &[&CStr],
        surface: Option<&dyn SurfaceQueries>,
    ) -> Self {
        let queue_families = QueueFamilyIndices::resolve(device, surface);
        let extensions = check_extensions(&device.extensions, required_extensions);
        let surface_support = match surface {
            Some(surface) if extensions.is_ok() => {
                Some(SurfaceSupport::query(surface, device.handle))
            }
            _ => None,
        };
        Self {
            device,
            queue_families,
            extensions,
            surface_support,
            requirements: QueueRequirements::for_surface(surface.is_some()),
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        if !self.queue_families.is_complete(self.requirements) {
            return Some(Rejection::IncompleteQueueFamilies(self.queue_families));
        }
        if let Err(err) = &self.extensions {
            let missing = match err {
                Error::ExtensionUnsupported(missing) => missing.clone(),
                other => vec![other.to_string()],
            };
            return Some(Rejection::MissingExtensions(missing));
        }
        match &self.surface_support {
            Some(Err(err)) => Some(Rejection::SurfaceQueryFailed(*err)),
            Some(Ok(support)) if !support.is_adequate() => Some(Rejection::InadequateSurface {
                formats: support.formats.len(),
                present_modes: support.present_modes.len(),
            }),
            _ => None,
        }
    }

    pub fn is_suitable(&self) -> bool {
        self.rejection().is_none()
    }

    /// Consumes a suitable candidate; an unsuitable one yields its rejection.
    pub fn into_selected(self) -> std::result::Result<SelectedDevice, Rejection> {
        if let Some(rejection) = self.rejection() {
            return Err(rejection);
        }
        let incomplete = Rejection::IncompleteQueueFamilies(self.queue_families);
        let graphics_family = self
            .queue_families
            .graphics_family
            .ok_or_else(|| incomplete.clone())?;
        let presentation = match self.surface_support {
            Some(Ok(surface_support)) => Some(SelectedPresentation {
                queues: self.queue_families.present_queues().ok_or(incomplete)?,
                surface_support,
            }),
            Some(Err(err)) => return Err(Rejection::SurfaceQueryFailed(err)),
            None => None,
        };
        Ok(SelectedDevice {
            physical_device: self.device.clone(),
            queue_families: self.queue_families,
            graphics_family,
            presentation,
        })
    }
}

/// Present queues and surface envelope of a device selected for a surface.
#[derive(Debug, Clone)]
pub struct SelectedPresentation {
    pub queues: PresentQueues,
    pub surface_support: SurfaceSupport,
}

/// The device chosen by [`select_physical_device`].
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    pub physical_device: PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub graphics_family: u32,
    /// Absent when selection ran without a surface.
    pub presentation: Option<SelectedPresentation>,
}

/// Picks the first suitable device in enumeration order.
///
/// Devices are not ranked: a suitable integrated GPU listed before a discrete
/// one is chosen over it. Failing driver queries only disqualify the device
/// they were made for.
pub fn select_physical_device(
    devices: &[PhysicalDevice],
    required_extensions: &[&CStr],
    surface: Option<&dyn SurfaceQueries>,
) -> Result<SelectedDevice> {
    for device in devices {
        match PhysicalDeviceCandidate::evaluate(device, required_extensions, surface).into_selected()
        {
            Ok(selected) => {
                info!(
                    "selected {} ({:?})",
                    device.name, device.properties.device_type
                );
                return Ok(selected);
            }
            Err(rejection) => debug!("skipping {}: {}", device.name, rejection),
        }
    }

    Err(Error::NoSuitableDevice {
        candidates: devices.len(),
    })
}
