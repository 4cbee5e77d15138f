use std::collections::BTreeSet;

use ash::vk;
use tracing::warn;

use crate::{physical_device::PhysicalDevice, surface::SurfaceQueries};

/// Which queue families a device has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRequirements {
    /// Offscreen use: only a graphics family is tracked.
    Graphics,
    GraphicsAndPresent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

/// Graphics and present families of a device that passed selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentQueues {
    pub graphics_family: u32,
    pub present_family: u32,
}

impl QueueFamilyIndices {
    /// Scans the device's queue families in reported order and keeps the
    /// first graphics-capable index and, with a surface, the first index
    /// that can present to it. Presentation is never tracked without a surface.
    pub fn resolve(
        physical_device: &PhysicalDevice,
        surface: Option<&dyn SurfaceQueries>,
    ) -> Self {
        let requirements = QueueRequirements::for_surface(surface.is_some());
        let mut indices = Self::default();

        for queue_family in &physical_device.queue_families {
            if indices.graphics_family.is_none()
                && queue_family
                    .properties
                    .queue_flags
                    .contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics_family = Some(queue_family.index);
            }

            if let Some(surface) = surface {
                if indices.present_family.is_none()
                    && supports_present(surface, physical_device, queue_family.index)
                {
                    indices.present_family = Some(queue_family.index);
                }
            }

            if indices.is_complete(requirements) {
                break;
            }
        }

        indices
    }

    pub fn is_complete(&self, requirements: QueueRequirements) -> bool {
        match requirements {
            QueueRequirements::Graphics => self.graphics_family.is_some(),
            QueueRequirements::GraphicsAndPresent => {
                self.graphics_family.is_some() && self.present_family.is_some()
            }
        }
    }

    pub fn present_queues(&self) -> Option<PresentQueues> {
        Some(PresentQueues {
            graphics_family: self.graphics_family?,
            present_family: self.present_family?,
        })
    }

    /// Distinct resolved families in ascending order, one queue each.
    pub fn unique_families(&self) -> Vec<u32> {
        [self.graphics_family, self.present_family]
            .into_iter()
            .flatten()
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect()
    }
}

impl QueueRequirements {
    pub fn for_surface(has_surface: bool) -> Self {
        if has_surface {
            Self::GraphicsAndPresent
        } else {
            Self::Graphics
        }
    }
}

fn supports_present(
    surface: &dyn SurfaceQueries,
    physical_device: &PhysicalDevice,
    queue_family_index: u32,
) -> bool {
    surface
        .supports_present(physical_device.handle, queue_family_index)
        .unwrap_or_else(|err| {
            warn!(
                "presentation support query failed for {} queue family {}: {}",
                physical_device.name, queue_family_index, err
            );
            false
        })
}
