//! In-memory stand-ins for the driver, used by unit tests.

use std::{
    cell::Cell,
    collections::HashMap,
    ffi::CStr,
};

use ash::{
    prelude::VkResult,
    vk::{self, Handle},
};

use crate::{
    physical_device::{PhysicalDevice, QueueFamily},
    surface::SurfaceQueries,
};

pub fn device_handle(raw: u64) -> vk::PhysicalDevice {
    vk::PhysicalDevice::from_raw(raw)
}

/// A device with one queue per family, in the given order.
pub fn physical_device(raw: u64, families: &[vk::QueueFlags]) -> PhysicalDevice {
    PhysicalDevice {
        handle: device_handle(raw),
        name: format!("Test GPU {raw}"),
        properties: vk::PhysicalDeviceProperties::default(),
        queue_families: families
            .iter()
            .enumerate()
            .map(|(index, &queue_flags)| QueueFamily {
                index: index as u32,
                properties: vk::QueueFamilyProperties {
                    queue_flags,
                    queue_count: 1,
                    ..Default::default()
                },
            })
            .collect(),
        extensions: Vec::new(),
    }
}

impl PhysicalDevice {
    pub fn with_extensions(mut self, names: &[&CStr]) -> Self {
        self.extensions = names.iter().map(|&name| name.to_owned()).collect();
        self
    }

    pub fn with_type(mut self, device_type: vk::PhysicalDeviceType) -> Self {
        self.properties.device_type = device_type;
        self
    }
}

pub fn capabilities() -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 3,
        current_extent: vk::Extent2D {
            width: 960,
            height: 540,
        },
        min_image_extent: vk::Extent2D {
            width: 1,
            height: 1,
        },
        max_image_extent: vk::Extent2D {
            width: 4096,
            height: 4096,
        },
        max_image_array_layers: 1,
        current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        ..Default::default()
    }
}

type Support = (Vec<vk::SurfaceFormatKHR>, Vec<vk::PresentModeKHR>);

/// Answers surface queries for the devices it was told about and reports
/// `ERROR_SURFACE_LOST_KHR` for any other device.
#[derive(Default)]
pub struct FakeSurface {
    support: HashMap<vk::PhysicalDevice, Support>,
    present_families: HashMap<vk::PhysicalDevice, Vec<u32>>,
    present_queries: Cell<usize>,
}

impl FakeSurface {
    pub fn with_device(
        mut self,
        device: vk::PhysicalDevice,
        formats: Vec<vk::SurfaceFormatKHR>,
        present_modes: Vec<vk::PresentModeKHR>,
    ) -> Self {
        self.support.insert(device, (formats, present_modes));
        self
    }

    pub fn with_present_families(mut self, device: vk::PhysicalDevice, families: &[u32]) -> Self {
        self.present_families.insert(device, families.to_vec());
        self
    }

    pub fn present_queries(&self) -> usize {
        self.present_queries.get()
    }

    fn support(&self, device: vk::PhysicalDevice) -> VkResult<&Support> {
        self.support
            .get(&device)
            .ok_or(vk::Result::ERROR_SURFACE_LOST_KHR)
    }
}

impl SurfaceQueries for FakeSurface {
    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool> {
        self.present_queries.set(self.present_queries.get() + 1);
        self.present_families
            .get(&physical_device)
            .map(|families| families.contains(&queue_family_index))
            .ok_or(vk::Result::ERROR_SURFACE_LOST_KHR)
    }

    fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        self.support(physical_device).map(|_| capabilities())
    }

    fn formats(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        self.support(physical_device)
            .map(|(formats, _)| formats.clone())
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        self.support(physical_device)
            .map(|(_, present_modes)| present_modes.clone())
    }
}
