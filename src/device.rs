use std::{ffi::CStr, sync::Arc};

use ash::vk;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{Error, Result},
    instance::Instance,
    physical_device::{PhysicalDevice, SelectedDevice},
    queue_family::QueueFamilyIndices,
};

static QUEUE_PRIORITIES: [f32; 1] = [1.0];

#[derive(Debug, Clone, Copy)]
pub struct Queue {
    pub handle: vk::Queue,
    pub family_index: u32,
}

pub struct Device {
    pub handle: ash::Device,
    pub instance: Arc<Instance>,
    pub physical_device: PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub graphics_queue: Queue,
    /// Absent when the device was selected without a surface.
    pub present_queue: Option<Queue>,
}

/// One request per distinct family; graphics and present share a request
/// when they resolve to the same family.
pub fn queue_create_infos(indices: &QueueFamilyIndices) -> Vec<vk::DeviceQueueCreateInfo> {
    indices
        .unique_families()
        .into_iter()
        .map(|queue_family_index| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(queue_family_index)
                .queue_priorities(&QUEUE_PRIORITIES)
                .build()
        })
        .collect()
}

impl Device {
    pub fn new(instance: Arc<Instance>, selected: SelectedDevice, config: &Config) -> Result<Self> {
        let SelectedDevice {
            physical_device,
            queue_families,
            graphics_family,
            ..
        } = selected;

        let queue_create_infos = queue_create_infos(&queue_families);
        let enabled_extension_names = as_ptrs(&config.device_extensions);
        let enabled_layer_names = as_ptrs(config.validation.enabled_layers());
        let enabled_features = vk::PhysicalDeviceFeatures::default();

        debug!(
            "creating logical device with {} queue create requests",
            queue_create_infos.len()
        );

        let handle = unsafe {
            instance
                .handle
                .create_device(
                    physical_device.handle,
                    &vk::DeviceCreateInfo::builder()
                        .queue_create_infos(&queue_create_infos)
                        .enabled_extension_names(&enabled_extension_names)
                        .enabled_layer_names(&enabled_layer_names)
                        .enabled_features(&enabled_features),
                    None,
                )
                .map_err(Error::DeviceCreation)?
        };

        let graphics_queue = Queue {
            handle: unsafe { handle.get_device_queue(graphics_family, 0) },
            family_index: graphics_family,
        };
        let present_queue = queue_families.present_family.map(|present_family| Queue {
            handle: unsafe { handle.get_device_queue(present_family, 0) },
            family_index: present_family,
        });

        info!(
            "logical device ready on {} (graphics family {}, present family {:?})",
            physical_device.name, graphics_family, queue_families.present_family
        );

        Ok(Self {
            handle,
            instance,
            physical_device,
            queue_families,
            graphics_queue,
            present_queue,
        })
    }

    /// # Safety
    /// Every object created from this device must already be destroyed.
    pub unsafe fn destroy(&self) {
        self.handle.destroy_device(None);
    }
}

fn as_ptrs(names: &[&CStr]) -> Vec<*const std::ffi::c_char> {
    names.iter().map(|name| name.as_ptr()).collect()
}
