use std::ffi::{c_void, CStr, CString};

use ash::{extensions::ext, vk};
use raw_window_handle::RawDisplayHandle;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    extensions::{available_or_none, device_extension_names},
    physical_device::{PhysicalDevice, QueueFamily},
    surface,
};

pub struct Instance {
    pub entry: ash::Entry,
    pub handle: ash::Instance,
    debug_messenger: Option<(ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl Instance {
    /// Creates an instance able to present to windows on `display`.
    pub fn new(config: &Config, display: RawDisplayHandle) -> Result<Self> {
        let mut extensions = surface::required_extensions(display)?;
        Self::with_extensions(config, &mut extensions)
    }

    /// Creates an instance without surface extensions.
    pub fn headless(config: &Config) -> Result<Self> {
        Self::with_extensions(config, &mut Vec::new())
    }

    fn with_extensions(config: &Config, extensions: &mut Vec<&'static CStr>) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        let validation = config.validation.enabled;
        if validation {
            check_layers(&entry, config.validation.enabled_layers())?;
            extensions.push(ext::DebugUtils::name());
        }

        let application_name = CString::new(config.application_name.as_str())
            .unwrap_or_else(|_| CString::from(c"Vulkan Application"));
        let engine_name = CString::new(config.engine_name.as_str())
            .unwrap_or_else(|_| CString::from(c"Vulkan Engine"));
        let version = vk::make_api_version(0, 1, 0, 0);

        let enabled_layer_names: Vec<_> = config
            .validation
            .enabled_layers()
            .iter()
            .map(|name| name.as_ptr())
            .collect();
        let enabled_extension_names: Vec<_> =
            extensions.iter().map(|name| name.as_ptr()).collect();

        let mut messenger_info = debug_messenger_info();
        let application_info = vk::ApplicationInfo::builder()
            .application_name(&application_name)
            .application_version(version)
            .engine_name(&engine_name)
            .engine_version(version)
            .api_version(vk::API_VERSION_1_3);
        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);
        if validation {
            // Also reports problems during instance creation itself.
            create_info = create_info.push_next(&mut messenger_info);
        }

        let handle = unsafe { entry.create_instance(&create_info, None)? };

        let debug_messenger = if validation {
            let debug_utils = ext::DebugUtils::new(&entry, &handle);
            let messenger = unsafe {
                debug_utils.create_debug_utils_messenger(&debug_messenger_info(), None)
            };
            match messenger {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(err) => {
                    unsafe { handle.destroy_instance(None) };
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        info!(
            "Vulkan instance created ({} extensions, validation {})",
            extensions.len(),
            if validation { "on" } else { "off" }
        );

        Ok(Self {
            entry,
            handle,
            debug_messenger,
        })
    }

    /// Devices in the order the driver enumerates them.
    pub fn physical_devices(&self) -> Result<Vec<PhysicalDevice>> {
        let physical_devices = unsafe { self.handle.enumerate_physical_devices()? };
        debug!("driver reports {} physical devices", physical_devices.len());
        Ok(physical_devices
            .iter()
            .map(|&physical_device| {
                let properties =
                    unsafe { self.handle.get_physical_device_properties(physical_device) };
                let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
                    .to_string_lossy()
                    .into_owned();
                let queue_families: Vec<QueueFamily> = {
                    let queue_families = unsafe {
                        self.handle
                            .get_physical_device_queue_family_properties(physical_device)
                    };
                    queue_families
                        .iter()
                        .enumerate()
                        .map(|(index, &properties)| QueueFamily {
                            index: index as u32,
                            properties,
                        })
                        .collect()
                };
                let extensions = available_or_none(
                    &name,
                    device_extension_names(&self.handle, physical_device),
                );
                PhysicalDevice {
                    handle: physical_device,
                    name,
                    properties,
                    queue_families,
                    extensions,
                }
            })
            .collect())
    }

    /// # Safety
    /// Every surface and device created from this instance must already be destroyed.
    pub unsafe fn destroy(&self) {
        if let Some((debug_utils, messenger)) = &self.debug_messenger {
            debug_utils.destroy_debug_utils_messenger(*messenger, None);
        }
        self.handle.destroy_instance(None);
    }
}

fn check_layers(entry: &ash::Entry, requested: &[&CStr]) -> Result<()> {
    let layers = unsafe { entry.enumerate_instance_layer_properties()? };
    let available: Vec<CString> = layers
        .iter()
        .map(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) }.to_owned())
        .collect();
    let missing = missing_layers(&available, requested);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::ValidationLayerUnsupported(missing))
    }
}

fn missing_layers(available: &[CString], requested: &[&CStr]) -> Vec<String> {
    requested
        .iter()
        .filter(|&&name| !available.iter().any(|layer| layer.as_c_str() == name))
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

fn debug_messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .build()
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() || (*callback_data).p_message.is_null() {
        "<no message>".into()
    } else {
        CStr::from_ptr((*callback_data).p_message).to_string_lossy()
    };

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            error!(target: "vulkan", "{:?}: {}", message_type, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            warn!(target: "vulkan", "{:?}: {}", message_type, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            debug!(target: "vulkan", "{:?}: {}", message_type, message)
        }
        _ => trace!(target: "vulkan", "{:?}: {}", message_type, message),
    }

    vk::FALSE
}
