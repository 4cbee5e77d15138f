//! Settings passed into the negotiation at construction.
//!
//! Nothing here is global: the bring-up code builds a [`Config`] once and
//! hands it to [`crate::context::Context::new`].

use std::ffi::CStr;

use ash::extensions::khr;

pub const KHRONOS_VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Environment variable that overrides [`ValidationConfig::enabled`].
pub const VALIDATION_ENV: &str = "VULKAN_VALIDATION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub layers: Vec<&'static CStr>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
            layers: vec![KHRONOS_VALIDATION_LAYER],
        }
    }
}

impl ValidationConfig {
    /// Defaults, with `VULKAN_VALIDATION` forcing validation on or off.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(enabled) = std::env::var(VALIDATION_ENV)
            .ok()
            .as_deref()
            .and_then(parse_toggle)
        {
            config.enabled = enabled;
        }
        config
    }

    /// Layers to enable, empty when validation is off.
    pub fn enabled_layers(&self) -> &[&'static CStr] {
        if self.enabled {
            &self.layers
        } else {
            &[]
        }
    }
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub application_name: String,
    pub engine_name: String,
    pub validation: ValidationConfig,
    pub device_extensions: Vec<&'static CStr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application_name: "Vulkan Application".to_owned(),
            engine_name: "Vulkan Engine".to_owned(),
            validation: ValidationConfig::default(),
            device_extensions: vec![khr::Swapchain::name()],
        }
    }
}

impl Config {
    /// Configuration for device selection without a presentation surface.
    pub fn headless() -> Self {
        Self {
            device_extensions: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requires_swapchain_extension() {
        let config = Config::default();
        assert_eq!(config.device_extensions, vec![khr::Swapchain::name()]);
        assert_eq!(config.validation.layers, vec![KHRONOS_VALIDATION_LAYER]);
    }

    #[test]
    fn headless_requires_no_device_extensions() {
        assert!(Config::headless().device_extensions.is_empty());
    }

    #[test]
    fn disabled_validation_enables_no_layers() {
        let validation = ValidationConfig {
            enabled: false,
            ..ValidationConfig::default()
        };
        assert!(validation.enabled_layers().is_empty());

        let validation = ValidationConfig {
            enabled: true,
            ..ValidationConfig::default()
        };
        assert_eq!(validation.enabled_layers(), &[KHRONOS_VALIDATION_LAYER]);
    }

    #[test]
    fn toggle_parsing() {
        assert_eq!(parse_toggle("1"), Some(true));
        assert_eq!(parse_toggle(" On "), Some(true));
        assert_eq!(parse_toggle("false"), Some(false));
        assert_eq!(parse_toggle("maybe"), None);
    }
}
