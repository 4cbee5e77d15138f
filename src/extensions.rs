use std::{
    collections::BTreeSet,
    ffi::{CStr, CString},
};

use ash::{prelude::VkResult, vk};

use tracing::warn;

use crate::error::{Error, Result};

/// Succeeds iff every required name is among the available ones.
/// Extra available extensions are ignored.
pub fn check_extensions<I>(available: I, required: &[&CStr]) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<CStr>,
{
    let mut missing: BTreeSet<&CStr> = required.iter().copied().collect();
    for name in available {
        missing.remove(name.as_ref());
        if missing.is_empty() {
            return Ok(());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::ExtensionUnsupported(
            missing
                .into_iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
        ))
    }
}

pub fn device_extension_names(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> VkResult<Vec<CString>> {
    let properties = unsafe { instance.enumerate_device_extension_properties(physical_device)? };
    Ok(properties
        .iter()
        .map(|extension| unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) }.to_owned())
        .collect())
}

/// A device whose extensions cannot be listed is treated as offering none,
/// so the checker rejects it instead of aborting enumeration.
pub fn available_or_none(device_name: &str, names: VkResult<Vec<CString>>) -> Vec<CString> {
    names.unwrap_or_else(|err| {
        warn!("listing extensions of {} failed: {}", device_name, err);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWAPCHAIN: &CStr = c"VK_KHR_swapchain";
    const MAINTENANCE: &CStr = c"VK_KHR_maintenance1";
    const RAY_QUERY: &CStr = c"VK_KHR_ray_query";

    #[test]
    fn superset_is_supported() {
        let available = [MAINTENANCE, SWAPCHAIN, RAY_QUERY];
        assert!(check_extensions(available, &[SWAPCHAIN]).is_ok());
    }

    #[test]
    fn nothing_required_is_always_supported() {
        assert!(check_extensions(Vec::<CString>::new(), &[]).is_ok());
    }

    #[test]
    fn missing_names_are_reported_sorted() {
        let available = vec![MAINTENANCE.to_owned()];
        match check_extensions(&available, &[SWAPCHAIN, RAY_QUERY, MAINTENANCE]) {
            Err(Error::ExtensionUnsupported(missing)) => {
                assert_eq!(missing, vec!["VK_KHR_ray_query", "VK_KHR_swapchain"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_device_list_fails_requirement() {
        assert!(matches!(
            check_extensions(Vec::<CString>::new(), &[SWAPCHAIN]),
            Err(Error::ExtensionUnsupported(_))
        ));
    }

    #[test]
    fn unlistable_extensions_fail_the_check() {
        let available = available_or_none("Test GPU", Err(vk::Result::ERROR_INITIALIZATION_FAILED));
        assert!(available.is_empty());
        assert!(matches!(
            check_extensions(&available, &[SWAPCHAIN]),
            Err(Error::ExtensionUnsupported(_))
        ));
    }

    #[test]
    fn listed_extensions_pass_through() {
        let available = available_or_none("Test GPU", Ok(vec![SWAPCHAIN.to_owned()]));
        assert!(check_extensions(&available, &[SWAPCHAIN]).is_ok());
    }
}
