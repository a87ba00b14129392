//! The configuration resource.

use super::DeviceConfiguration;
use crate::error::Result;
use crate::relations::{RelationType, ToMany};
use crate::resource::{resource_type, Resource, ResourceObject};

/// An immutable holder of device settings.
///
/// Configurations are not mutable, for auditability: to change a device's
/// settings, create a new configuration and associate it with the device
/// through a new [`DeviceConfiguration`]. A single configuration can be
/// applied to many devices.
#[derive(Debug, Clone)]
pub struct Configuration {
    object: ResourceObject,
}

resource_type!(Configuration, kind: "configuration");

impl Configuration {
    const DEVICE_CONFIGURATIONS: ToMany<DeviceConfiguration> =
        ToMany::new("device-configuration", RelationType::Direct);

    /// Fetch the device configurations applying this configuration.
    pub async fn device_configurations(&self) -> Result<Vec<DeviceConfiguration>> {
        Self::DEVICE_CONFIGURATIONS.fetch(self).await
    }
}
