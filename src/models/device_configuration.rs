//! The device-configuration resource.

use serde_json::Map;

use super::Configuration;
use super::Device;
use crate::error::Result;
use crate::jsonapi;
use crate::relations::{RelationType, ToOne};
use crate::resource::{resource_type, Related, Resource, ResourceObject};
use crate::session::Session;

/// The association between a device and a [`Configuration`].
///
/// Created in a pending state; the system marks it loaded once the
/// configuration has been delivered to the device.
#[derive(Debug, Clone)]
pub struct DeviceConfiguration {
    object: ResourceObject,
}

resource_type!(DeviceConfiguration, kind: "device-configuration");

impl DeviceConfiguration {
    const CONFIGURATION: ToOne<Configuration> =
        ToOne::new("configuration", RelationType::Direct);
    const DEVICE: ToOne<Device> = ToOne::new("device", RelationType::Direct);

    /// Create a device configuration associating `device` with
    /// `configuration`.
    pub async fn create_for<D: Related>(
        session: &Session,
        device: &D,
        configuration: &Configuration,
    ) -> Result<Self> {
        let mut relationships = Map::new();
        relationships.insert(
            Self::CONFIGURATION.name().to_string(),
            jsonapi::relationship_one(Some(configuration.ident()?)),
        );
        relationships.insert(
            Self::DEVICE.name().to_string(),
            jsonapi::relationship_one(Some(device.ident()?)),
        );
        Self::create_with(session, None, Some(relationships)).await
    }

    /// Fetch the associated configuration.
    pub async fn configuration(&self) -> Result<Option<Configuration>> {
        Self::CONFIGURATION.fetch(self).await
    }

    /// Resolve the configuration from the included-resource cache.
    pub fn included_configuration(&self) -> Result<Option<Configuration>> {
        Self::CONFIGURATION.included(self)
    }

    /// Fetch the associated device. The far end is polymorphic: a sensor
    /// or an element, disambiguated by its `type` tag.
    pub async fn device(&self) -> Result<Option<Device>> {
        Self::DEVICE.fetch(self).await
    }

    /// Resolve the device from the included-resource cache.
    pub fn included_device(&self) -> Result<Option<Device>> {
        Self::DEVICE.included(self)
    }

    /// Whether the configuration has been loaded onto the device, as
    /// opposed to still pending.
    pub fn is_loaded(&self) -> bool {
        self.meta().boolean("loaded").unwrap_or(false)
    }
}
