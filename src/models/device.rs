//! Device polymorphism and shared device behavior.
//!
//! "Device" relationships (e.g. the far end of a device configuration)
//! can point at more than one concrete resource kind. [`Device`] is the
//! tagged dispatch over those kinds; [`Configurable`] is the behavior
//! shared by every resource that can carry a device configuration.

use async_trait::async_trait;

use super::{DeviceConfiguration, Element, Sensor};
use crate::error::{Error, Result};
use crate::jsonapi::{ResourceData, ResourceIdentifier};
use crate::relations::{RelationType, ToMany};
use crate::resource::{Related, Resource};
use crate::session::Session;

const DEVICE_CONFIGURATIONS: ToMany<DeviceConfiguration> =
    ToMany::new("device-configuration", RelationType::Direct);

/// A physical device: a sensor or an element, resolved from the `type`
/// discriminator of the JSON node.
#[derive(Debug, Clone, PartialEq)]
pub enum Device {
    Sensor(Sensor),
    Element(Element),
}

impl Device {
    /// The device id.
    pub fn id(&self) -> Option<&str> {
        match self {
            Device::Sensor(sensor) => sensor.id(),
            Device::Element(element) => element.id(),
        }
    }
}

impl Related for Device {
    fn accepts(kind: &str) -> bool {
        Sensor::accepts(kind) || Element::accepts(kind)
    }

    fn related_from(data: ResourceData, session: &Session) -> Result<Self> {
        match data.kind.as_deref() {
            Some(kind) if Sensor::accepts(kind) => {
                Ok(Device::Sensor(Sensor::related_from(data, session)?))
            }
            Some(kind) if Element::accepts(kind) => {
                Ok(Device::Element(Element::related_from(data, session)?))
            }
            other => Err(Error::UnknownKind(other.unwrap_or("<none>").to_string())),
        }
    }

    fn ident(&self) -> Result<ResourceIdentifier> {
        match self {
            Device::Sensor(sensor) => sensor.ident(),
            Device::Element(element) => element.ident(),
        }
    }
}

/// Behavior shared by devices.
///
/// A device can have at most one loaded and one pending device
/// configuration at any given time.
#[async_trait]
pub trait Configurable: Resource {
    /// Fetch all device configurations for this device.
    async fn device_configurations(&self) -> Result<Vec<DeviceConfiguration>> {
        DEVICE_CONFIGURATIONS.fetch(self).await
    }

    /// Resolve the device configurations from the included-resource cache.
    fn included_device_configurations(&self) -> Result<Vec<DeviceConfiguration>> {
        DEVICE_CONFIGURATIONS.included(self)
    }

    /// Get the loaded device configuration, or the pending one when
    /// `pending` is set. `None` when the device has no such configuration.
    async fn device_configuration(&self, pending: bool) -> Result<Option<DeviceConfiguration>> {
        let configs = self.device_configurations().await?;
        Ok(configs.into_iter().find(|c| c.is_loaded() != pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::new("test-token", "https://api.helium.com/v1").unwrap()
    }

    #[test]
    fn test_device_dispatch_on_type() {
        let session = session();
        let sensor: ResourceData =
            serde_json::from_value(json!({"id": "s1", "type": "sensor"})).unwrap();
        let element: ResourceData =
            serde_json::from_value(json!({"id": "e1", "type": "element"})).unwrap();

        assert!(matches!(
            Device::related_from(sensor, &session).unwrap(),
            Device::Sensor(_)
        ));
        assert!(matches!(
            Device::related_from(element, &session).unwrap(),
            Device::Element(_)
        ));
    }

    #[test]
    fn test_device_rejects_unknown_kind() {
        let session = session();
        let label: ResourceData =
            serde_json::from_value(json!({"id": "l1", "type": "label"})).unwrap();
        assert!(matches!(
            Device::related_from(label, &session),
            Err(Error::UnknownKind(kind)) if kind == "label"
        ));
    }

    #[test]
    fn test_device_ident_keeps_concrete_kind() {
        let session = session();
        let data: ResourceData =
            serde_json::from_value(json!({"id": "s1", "type": "sensor"})).unwrap();
        let device = Device::related_from(data, &session).unwrap();
        assert_eq!(device.ident().unwrap().kind, "sensor");
    }
}
