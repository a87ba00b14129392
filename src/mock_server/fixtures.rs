//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data, plus the
//! default scenario the server starts with.

use serde_json::{json, Map, Value};

use super::state::{MockState, Ref, StoredPoint, StoredResource};

/// Fixture ids, stable across server starts so tests can address the
/// default scenario directly.
pub const SENSOR_OFFICE: &str = "818a42f6-a6b5-4c26-a05f-36c9bb7b8519";
pub const SENSOR_GARAGE: &str = "3a6a1703-ccb6-4e53-9700-5b0c6f64a1e8";
pub const ELEMENT_GATEWAY: &str = "d5fcd41f-04d0-4f5e-a0a9-92ab4d9bfd25";
pub const LABEL_HOME: &str = "86a5c5cc-ee97-4f21-8a55-a2fd2f6914a1";
pub const ORGANIZATION: &str = "fa3ba8e9-2b19-4eb2-a8c0-6e22b26e7a09";
pub const USER: &str = "c1f69e6e-d92e-4fd0-9cbb-56c3a2cf2fbc";
pub const CONFIGURATION: &str = "b3f52b2e-a44e-4e2f-b3b9-9e71f00f5b0e";
pub const DEVICE_CONFIGURATION: &str = "5c1f7b2a-9d0a-4b51-8a3a-46a4fd7b2b10";
pub const POINT_OLD: &str = "7bd34c8c-69b0-4c50-bd6c-f4a4e9b4d801";
pub const POINT_MID: &str = "88e1fd48-2c6e-4f24-8a07-1b33a7bba902";
pub const POINT_NEW: &str = "94af2f56-169c-4dee-86eb-9c0f7e5d0a03";

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    fn attrs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Create a sensor with a name and MAC address.
    pub fn sensor(id: &str, name: &str) -> StoredResource {
        StoredResource::new(
            "sensor",
            id,
            Self::attrs(&[
                ("name", json!(name)),
                ("mac", json!("6081f9fffe000000")),
            ]),
        )
    }

    /// Create an element with a name.
    pub fn element(id: &str, name: &str) -> StoredResource {
        StoredResource::new(
            "element",
            id,
            Self::attrs(&[
                ("name", json!(name)),
                ("mac", json!("6081f9fffe111111")),
            ]),
        )
    }

    /// Create a label with a name.
    pub fn label(id: &str, name: &str) -> StoredResource {
        StoredResource::new("label", id, Self::attrs(&[("name", json!(name))]))
    }

    /// Create the authorized organization.
    pub fn organization(id: &str, name: &str) -> StoredResource {
        StoredResource::new("organization", id, Self::attrs(&[("name", json!(name))]))
    }

    /// Create the authorized user.
    pub fn user(id: &str, email: &str) -> StoredResource {
        StoredResource::new(
            "user",
            id,
            Self::attrs(&[("name", json!("Test User")), ("email", json!(email))]),
        )
    }

    /// Create a configuration holding device settings.
    pub fn configuration(id: &str, settings: Map<String, Value>) -> StoredResource {
        StoredResource::new("configuration", id, settings)
    }

    /// Create a device configuration, loaded or still pending.
    pub fn device_configuration(id: &str, loaded: bool) -> StoredResource {
        let mut resource = StoredResource::new("device-configuration", id, Map::new());
        resource.meta.insert("loaded".to_string(), json!(loaded));
        resource
    }

    /// Create a timeseries reading.
    pub fn point(id: &str, port: &str, value: Value, timestamp: &str) -> StoredPoint {
        StoredPoint {
            id: id.to_string(),
            port: port.to_string(),
            value,
            timestamp: timestamp.to_string(),
        }
    }

    /// The default scenario: an organization with one user, two sensors
    /// grouped under a label and connected through an element, a loaded
    /// device configuration on the office sensor, and three temperature
    /// readings on it.
    pub fn default_state() -> MockState {
        MockState::new()
            .with_resource(Self::organization(ORGANIZATION, "Test Organization"))
            .with_resource(Self::user(USER, "test@helium.com"))
            .with_resource(Self::sensor(SENSOR_OFFICE, "office"))
            .with_resource(Self::sensor(SENSOR_GARAGE, "garage"))
            .with_resource(Self::element(ELEMENT_GATEWAY, "gateway"))
            .with_resource(Self::label(LABEL_HOME, "home"))
            .with_resource(Self::configuration(
                CONFIGURATION,
                Self::attrs(&[("interval", json!(60))]),
            ))
            .with_resource(Self::device_configuration(DEVICE_CONFIGURATION, true))
            .with_link(
                "organization",
                ORGANIZATION,
                "user",
                vec![Ref::new("user", USER)],
            )
            .with_link(
                "label",
                LABEL_HOME,
                "sensor",
                vec![
                    Ref::new("sensor", SENSOR_OFFICE),
                    Ref::new("sensor", SENSOR_GARAGE),
                ],
            )
            .with_link(
                "label",
                LABEL_HOME,
                "element",
                vec![Ref::new("element", ELEMENT_GATEWAY)],
            )
            .with_link(
                "sensor",
                SENSOR_OFFICE,
                "label",
                vec![Ref::new("label", LABEL_HOME)],
            )
            .with_link(
                "sensor",
                SENSOR_GARAGE,
                "label",
                vec![Ref::new("label", LABEL_HOME)],
            )
            .with_link(
                "element",
                ELEMENT_GATEWAY,
                "sensor",
                vec![
                    Ref::new("sensor", SENSOR_OFFICE),
                    Ref::new("sensor", SENSOR_GARAGE),
                ],
            )
            .with_link(
                "element",
                ELEMENT_GATEWAY,
                "label",
                vec![Ref::new("label", LABEL_HOME)],
            )
            .with_link(
                "sensor",
                SENSOR_OFFICE,
                "device-configuration",
                vec![Ref::new("device-configuration", DEVICE_CONFIGURATION)],
            )
            .with_link(
                "device-configuration",
                DEVICE_CONFIGURATION,
                "configuration",
                vec![Ref::new("configuration", CONFIGURATION)],
            )
            .with_link(
                "device-configuration",
                DEVICE_CONFIGURATION,
                "device",
                vec![Ref::new("sensor", SENSOR_OFFICE)],
            )
            .with_link(
                "configuration",
                CONFIGURATION,
                "device-configuration",
                vec![Ref::new("device-configuration", DEVICE_CONFIGURATION)],
            )
            .with_point(
                "sensor",
                SENSOR_OFFICE,
                Self::point(POINT_OLD, "t", json!(21.5), "2016-09-01T00:00:00.000Z"),
            )
            .with_point(
                "sensor",
                SENSOR_OFFICE,
                Self::point(POINT_MID, "t", json!(22.0), "2016-09-01T01:00:00.000Z"),
            )
            .with_point(
                "sensor",
                SENSOR_OFFICE,
                Self::point(POINT_NEW, "t", json!(23.5), "2016-09-01T02:00:00.000Z"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_cross_linked() {
        let state = Fixtures::default_state();
        assert!(state.get("sensor", SENSOR_OFFICE).is_some());
        assert_eq!(state.refs("label", LABEL_HOME, "sensor").len(), 2);
        assert_eq!(
            state.refs("sensor", SENSOR_OFFICE, "label"),
            vec![Ref::new("label", LABEL_HOME)]
        );
        assert_eq!(state.points_for("sensor", SENSOR_OFFICE).len(), 3);
    }

    #[test]
    fn test_device_configuration_fixture_meta() {
        let loaded = Fixtures::device_configuration("dc", true);
        assert_eq!(loaded.meta["loaded"], json!(true));
        let pending = Fixtures::device_configuration("dc", false);
        assert_eq!(pending.meta["loaded"], json!(false));
    }
}
