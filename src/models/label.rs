//! The label resource.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Element, HasMetadata, Sensor};
use crate::error::Result;
use crate::jsonapi;
use crate::relations::{RelationType, ToMany};
use crate::resource::{resource_type, Related, Resource, ResourceObject};
use crate::session::Session;

/// A label: a named grouping of sensors and elements.
///
/// Both relationships are writable; membership can be added to, removed
/// from, or replaced wholesale.
#[derive(Debug, Clone)]
pub struct Label {
    object: ResourceObject,
}

resource_type!(Label, kind: "label");

impl Label {
    const SENSORS: ToMany<Sensor> = ToMany::new("sensor", RelationType::Direct);
    const ELEMENTS: ToMany<Element> = ToMany::new("element", RelationType::Direct);

    /// The label name.
    pub fn name(&self) -> Option<&str> {
        self.attributes().string("name")
    }

    /// Create a label with initial sensor and element membership.
    pub async fn create_with_members(
        session: &Session,
        attributes: Map<String, Value>,
        sensors: &[Sensor],
        elements: &[Element],
    ) -> Result<Self> {
        let mut relationships = Map::new();
        if !sensors.is_empty() {
            let idents = sensors
                .iter()
                .map(Related::ident)
                .collect::<Result<Vec<_>>>()?;
            relationships.insert(
                Self::SENSORS.name().to_string(),
                jsonapi::relationship_many(&idents),
            );
        }
        if !elements.is_empty() {
            let idents = elements
                .iter()
                .map(Related::ident)
                .collect::<Result<Vec<_>>>()?;
            relationships.insert(
                Self::ELEMENTS.name().to_string(),
                jsonapi::relationship_many(&idents),
            );
        }
        let relationships = (!relationships.is_empty()).then_some(relationships);
        Self::create_with(session, Some(attributes), relationships).await
    }

    /// Fetch the sensors in this label.
    pub async fn sensors(&self) -> Result<Vec<Sensor>> {
        Self::SENSORS.fetch(self).await
    }

    /// Resolve the member sensors from the included-resource cache.
    pub fn included_sensors(&self) -> Result<Vec<Sensor>> {
        Self::SENSORS.included(self)
    }

    /// Add sensors to this label. Returns `true` if membership changed.
    pub async fn add_sensors(&self, sensors: &[Sensor]) -> Result<bool> {
        Self::SENSORS.add(self, sensors).await
    }

    /// Remove sensors from this label. Returns `true` if membership
    /// changed.
    pub async fn remove_sensors(&self, sensors: &[Sensor]) -> Result<bool> {
        Self::SENSORS.remove(self, sensors).await
    }

    /// Replace the sensor membership. An empty slice clears it.
    pub async fn update_sensors(&self, sensors: &[Sensor]) -> Result<bool> {
        Self::SENSORS.replace(self, sensors).await
    }

    /// Fetch the elements in this label.
    pub async fn elements(&self) -> Result<Vec<Element>> {
        Self::ELEMENTS.fetch(self).await
    }

    /// Resolve the member elements from the included-resource cache.
    pub fn included_elements(&self) -> Result<Vec<Element>> {
        Self::ELEMENTS.included(self)
    }

    /// Add elements to this label. Returns `true` if membership changed.
    pub async fn add_elements(&self, elements: &[Element]) -> Result<bool> {
        Self::ELEMENTS.add(self, elements).await
    }

    /// Remove elements from this label. Returns `true` if membership
    /// changed.
    pub async fn remove_elements(&self, elements: &[Element]) -> Result<bool> {
        Self::ELEMENTS.remove(self, elements).await
    }

    /// Replace the element membership. An empty slice clears it.
    pub async fn update_elements(&self, elements: &[Element]) -> Result<bool> {
        Self::ELEMENTS.replace(self, elements).await
    }
}

#[async_trait]
impl HasMetadata for Label {}
