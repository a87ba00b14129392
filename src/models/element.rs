//! The element resource.

use async_trait::async_trait;

use super::{Configurable, HasMetadata, Label, Sensor};
use crate::error::Result;
use crate::relations::{RelationType, ToMany};
use crate::resource::{resource_type, Resource, ResourceObject};

/// An element: the gateway device sensors communicate through.
#[derive(Debug, Clone)]
pub struct Element {
    object: ResourceObject,
}

resource_type!(Element, kind: "element");

impl Element {
    const SENSORS: ToMany<Sensor> = ToMany::new("sensor", RelationType::Direct);
    const LABELS: ToMany<Label> = ToMany::new("label", RelationType::Include);

    /// The element name.
    pub fn name(&self) -> Option<&str> {
        self.attributes().string("name")
    }

    /// Fetch the sensors connected through this element.
    pub async fn sensors(&self) -> Result<Vec<Sensor>> {
        Self::SENSORS.fetch(self).await
    }

    /// Resolve the connected sensors from the included-resource cache.
    pub fn included_sensors(&self) -> Result<Vec<Sensor>> {
        Self::SENSORS.included(self)
    }

    /// Fetch the labels this element belongs to.
    pub async fn labels(&self) -> Result<Vec<Label>> {
        Self::LABELS.fetch(self).await
    }

    /// Resolve the labels from the included-resource cache.
    pub fn included_labels(&self) -> Result<Vec<Label>> {
        Self::LABELS.included(self)
    }
}

#[async_trait]
impl HasMetadata for Element {}

#[async_trait]
impl Configurable for Element {}
