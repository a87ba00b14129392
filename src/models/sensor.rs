//! The sensor resource.

use async_trait::async_trait;

use super::{Configurable, HasMetadata, Label};
use crate::error::Result;
use crate::relations::{RelationType, ToMany};
use crate::resource::{resource_type, Resource, ResourceObject};
use crate::timeseries::HasTimeseries;

/// A physical or virtual sensor.
///
/// Sensors post readings to their timeseries and can be grouped by
/// labels. Label membership is navigated through the `include` mechanism;
/// the owning side of that relationship lives on [`Label`].
#[derive(Debug, Clone)]
pub struct Sensor {
    object: ResourceObject,
}

resource_type!(Sensor, kind: "sensor");

impl Sensor {
    const LABELS: ToMany<Label> = ToMany::new("label", RelationType::Include);

    /// The sensor name.
    pub fn name(&self) -> Option<&str> {
        self.attributes().string("name")
    }

    /// The hardware MAC address, absent on virtual sensors.
    pub fn mac(&self) -> Option<&str> {
        self.attributes().string("mac")
    }

    /// Fetch the labels this sensor belongs to.
    pub async fn labels(&self) -> Result<Vec<Label>> {
        Self::LABELS.fetch(self).await
    }

    /// Resolve the labels from the included-resource cache of the fetch
    /// that produced this sensor.
    pub fn included_labels(&self) -> Result<Vec<Label>> {
        Self::LABELS.included(self)
    }
}

impl HasTimeseries for Sensor {}

#[async_trait]
impl HasMetadata for Sensor {}

#[async_trait]
impl Configurable for Sensor {}
