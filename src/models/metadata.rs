//! The metadata resource.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::jsonapi::{self, PrimaryData};
use crate::resource::{Attributes, Resource, ResourceObject};
use crate::session::{expect_document, Session};

/// Arbitrary JSON attached 1:1 to an owning resource.
///
/// Updating the metadata merges the given attributes into the existing
/// object; replacing it swaps the entire object for the given value. Both
/// return the server-confirmed state as a new instance.
#[derive(Debug, Clone)]
pub struct Metadata {
    object: ResourceObject,
    target_path: &'static str,
}

impl Metadata {
    pub(crate) fn new(object: ResourceObject, target_path: &'static str) -> Self {
        Self {
            object,
            target_path,
        }
    }

    /// The owning resource's id.
    pub fn id(&self) -> Option<&str> {
        self.object.id()
    }

    /// The stored JSON attributes.
    pub fn attributes(&self) -> &Attributes {
        self.object.attributes()
    }

    async fn publish(&self, replace: bool, attributes: Map<String, Value>) -> Result<Metadata> {
        let session = self.object.session();
        let singleton = self.object.is_singleton();

        let mut segments = vec![self.target_path];
        if !singleton {
            segments.push(self.object.require_id()?);
        }
        segments.push("metadata");
        let url = session.build_url(&segments)?;

        let id = if singleton { None } else { self.object.id() };
        let body = jsonapi::resource_body("metadata", id, Some(attributes), None);
        let response = if replace {
            session.put(url, Some(body)).await?
        } else {
            session.patch(url, Some(body)).await?
        };
        let doc = expect_document(&response, 200)?;
        match doc.data {
            Some(PrimaryData::One(data)) => Ok(Metadata::new(
                ResourceObject::from_data(data, &[], &[], session.clone(), singleton),
                self.target_path,
            )),
            _ => Err(Error::NoData),
        }
    }

    /// Merge the given attributes into the metadata. Existing keys not
    /// named are left in place.
    pub async fn update(&self, attributes: Map<String, Value>) -> Result<Metadata> {
        self.publish(false, attributes).await
    }

    /// Replace the metadata wholesale with the given attributes.
    pub async fn replace(&self, attributes: Map<String, Value>) -> Result<Metadata> {
        self.publish(true, attributes).await
    }
}

/// Metadata capability for a resource type.
#[async_trait]
pub trait HasMetadata: Resource {
    /// Fetch the metadata attached to this resource. Singleton owners
    /// propagate their singleton addressing to the metadata.
    async fn metadata(&self) -> Result<Metadata> {
        let object = self.object();
        let session = object.session();

        let mut segments = vec![Self::PATH];
        if !object.is_singleton() {
            segments.push(object.require_id()?);
        }
        segments.push("metadata");
        let url = session.build_url(&segments)?;

        let response = session.get(url, &[]).await?;
        let doc = expect_document(&response, 200)?;
        match doc.data {
            Some(PrimaryData::One(data)) => Ok(Metadata::new(
                ResourceObject::from_data(data, &[], &[], session.clone(), object.is_singleton()),
                Self::PATH,
            )),
            _ => Err(Error::NoData),
        }
    }
}
