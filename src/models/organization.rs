//! The organization resource.

use async_trait::async_trait;

use super::{HasMetadata, User};
use crate::error::Result;
use crate::relations::{RelationType, ToMany};
use crate::resource::{resource_type, Resource, ResourceObject};
use crate::session::Session;
use crate::timeseries::HasTimeseries;

/// The organization owning the authorized API key.
///
/// Addressed as a singleton: fetched without an id, and all derived URLs
/// omit the id segment.
#[derive(Debug, Clone)]
pub struct Organization {
    object: ResourceObject,
}

resource_type!(Organization, kind: "organization");

impl Organization {
    const USERS: ToMany<User> = ToMany::new("user", RelationType::Direct);

    /// Get the organization for the authorized API key.
    pub async fn authorized(session: &Session) -> Result<Self> {
        Self::singleton(session, &[]).await
    }

    /// The organization name.
    pub fn name(&self) -> Option<&str> {
        self.attributes().string("name")
    }

    /// Fetch the users in this organization.
    pub async fn users(&self) -> Result<Vec<User>> {
        Self::USERS.fetch(self).await
    }
}

impl HasTimeseries for Organization {}

#[async_trait]
impl HasMetadata for Organization {}
