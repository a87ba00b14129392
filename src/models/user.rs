//! The user resource.

use crate::error::Result;
use crate::resource::{resource_type, Resource, ResourceObject};
use crate::session::Session;

/// The user owning the authorized API key. Addressed as a singleton.
#[derive(Debug, Clone)]
pub struct User {
    object: ResourceObject,
}

resource_type!(User, kind: "user");

impl User {
    /// Get the user for the authorized API key.
    pub async fn authorized(session: &Session) -> Result<Self> {
        Self::singleton(session, &[]).await
    }

    /// The user's display name.
    pub fn name(&self) -> Option<&str> {
        self.attributes().string("name")
    }

    /// The user's email address.
    pub fn email(&self) -> Option<&str> {
        self.attributes().string("email")
    }
}
