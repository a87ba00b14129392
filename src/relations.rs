//! Relationships between resources.
//!
//! The Helium API does not require an include directive to also mean a
//! full URL relationship: some relationships are fetched through a
//! dedicated sub-resource URL, others through an `include` query parameter
//! on the owning resource. For example:
//!
//! ```text
//! https://api.helium.com/v1/label/<id>/sensor
//! https://api.helium.com/v1/label/<id>?include=sensor
//! ```
//!
//! A resource type declares its relationships as [`ToOne`]/[`ToMany`]
//! descriptors (typically associated consts) and exposes accessor methods
//! that delegate to them. Writability is opted into per relationship by
//! exposing the mutation wrappers; reverse navigation is the mirrored
//! descriptor declared on the target type.

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::jsonapi::{self, PrimaryData, ResourceIdentifier};
use crate::resource::{Related, Resource};
use crate::session::{expect_document, expect_status};
use url::Url;

/// How a relationship is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// A dedicated sub-resource URL (`<source>/<id>/<name>`).
    Direct,
    /// The `include` query parameter on the owning resource's URL.
    Include,
}

/// Build a URL rooted at the source resource, omitting the id segment for
/// singletons.
fn source_url<S: Resource>(source: &S, extra: &[&str]) -> Result<Url> {
    let object = source.object();
    let mut segments = vec![S::PATH];
    if !object.is_singleton() {
        segments.push(object.require_id()?);
    }
    segments.extend_from_slice(extra);
    object.session().build_url(&segments)
}

/// A to-one relationship descriptor.
///
/// `name` is the relationship's wire name (the target's resource type,
/// hyphens included), used for the sub-resource URL segment, the `include`
/// key, and the relationships endpoint.
#[derive(Debug)]
pub struct ToOne<T> {
    name: &'static str,
    strategy: RelationType,
    _target: PhantomData<fn() -> T>,
}

impl<T: Related> ToOne<T> {
    /// Declare a to-one relationship.
    pub const fn new(name: &'static str, strategy: RelationType) -> Self {
        Self {
            name,
            strategy,
            _target: PhantomData,
        }
    }

    /// The relationship's wire name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch the related resource, `None` when nothing is linked.
    pub async fn fetch<S: Resource>(&self, source: &S) -> Result<Option<T>> {
        let session = source.object().session().clone();
        match self.strategy {
            RelationType::Direct => {
                let url = source_url(source, &[self.name])?;
                let response = session.get(url, &[]).await?;
                let doc = expect_document(&response, 200)?;
                match doc.data {
                    Some(PrimaryData::One(data)) => Ok(Some(T::related_from(data, &session)?)),
                    Some(PrimaryData::Many(items)) => items
                        .into_iter()
                        .next()
                        .map(|data| T::related_from(data, &session))
                        .transpose(),
                    None => Ok(None),
                }
            }
            RelationType::Include => {
                let url = source_url(source, &[])?;
                let query = jsonapi::include_query(&[self.name]);
                let response = session.get(url, &query).await?;
                let doc = expect_document(&response, 200)?;
                doc.included
                    .into_iter()
                    .find(|entry| entry.kind.as_deref().map(T::accepts).unwrap_or(false))
                    .map(|data| T::related_from(data, &session))
                    .transpose()
            }
        }
    }

    /// Resolve the related resource from the owner's included-resource
    /// cache, without a network call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotIncluded`] when the owning fetch did not request
    /// this relationship in its `include` set.
    pub fn included<S: Resource>(&self, source: &S) -> Result<Option<T>> {
        let object = source.object();
        let entries = object
            .included(self.name)
            .ok_or(Error::NotIncluded(self.name))?;
        entries
            .first()
            .map(|data| T::related_from(data.clone(), object.session()))
            .transpose()
    }

    /// Set (or clear, with `None`) the related resource.
    ///
    /// Returns `true` if the relationship changed, `false` if the server
    /// accepted the request without a change (204).
    pub async fn set<S: Resource>(&self, source: &S, target: Option<&T>) -> Result<bool> {
        let url = source_url(source, &["relationships", self.name])?;
        let ident = target.map(Related::ident).transpose()?;
        let body = jsonapi::relationship_one(ident);
        let session = source.object().session();
        let response = session.patch(url, Some(body)).await?;
        expect_status(&response, 200, Some(204))
    }
}

/// A to-many relationship descriptor. See [`ToOne`] for naming rules.
#[derive(Debug)]
pub struct ToMany<T> {
    name: &'static str,
    strategy: RelationType,
    _target: PhantomData<fn() -> T>,
}

impl<T: Related> ToMany<T> {
    /// Declare a to-many relationship.
    pub const fn new(name: &'static str, strategy: RelationType) -> Self {
        Self {
            name,
            strategy,
            _target: PhantomData,
        }
    }

    /// The relationship's wire name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch the related resources. No linked resources is an empty
    /// collection, never an error.
    pub async fn fetch<S: Resource>(&self, source: &S) -> Result<Vec<T>> {
        let session = source.object().session().clone();
        match self.strategy {
            RelationType::Direct => {
                let url = source_url(source, &[self.name])?;
                let response = session.get(url, &[]).await?;
                let doc = expect_document(&response, 200)?;
                match doc.data {
                    Some(PrimaryData::Many(items)) => items
                        .into_iter()
                        .map(|data| T::related_from(data, &session))
                        .collect(),
                    Some(PrimaryData::One(data)) => Ok(vec![T::related_from(data, &session)?]),
                    None => Ok(vec![]),
                }
            }
            RelationType::Include => {
                let url = source_url(source, &[])?;
                let query = jsonapi::include_query(&[self.name]);
                let response = session.get(url, &query).await?;
                let doc = expect_document(&response, 200)?;
                doc.included
                    .into_iter()
                    .filter(|entry| entry.kind.as_deref().map(T::accepts).unwrap_or(false))
                    .map(|data| T::related_from(data, &session))
                    .collect()
            }
        }
    }

    /// Resolve the related resources from the owner's included-resource
    /// cache, without a network call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotIncluded`] when the owning fetch did not request
    /// this relationship in its `include` set.
    pub fn included<S: Resource>(&self, source: &S) -> Result<Vec<T>> {
        let object = source.object();
        let entries = object
            .included(self.name)
            .ok_or(Error::NotIncluded(self.name))?;
        entries
            .iter()
            .map(|data| T::related_from(data.clone(), object.session()))
            .collect()
    }

    /// Fetch the raw identifier list from the relationships sub-resource.
    pub async fn refs<S: Resource>(&self, source: &S) -> Result<Vec<ResourceIdentifier>> {
        let url = source_url(source, &["relationships", self.name])?;
        let session = source.object().session();
        let response = session.get(url, &[]).await?;
        let doc = expect_document(&response, 200)?;
        Ok(match doc.data {
            Some(PrimaryData::Many(items)) => items.iter().filter_map(|d| d.ident()).collect(),
            Some(PrimaryData::One(data)) => data.ident().into_iter().collect(),
            None => vec![],
        })
    }

    /// Add resources to the relationship.
    ///
    /// Fetches the existing identifier set, unions in the given resources
    /// (deduplicated by id, existing members first in their original
    /// order), and writes the merged set back.
    ///
    /// Returns `true` if the relationship changed, `false` on a 204.
    pub async fn add<S: Resource>(&self, source: &S, items: &[T]) -> Result<bool> {
        let mut idents = self.refs(source).await?;
        for item in items {
            let ident = item.ident()?;
            if !idents.iter().any(|existing| existing.id == ident.id) {
                idents.push(ident);
            }
        }
        self.write_refs(source, &idents).await
    }

    /// Remove resources from the relationship.
    ///
    /// Fetches the existing identifier set, subtracts the given resources
    /// by id, and writes the remainder back.
    ///
    /// Returns `true` if the relationship changed, `false` on a 204.
    pub async fn remove<S: Resource>(&self, source: &S, items: &[T]) -> Result<bool> {
        let removed: Vec<ResourceIdentifier> =
            items.iter().map(Related::ident).collect::<Result<_>>()?;
        let idents: Vec<ResourceIdentifier> = self
            .refs(source)
            .await?
            .into_iter()
            .filter(|existing| !removed.iter().any(|r| r.id == existing.id))
            .collect();
        self.write_refs(source, &idents).await
    }

    /// Replace the relationship with exactly the given resources, without
    /// a read-before-write. An empty slice clears it.
    ///
    /// Returns `true` if the relationship changed, `false` on a 204.
    pub async fn replace<S: Resource>(&self, source: &S, items: &[T]) -> Result<bool> {
        let idents: Vec<ResourceIdentifier> =
            items.iter().map(Related::ident).collect::<Result<_>>()?;
        self.write_refs(source, &idents).await
    }

    async fn write_refs<S: Resource>(
        &self,
        source: &S,
        idents: &[ResourceIdentifier],
    ) -> Result<bool> {
        let url = source_url(source, &["relationships", self.name])?;
        let body = jsonapi::relationship_many(idents);
        let session = source.object().session();
        let response = session.patch(url, Some(body)).await?;
        expect_status(&response, 200, Some(204))
    }
}
