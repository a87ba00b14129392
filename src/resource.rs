//! Base resource behavior.
//!
//! The Helium API uses JSONAPI extensively. This module provides the
//! abstractions shared by every resource type: the typed attribute store,
//! the `meta` sub-object, the per-instance [`ResourceObject`] state, and
//! the [`Resource`] trait that turns a minimal per-type declaration (a
//! `KIND`, optionally a `PATH`, and a wrap/unwrap pair) into full CRUD
//! behavior with include-resolution.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::jsonapi::{self, Document, PrimaryData, Relationship, ResourceData, ResourceIdentifier};
use crate::session::{expect_document, expect_status, Session};

/// Parse an ISO8601 timestamp into a UTC time value.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// The domain attributes of a resource.
///
/// An explicit key-value store over the JSONAPI `attributes` object, with
/// typed accessors that coerce lazily on each call. Lookups tolerate the
/// hyphen/underscore split between wire keys and code: the exact key is
/// tried first, then the underscore form with hyphens substituted.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    map: Map<String, Value>,
}

impl Attributes {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Look up a raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.map.get(key) {
            return Some(value);
        }
        if key.contains('_') {
            return self.map.get(&key.replace('_', "-"));
        }
        None
    }

    /// Look up an attribute, failing with [`Error::NoAttribute`] on a miss.
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::NoAttribute(key.to_string()))
    }

    /// Look up a string attribute.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Look up an integer attribute.
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Look up a float attribute.
    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Look up a boolean attribute.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Look up and parse an ISO8601 timestamp attribute.
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.string(key).and_then(parse_timestamp)
    }

    /// The raw attribute map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }
}

/// The `meta` sub-object of a resource.
///
/// Carries the `created`/`updated` timestamps plus any resource-specific
/// extras (e.g. `loaded` on device configurations).
#[derive(Debug, Clone, Default)]
pub struct Meta {
    map: Map<String, Value>,
}

impl Meta {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// When the resource was created.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.map
            .get("created")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }

    /// When the resource was last updated.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.map
            .get("updated")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }

    /// Look up a resource-specific meta field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Look up a boolean meta field.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

/// The shared per-instance state of a materialized resource.
///
/// Holds the decomposed JSONAPI `data` object (id, type tag, attributes,
/// meta, relationship linkage), the included-resource cache built when the
/// fetch requested an `include` set, the singleton flag, and the session
/// the resource was fetched through. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ResourceObject {
    id: Option<String>,
    kind: Option<String>,
    attributes: Attributes,
    meta: Meta,
    relationships: HashMap<String, Relationship>,
    included: HashMap<String, Vec<ResourceData>>,
    singleton: bool,
    session: Session,
}

impl ResourceObject {
    /// Decompose a JSONAPI `data` object into a resource instance.
    ///
    /// When `include` names relationship keys, the compound document's
    /// `included` entries are partitioned by declared linkage: for each
    /// requested key the identifiers under `relationships[<key>].data` are
    /// collected and the entries matching both type and id-membership are
    /// cached under that key. A requested key with no matches caches an
    /// empty list, which is distinct from the key never being requested.
    pub(crate) fn from_data(
        data: ResourceData,
        included: &[ResourceData],
        include: &[&str],
        session: Session,
        singleton: bool,
    ) -> Self {
        let mut cache = HashMap::new();
        for &key in include {
            let linkage = data
                .relationships
                .get(key)
                .or_else(|| data.relationships.get(&format!("{key}s")));
            let idents: HashSet<ResourceIdentifier> = linkage
                .map(|r| r.data.idents().into_iter().collect())
                .unwrap_or_default();
            let entries: Vec<ResourceData> = included
                .iter()
                .filter(|entry| entry.ident().map(|i| idents.contains(&i)).unwrap_or(false))
                .cloned()
                .collect();
            cache.insert(key.to_string(), entries);
        }

        Self {
            id: data.id,
            kind: data.kind,
            attributes: Attributes::new(data.attributes),
            meta: Meta::new(data.meta),
            relationships: data.relationships,
            included: cache,
            singleton,
            session,
        }
    }

    /// Materialize a related resource node (no include processing).
    pub(crate) fn from_related(data: ResourceData, session: Session) -> Self {
        Self::from_data(data, &[], &[], session, false)
    }

    /// The resource id, absent until persisted.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The resource id, or [`Error::MissingId`] when absent.
    pub fn require_id(&self) -> Result<&str> {
        self.id.as_deref().ok_or(Error::MissingId)
    }

    /// The resource type tag as seen on the wire.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// The domain attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The `meta` sub-object.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// The declared relationship linkage.
    pub fn relationships(&self) -> &HashMap<String, Relationship> {
        &self.relationships
    }

    /// The session this resource was fetched through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether this instance was fetched as a singleton (addressed without
    /// an id). Singleton resources omit the id segment in derived URLs.
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// The cached included entries for a relationship key, or `None` if
    /// that key was not part of the fetch's `include` set.
    pub(crate) fn included(&self, key: &str) -> Option<&[ResourceData]> {
        self.included.get(key).map(Vec::as_slice)
    }

    /// The `{id, type}` pair for relationship bodies.
    pub(crate) fn ident(&self, default_kind: &str) -> Result<ResourceIdentifier> {
        Ok(ResourceIdentifier {
            id: self.require_id()?.to_string(),
            kind: self
                .kind
                .clone()
                .unwrap_or_else(|| default_kind.to_string()),
        })
    }
}

// Identity is the id alone. An instance without an id compares unequal to
// everything, itself included; such instances only exist transiently.
impl PartialEq for ResourceObject {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for ResourceObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The base trait for all Helium resources.
///
/// A concrete resource type declares its `KIND` (the wire type tag), a
/// `PATH` when its URL segment differs from the kind, and the wrap/unwrap
/// pair around [`ResourceObject`]. Every CRUD operation is provided.
#[async_trait]
pub trait Resource: Sized + Send + Sync {
    /// The resource type tag, e.g. `"sensor"`.
    const KIND: &'static str;

    /// The URL path segment, defaulting to the kind.
    const PATH: &'static str = Self::KIND;

    /// Wrap a materialized resource object.
    fn from_object(object: ResourceObject) -> Self;

    /// The underlying resource object.
    fn object(&self) -> &ResourceObject;

    /// The resource id, absent until persisted.
    fn id(&self) -> Option<&str> {
        self.object().id()
    }

    /// The first segment of the resource UUID.
    fn short_id(&self) -> Option<&str> {
        self.id().map(|id| id.split('-').next().unwrap_or(id))
    }

    /// The domain attributes.
    fn attributes(&self) -> &Attributes {
        self.object().attributes()
    }

    /// The `meta` sub-object.
    fn meta(&self) -> &Meta {
        self.object().meta()
    }

    /// The session this resource was fetched through.
    fn session(&self) -> &Session {
        self.object().session()
    }

    /// Whether this instance is a singleton.
    fn is_singleton(&self) -> bool {
        self.object().is_singleton()
    }

    /// Retrieve a single resource by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no resource exists with the id.
    async fn find(session: &Session, id: &str, include: &[&str]) -> Result<Self> {
        let url = session.build_url(&[Self::PATH, id])?;
        let response = session.get(url, &jsonapi::include_query(include)).await?;
        let doc = expect_document(&response, 200)?;
        Self::one_from(session, doc, include, false)
    }

    /// Get all resources of this type.
    async fn all(session: &Session, include: &[&str]) -> Result<Vec<Self>> {
        let url = session.build_url(&[Self::PATH])?;
        let response = session.get(url, &jsonapi::include_query(include)).await?;
        let doc = expect_document(&response, 200)?;
        Self::many_from(session, doc, include)
    }

    /// Get all resources of this type matching a server-side metadata
    /// filter (an opaque JSON object passed as `filter[metadata]`).
    async fn where_metadata(
        session: &Session,
        filter: &Value,
        include: &[&str],
    ) -> Result<Vec<Self>> {
        let url = session.build_url(&[Self::PATH])?;
        let mut query = jsonapi::metadata_filter_query(filter);
        query.extend(jsonapi::include_query(include));
        let response = session.get(url, &query).await?;
        let doc = expect_document(&response, 200)?;
        Self::many_from(session, doc, include)
    }

    /// Create a resource with the given attributes. The server assigns the
    /// id.
    async fn create(session: &Session, attributes: Map<String, Value>) -> Result<Self> {
        Self::create_with(session, Some(attributes), None).await
    }

    /// Create a resource with attributes and creation-time relationships.
    ///
    /// `relationships` maps relationship names to relationship bodies as
    /// built by [`jsonapi::relationship_one`] / [`jsonapi::relationship_many`].
    async fn create_with(
        session: &Session,
        attributes: Option<Map<String, Value>>,
        relationships: Option<Map<String, Value>>,
    ) -> Result<Self> {
        let url = session.build_url(&[Self::PATH])?;
        let body = jsonapi::resource_body(Self::KIND, None, attributes, relationships);
        let response = session.post(url, Some(body)).await?;
        let doc = expect_document(&response, 201)?;
        Self::one_from(session, doc, &[], false)
    }

    /// Get the resource addressed without an id (e.g. "the organization
    /// for this API key"). The returned instance is marked singleton so
    /// that derived URLs omit the id segment.
    async fn singleton(session: &Session, include: &[&str]) -> Result<Self> {
        let url = session.build_url(&[Self::PATH])?;
        let response = session.get(url, &jsonapi::include_query(include)).await?;
        let doc = expect_document(&response, 200)?;
        Self::one_from(session, doc, include, true)
    }

    /// Update attributes of this resource.
    ///
    /// Not all attributes can be updated; the server rejects updates it
    /// does not allow. Returns a new instance with the server-confirmed
    /// state, leaving this one untouched.
    async fn update(&self, attributes: Map<String, Value>) -> Result<Self> {
        let object = self.object();
        let session = object.session();
        let mut segments = vec![Self::PATH];
        if !object.is_singleton() {
            segments.push(object.require_id()?);
        }
        let url = session.build_url(&segments)?;
        let body = jsonapi::resource_body(Self::KIND, object.id(), Some(attributes), None);
        let response = session.patch(url, Some(body)).await?;
        let doc = expect_document(&response, 200)?;
        Self::one_from(session, doc, &[], object.is_singleton())
    }

    /// Delete the resource. Success is a 204 response; anything else is a
    /// classified error. The instance itself is left as-is.
    async fn delete(&self) -> Result<()> {
        let object = self.object();
        let url = object
            .session()
            .build_url(&[Self::PATH, object.require_id()?])?;
        let response = object.session().delete(url).await?;
        expect_status(&response, 204, None)?;
        Ok(())
    }

    /// Materialize the single primary resource of a document.
    fn one_from(
        session: &Session,
        doc: Document,
        include: &[&str],
        singleton: bool,
    ) -> Result<Self> {
        let Document { data, included, .. } = doc;
        match data {
            Some(PrimaryData::One(data)) => Ok(Self::from_object(ResourceObject::from_data(
                data,
                &included,
                include,
                session.clone(),
                singleton,
            ))),
            _ => Err(Error::NoData),
        }
    }

    /// Materialize the resource collection of a document.
    fn many_from(session: &Session, doc: Document, include: &[&str]) -> Result<Vec<Self>> {
        let Document { data, included, .. } = doc;
        match data {
            Some(PrimaryData::Many(items)) => Ok(items
                .into_iter()
                .map(|data| {
                    Self::from_object(ResourceObject::from_data(
                        data,
                        &included,
                        include,
                        session.clone(),
                        false,
                    ))
                })
                .collect()),
            Some(PrimaryData::One(data)) => Ok(vec![Self::from_object(
                ResourceObject::from_data(data, &included, include, session.clone(), false),
            )]),
            None => Ok(vec![]),
        }
    }
}

/// Anything constructible from a JSONAPI resource node.
///
/// Implemented by every [`Resource`] and by polymorphic targets such as
/// `Device`, which dispatch on the `type` discriminator to pick a concrete
/// constructor.
pub trait Related: Sized + Send + Sync {
    /// Whether this target accepts the given wire type tag.
    fn accepts(kind: &str) -> bool;

    /// Construct from a resource node.
    fn related_from(data: ResourceData, session: &Session) -> Result<Self>;

    /// The `{id, type}` pair for relationship bodies.
    fn ident(&self) -> Result<ResourceIdentifier>;
}

/// Declare a concrete resource type.
///
/// Expands to the [`Resource`] and [`Related`] implementations plus the
/// id-based identity (`PartialEq`/`Hash`) for a struct with an `object:
/// ResourceObject` field:
///
/// ```ignore
/// pub struct Sensor { object: ResourceObject }
/// resource_type!(Sensor, kind: "sensor");
/// resource_type!(DataPoint, kind: "data-point", path: "timeseries");
/// ```
macro_rules! resource_type {
    ($name:ident, kind: $kind:literal) => {
        resource_type!($name, kind: $kind, path: $kind);
    };
    ($name:ident, kind: $kind:literal, path: $path:literal) => {
        #[async_trait::async_trait]
        impl $crate::resource::Resource for $name {
            const KIND: &'static str = $kind;
            const PATH: &'static str = $path;

            fn from_object(object: $crate::resource::ResourceObject) -> Self {
                Self { object }
            }

            fn object(&self) -> &$crate::resource::ResourceObject {
                &self.object
            }
        }

        impl $crate::resource::Related for $name {
            fn accepts(kind: &str) -> bool {
                kind == $kind
            }

            fn related_from(
                data: $crate::jsonapi::ResourceData,
                session: &$crate::session::Session,
            ) -> $crate::error::Result<Self> {
                Ok(<Self as $crate::resource::Resource>::from_object(
                    $crate::resource::ResourceObject::from_related(data, session.clone()),
                ))
            }

            fn ident(&self) -> $crate::error::Result<$crate::jsonapi::ResourceIdentifier> {
                self.object.ident($kind)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.object == other.object
            }
        }

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.object.hash(state)
            }
        }
    };
}

pub(crate) use resource_type;
