//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Helium API server.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

/// Resource kinds addressed without an id segment.
pub(crate) const SINGLETON_KINDS: &[&str] = &["organization", "user"];

pub(crate) fn is_singleton_kind(kind: &str) -> bool {
    SINGLETON_KINDS.contains(&kind)
}

/// The owner key under which relationship sets, metadata, and timeseries
/// points are stored.
pub(crate) fn owner_key(kind: &str, id: &str) -> String {
    format!("{kind}/{id}")
}

/// A stored resource: the server-side materialization of a JSONAPI node.
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub id: String,
    pub kind: String,
    pub attributes: Map<String, Value>,
    pub meta: Map<String, Value>,
}

impl StoredResource {
    /// Create a resource with `created`/`updated` meta set to now.
    pub fn new(kind: &str, id: &str, attributes: Map<String, Value>) -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut meta = Map::new();
        meta.insert("created".to_string(), Value::String(now.clone()));
        meta.insert("updated".to_string(), Value::String(now));
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            attributes,
            meta,
        }
    }
}

/// An `{id, type}` reference stored in a relationship set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub id: String,
    pub kind: String,
}

impl Ref {
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
        }
    }

    pub(crate) fn render(&self) -> Value {
        json!({ "id": self.id, "type": self.kind })
    }
}

/// A stored timeseries reading.
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub port: String,
    pub value: Value,
    /// ISO8601 timestamp.
    pub timestamp: String,
}

impl StoredPoint {
    pub(crate) fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub(crate) fn render(&self) -> Value {
        json!({
            "id": self.id,
            "type": "data-point",
            "attributes": {
                "port": self.port,
                "value": self.value,
                "timestamp": self.timestamp,
            },
            "meta": {},
        })
    }
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug, Default)]
pub struct MockState {
    /// Resources indexed by kind.
    pub resources: HashMap<String, Vec<StoredResource>>,

    /// Relationship sets, indexed by owner key (`<kind>/<id>`) and
    /// relationship name.
    pub relationships: HashMap<String, HashMap<String, Vec<Ref>>>,

    /// Metadata objects indexed by owner key.
    pub metadata: HashMap<String, Map<String, Value>>,

    /// Timeseries readings indexed by owner key, kept ascending by
    /// timestamp.
    pub points: HashMap<String, Vec<StoredPoint>>,

    next_id: u64,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a resource to the state.
    pub fn with_resource(mut self, resource: StoredResource) -> Self {
        self.insert(resource);
        self
    }

    /// Set a relationship set on an owner.
    pub fn with_link(mut self, kind: &str, id: &str, rel: &str, refs: Vec<Ref>) -> Self {
        self.set_refs(kind, id, rel, refs);
        self
    }

    /// Set the metadata object of an owner.
    pub fn with_metadata(mut self, kind: &str, id: &str, map: Map<String, Value>) -> Self {
        self.metadata.insert(owner_key(kind, id), map);
        self
    }

    /// Add a timeseries reading to an owner.
    pub fn with_point(mut self, kind: &str, id: &str, point: StoredPoint) -> Self {
        self.add_point(kind, id, point);
        self
    }

    /// Generate a fresh resource id.
    pub fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-4000-8000-{:012x}", self.next_id)
    }

    /// Insert (or replace, by id) a resource.
    pub fn insert(&mut self, resource: StoredResource) {
        let entries = self.resources.entry(resource.kind.clone()).or_default();
        if let Some(existing) = entries.iter_mut().find(|r| r.id == resource.id) {
            *existing = resource;
        } else {
            entries.push(resource);
        }
    }

    /// Get a resource by kind and id.
    pub fn get(&self, kind: &str, id: &str) -> Option<&StoredResource> {
        self.resources.get(kind)?.iter().find(|r| r.id == id)
    }

    /// Get a mutable resource by kind and id.
    pub fn get_mut(&mut self, kind: &str, id: &str) -> Option<&mut StoredResource> {
        self.resources.get_mut(kind)?.iter_mut().find(|r| r.id == id)
    }

    /// Get the lone resource of a singleton kind.
    pub fn singleton(&self, kind: &str) -> Option<&StoredResource> {
        self.resources.get(kind)?.first()
    }

    /// List the resources of a kind.
    pub fn list(&self, kind: &str) -> &[StoredResource] {
        self.resources.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove a resource plus everything keyed off it, including
    /// references to it in other owners' relationship sets.
    pub fn remove(&mut self, kind: &str, id: &str) -> bool {
        let Some(entries) = self.resources.get_mut(kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|r| r.id != id);
        if entries.len() == before {
            return false;
        }

        let key = owner_key(kind, id);
        self.relationships.remove(&key);
        self.metadata.remove(&key);
        self.points.remove(&key);
        for rels in self.relationships.values_mut() {
            for refs in rels.values_mut() {
                refs.retain(|r| !(r.kind == kind && r.id == id));
            }
        }
        true
    }

    /// The relationship set of an owner, empty when never set.
    pub fn refs(&self, kind: &str, id: &str, rel: &str) -> Vec<Ref> {
        self.relationships
            .get(&owner_key(kind, id))
            .and_then(|rels| rels.get(rel))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the relationship set of an owner.
    pub fn set_refs(&mut self, kind: &str, id: &str, rel: &str, refs: Vec<Ref>) {
        self.relationships
            .entry(owner_key(kind, id))
            .or_default()
            .insert(rel.to_string(), refs);
    }

    /// The metadata object of an owner, empty when never set.
    pub fn metadata_for(&self, kind: &str, id: &str) -> Map<String, Value> {
        self.metadata
            .get(&owner_key(kind, id))
            .cloned()
            .unwrap_or_default()
    }

    /// Add a reading to an owner's timeseries, keeping ascending order.
    pub fn add_point(&mut self, kind: &str, id: &str, point: StoredPoint) {
        let points = self.points.entry(owner_key(kind, id)).or_default();
        points.push(point);
        points.sort_by_key(|p| p.parsed_timestamp());
    }

    /// The readings of an owner, ascending by timestamp.
    pub fn points_for(&self, kind: &str, id: &str) -> Vec<StoredPoint> {
        self.points
            .get(&owner_key(kind, id))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: &str, name: &str) -> StoredResource {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), Value::String(name.to_string()));
        StoredResource::new("sensor", id, attributes)
    }

    #[test]
    fn test_state_insert_and_get() {
        let state = MockState::new().with_resource(sensor("s1", "office"));
        assert_eq!(
            state.get("sensor", "s1").unwrap().attributes["name"],
            "office"
        );
        assert!(state.get("sensor", "missing").is_none());
    }

    #[test]
    fn test_remove_prunes_references() {
        let mut state = MockState::new()
            .with_resource(sensor("s1", "office"))
            .with_link("label", "l1", "sensor", vec![Ref::new("sensor", "s1")]);

        assert!(state.remove("sensor", "s1"));
        assert!(state.refs("label", "l1", "sensor").is_empty());
        assert!(!state.remove("sensor", "s1"));
    }

    #[test]
    fn test_points_kept_ascending() {
        let mut state = MockState::new();
        state.add_point(
            "sensor",
            "s1",
            StoredPoint {
                id: "p2".to_string(),
                port: "t".to_string(),
                value: Value::from(24),
                timestamp: "2016-09-02T00:00:00.000Z".to_string(),
            },
        );
        state.add_point(
            "sensor",
            "s1",
            StoredPoint {
                id: "p1".to_string(),
                port: "t".to_string(),
                value: Value::from(22),
                timestamp: "2016-09-01T00:00:00.000Z".to_string(),
            },
        );

        let points = state.points_for("sensor", "s1");
        assert_eq!(points[0].id, "p1");
        assert_eq!(points[1].id, "p2");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut state = MockState::new();
        let a = state.generate_id();
        let b = state.generate_id();
        assert_ne!(a, b);
    }
}
