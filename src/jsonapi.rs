//! JSONAPI wire format: documents, resource objects and request builders.
//!
//! The Helium API is JSONAPI-flavored. Responses are compound documents
//! carrying a primary `data` object (or array), an optional `included`
//! array of related resources, and pagination `links`. Request bodies for
//! create/update and relationship mutation follow the same conventions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A raw JSONAPI resource object as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceData {
    /// Opaque identifier, absent on resources that are not yet persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The resource type discriminator.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Domain attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,

    /// Resource metadata (created/updated timestamps and extras).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,

    /// Declared relationship linkage, keyed by relationship name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub relationships: HashMap<String, Relationship>,
}

impl ResourceData {
    /// The `{id, type}` identifier pair, if both are present.
    pub fn ident(&self) -> Option<ResourceIdentifier> {
        match (&self.id, &self.kind) {
            (Some(id), Some(kind)) => Some(ResourceIdentifier {
                id: id.clone(),
                kind: kind.clone(),
            }),
            _ => None,
        }
    }
}

/// A single relationship entry under a resource's `relationships` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// The linkage data: a single identifier, an array of them, or null.
    pub data: RelationshipData,
}

/// Linkage data of a relationship, covering to-one and to-many shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-one linkage (`null` or a single identifier).
    One(Option<ResourceIdentifier>),
    /// To-many linkage (an array of identifiers).
    Many(Vec<ResourceIdentifier>),
}

impl RelationshipData {
    /// Flatten the linkage into a list of identifiers.
    pub fn idents(&self) -> Vec<ResourceIdentifier> {
        match self {
            RelationshipData::One(Some(ident)) => vec![ident.clone()],
            RelationshipData::One(None) => vec![],
            RelationshipData::Many(idents) => idents.clone(),
        }
    }
}

/// An `{id, type}` pair identifying a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// The resource id.
    pub id: String,
    /// The resource type.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A JSONAPI compound document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    /// The primary data, absent on bodiless responses.
    #[serde(default)]
    pub data: Option<PrimaryData>,

    /// Related resources returned alongside the primary data.
    #[serde(default)]
    pub included: Vec<ResourceData>,

    /// Pagination links.
    #[serde(default)]
    pub links: Links,
}

/// The primary `data` of a document: a single resource or a collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A collection of resource objects.
    ///
    /// Tried first so that an empty array parses as an empty collection
    /// rather than positionally matching `One`'s all-default fields.
    Many(Vec<ResourceData>),
    /// A single resource object.
    One(ResourceData),
}

/// Pagination links of a document. Absent or null links are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    /// Continuation toward older entries.
    #[serde(default)]
    pub prev: Option<String>,
    /// Continuation toward newer entries.
    #[serde(default)]
    pub next: Option<String>,
}

/// Build a create/update request body.
///
/// Produces `{"data": {"type", "id"?, "attributes"?, "relationships"?}}`.
pub fn resource_body(
    kind: &str,
    id: Option<&str>,
    attributes: Option<Map<String, Value>>,
    relationships: Option<Map<String, Value>>,
) -> Value {
    let mut data = Map::new();
    data.insert("type".to_string(), Value::String(kind.to_string()));
    if let Some(id) = id {
        data.insert("id".to_string(), Value::String(id.to_string()));
    }
    if let Some(attributes) = attributes {
        data.insert("attributes".to_string(), Value::Object(attributes));
    }
    if let Some(relationships) = relationships {
        data.insert("relationships".to_string(), Value::Object(relationships));
    }
    json!({ "data": data })
}

/// Build a to-one relationship mutation body: `{"data": null | {"id","type"}}`.
pub fn relationship_one(ident: Option<ResourceIdentifier>) -> Value {
    match ident {
        Some(ident) => json!({ "data": { "id": ident.id, "type": ident.kind } }),
        None => json!({ "data": null }),
    }
}

/// Build a to-many relationship mutation body: `{"data": [{"id","type"}, ...]}`.
pub fn relationship_many(idents: &[ResourceIdentifier]) -> Value {
    let entries: Vec<Value> = idents
        .iter()
        .map(|i| json!({ "id": i.id, "type": i.kind }))
        .collect();
    json!({ "data": entries })
}

/// Build the `include` query parameter for a set of relationship names.
///
/// An empty set produces no parameter at all.
pub fn include_query(include: &[&str]) -> Vec<(String, String)> {
    if include.is_empty() {
        vec![]
    } else {
        vec![("include".to_string(), include.join(","))]
    }
}

/// Build the `filter[metadata]` query parameter from an opaque JSON filter.
pub fn metadata_filter_query(filter: &Value) -> Vec<(String, String)> {
    vec![("filter[metadata]".to_string(), filter.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip() {
        let doc: Document = serde_json::from_str(
            r#"{
                "data": {
                    "id": "abc", "type": "sensor",
                    "attributes": {"name": "office"},
                    "meta": {"created": "2016-09-01T12:00:00.000Z"},
                    "relationships": {"label": {"data": [{"id": "l1", "type": "label"}]}}
                },
                "included": [{"id": "l1", "type": "label"}],
                "links": {"prev": null, "next": "https://api.helium.com/v1/x"}
            }"#,
        )
        .unwrap();

        let data = match doc.data {
            Some(PrimaryData::One(data)) => data,
            other => panic!("expected single resource, got {other:?}"),
        };
        assert_eq!(data.id.as_deref(), Some("abc"));
        assert_eq!(data.kind.as_deref(), Some("sensor"));
        assert_eq!(data.attributes["name"], "office");
        assert_eq!(data.relationships["label"].data.idents().len(), 1);
        assert_eq!(doc.included.len(), 1);
        assert!(doc.links.prev.is_none());
        assert_eq!(doc.links.next.as_deref(), Some("https://api.helium.com/v1/x"));
    }

    #[test]
    fn test_primary_data_collection() {
        let doc: Document =
            serde_json::from_str(r#"{"data": [{"id": "a", "type": "sensor"}]}"#).unwrap();
        match doc.data {
            Some(PrimaryData::Many(items)) => assert_eq!(items.len(), 1),
            other => panic!("expected collection, got {other:?}"),
        }
    }

    #[test]
    fn test_relationship_data_shapes() {
        let one: Relationship =
            serde_json::from_str(r#"{"data": {"id": "a", "type": "sensor"}}"#).unwrap();
        assert_eq!(one.data.idents().len(), 1);

        let none: Relationship = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(none.data.idents().is_empty());

        let many: Relationship =
            serde_json::from_str(r#"{"data": [{"id": "a", "type": "sensor"}]}"#).unwrap();
        assert_eq!(many.data.idents().len(), 1);
    }

    #[test]
    fn test_resource_body() {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), Value::String("office".to_string()));
        let body = resource_body("label", Some("l1"), Some(attributes), None);
        assert_eq!(body["data"]["type"], "label");
        assert_eq!(body["data"]["id"], "l1");
        assert_eq!(body["data"]["attributes"]["name"], "office");
        assert!(body["data"].get("relationships").is_none());
    }

    #[test]
    fn test_relationship_bodies() {
        assert_eq!(relationship_one(None), json!({"data": null}));

        let ident = ResourceIdentifier {
            id: "a".to_string(),
            kind: "sensor".to_string(),
        };
        let one = relationship_one(Some(ident.clone()));
        assert_eq!(one["data"]["id"], "a");

        let many = relationship_many(&[ident]);
        assert_eq!(many["data"][0]["type"], "sensor");
        assert_eq!(relationship_many(&[]), json!({"data": []}));
    }

    #[test]
    fn test_include_query() {
        assert!(include_query(&[]).is_empty());
        let query = include_query(&["sensor", "element"]);
        assert_eq!(query[0].1, "sensor,element");
    }
}
