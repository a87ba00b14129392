//! HTTP request handlers for the mock server.

pub mod metadata;
pub mod relationships;
pub mod resources;
pub mod timeseries;

pub use metadata::*;
pub use relationships::*;
pub use resources::*;
pub use timeseries::*;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::state::{owner_key, MockState, StoredResource};

pub(crate) type SharedState = Arc<RwLock<MockState>>;

/// A JSONAPI-shaped 404 response.
pub(crate) fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "errors": [{ "detail": detail, "status": "404" }]
        })),
    )
        .into_response()
}

/// A JSONAPI-shaped 422 response for malformed request bodies.
pub(crate) fn unprocessable(detail: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "errors": [{ "detail": detail, "status": "422" }]
        })),
    )
        .into_response()
}

/// The comma-separated `include` parameter as a list of names.
pub(crate) fn parse_include(query: &HashMap<String, String>) -> Vec<String> {
    query
        .get("include")
        .map(|raw| raw.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Render a stored resource as a JSONAPI node, with relationship linkage
/// for every relationship set the owner has.
pub(crate) fn render_resource(state: &MockState, resource: &StoredResource) -> Value {
    let mut node = json!({
        "id": resource.id,
        "type": resource.kind,
        "attributes": resource.attributes,
        "meta": resource.meta,
    });
    if let Some(rels) = state
        .relationships
        .get(&owner_key(&resource.kind, &resource.id))
    {
        if !rels.is_empty() {
            let mut linkage = serde_json::Map::new();
            for (name, refs) in rels {
                let rendered: Vec<Value> = refs.iter().map(|r| r.render()).collect();
                linkage.insert(name.clone(), json!({ "data": rendered }));
            }
            node["relationships"] = Value::Object(linkage);
        }
    }
    node
}

/// Resolve the `included` entries for the requested relationship names.
pub(crate) fn resolve_included(
    state: &MockState,
    resource: &StoredResource,
    include: &[String],
) -> Vec<Value> {
    let mut entries = Vec::new();
    for name in include {
        for r in state.refs(&resource.kind, &resource.id, name) {
            if let Some(target) = state.get(&r.kind, &r.id) {
                entries.push(render_resource(state, target));
            }
        }
    }
    entries
}

/// The absolute base URL of the request, reconstructed from the Host
/// header for continuation links.
pub(crate) fn request_base(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}
