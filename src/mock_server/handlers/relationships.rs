//! Relationship endpoint handlers: the `relationships/{rel}` sub-resource
//! and direct related-resource fetches.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use super::{not_found, render_resource, SharedState};
use crate::mock_server::state::{MockState, Ref};

/// Decode relationship linkage from a `{"data": ...}` body: an array of
/// identifiers, a single identifier, or null.
pub(crate) fn parse_refs(value: &Value) -> Vec<Ref> {
    let one = |entry: &Value| -> Option<Ref> {
        match (
            entry.get("id").and_then(Value::as_str),
            entry.get("type").and_then(Value::as_str),
        ) {
            (Some(id), Some(kind)) => Some(Ref::new(kind, id)),
            _ => None,
        }
    };
    match value.get("data") {
        Some(Value::Array(entries)) => entries.iter().filter_map(one).collect(),
        Some(entry) if entry.is_object() => one(entry).into_iter().collect(),
        _ => vec![],
    }
}

/// Render the resources a relationship set points at, as a collection
/// document.
pub(crate) fn related_response(
    state: &MockState,
    owner_kind: &str,
    owner_id: &str,
    rel: &str,
) -> Response {
    if state.get(owner_kind, owner_id).is_none() {
        return not_found(&format!("{owner_kind} {owner_id} not found"));
    }
    let data: Vec<Value> = state
        .refs(owner_kind, owner_id, rel)
        .iter()
        .filter_map(|r| state.get(&r.kind, &r.id))
        .map(|target| render_resource(state, target))
        .collect();
    Json(json!({ "data": data })).into_response()
}

fn refs_response(state: &MockState, kind: &str, id: &str, rel: &str) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    let data: Vec<Value> = state.refs(kind, id, rel).iter().map(Ref::render).collect();
    Json(json!({ "data": data })).into_response()
}

fn apply_refs(state: &mut MockState, kind: &str, id: &str, rel: &str, body: &Value) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    let new_refs = parse_refs(body);
    let current = state.refs(kind, id, rel);

    let mut current_ids: Vec<&str> = current.iter().map(|r| r.id.as_str()).collect();
    let mut new_ids: Vec<&str> = new_refs.iter().map(|r| r.id.as_str()).collect();
    current_ids.sort_unstable();
    new_ids.sort_unstable();
    if current_ids == new_ids {
        // Accepted, nothing changed.
        return StatusCode::NO_CONTENT.into_response();
    }

    state.set_refs(kind, id, rel, new_refs);
    let data: Vec<Value> = state.refs(kind, id, rel).iter().map(Ref::render).collect();
    Json(json!({ "data": data })).into_response()
}

/// GET /{kind}/{id}/relationships/{rel}
pub async fn get_relationship(
    State(state): State<SharedState>,
    Path((kind, id, rel)): Path<(String, String, String)>,
) -> Response {
    let state = state.read().await;
    refs_response(&state, &kind, &id, &rel)
}

/// PATCH /{kind}/{id}/relationships/{rel}
pub async fn update_relationship(
    State(state): State<SharedState>,
    Path((kind, id, rel)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    apply_refs(&mut state, &kind, &id, &rel, &body)
}

/// GET /{kind}/relationships/{rel} (singleton kinds)
pub async fn get_singleton_relationship(
    State(state): State<SharedState>,
    Path((kind, rel)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    refs_response(&state, &kind, &id, &rel)
}

/// PATCH /{kind}/relationships/{rel} (singleton kinds)
pub async fn update_singleton_relationship(
    State(state): State<SharedState>,
    Path((kind, rel)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    apply_refs(&mut state, &kind, &id, &rel, &body)
}

/// GET /{kind}/{id}/{rel}
pub async fn get_related(
    State(state): State<SharedState>,
    Path((kind, id, rel)): Path<(String, String, String)>,
) -> Response {
    let state = state.read().await;
    related_response(&state, &kind, &id, &rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refs_shapes() {
        let many = json!({ "data": [{"id": "a", "type": "sensor"}, {"id": "b", "type": "sensor"}] });
        assert_eq!(parse_refs(&many).len(), 2);

        let one = json!({ "data": {"id": "a", "type": "sensor"} });
        assert_eq!(parse_refs(&one), vec![Ref::new("sensor", "a")]);

        let null = json!({ "data": null });
        assert!(parse_refs(&null).is_empty());
    }
}
