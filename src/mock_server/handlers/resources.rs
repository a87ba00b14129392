//! Resource collection and single-resource endpoint handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Map, Value};

use super::relationships::{parse_refs, related_response};
use super::{not_found, parse_include, render_resource, resolve_included, unprocessable, SharedState};
use crate::mock_server::state::{is_singleton_kind, MockState, StoredResource};

/// GET /{kind}
///
/// A collection fetch for ordinary kinds, the singleton fetch for
/// singleton-addressed ones.
pub async fn list_or_singleton(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = state.read().await;
    let include = parse_include(&query);

    if is_singleton_kind(&kind) {
        let Some(resource) = state.singleton(&kind) else {
            return not_found(&format!("{kind} not found"));
        };
        let included = resolve_included(&state, resource, &include);
        return Json(json!({
            "data": render_resource(&state, resource),
            "included": included,
        }))
        .into_response();
    }

    let metadata_filter: Option<Map<String, Value>> = query
        .get("filter[metadata]")
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|v| v.as_object().cloned());

    let mut data = Vec::new();
    let mut included = Vec::new();
    for resource in state.list(&kind) {
        if let Some(filter) = &metadata_filter {
            let metadata = state.metadata_for(&kind, &resource.id);
            if !filter.iter().all(|(k, v)| metadata.get(k) == Some(v)) {
                continue;
            }
        }
        data.push(render_resource(&state, resource));
        included.extend(resolve_included(&state, resource, &include));
    }

    Json(json!({ "data": data, "included": included })).into_response()
}

/// POST /{kind}
pub async fn create_resource(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(data) = body.get("data") else {
        return unprocessable("request body has no data");
    };
    let attributes = data
        .get("attributes")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut state = state.write().await;
    let id = state.generate_id();
    let resource = StoredResource::new(&kind, &id, attributes);

    if let Some(relationships) = data.get("relationships").and_then(Value::as_object) {
        for (name, rel) in relationships {
            state.set_refs(&kind, &id, name, parse_refs(rel));
        }
    }

    state.insert(resource);
    let rendered = render_resource(&state, state.get(&kind, &id).unwrap());
    (StatusCode::CREATED, Json(json!({ "data": rendered }))).into_response()
}

/// GET /{kind}/{id}
///
/// For singleton kinds the second segment is a relationship name instead
/// (e.g. `/organization/user`).
pub async fn get_resource(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = state.read().await;

    if is_singleton_kind(&kind) {
        let Some(owner_id) = state.singleton(&kind).map(|r| r.id.clone()) else {
            return not_found(&format!("{kind} not found"));
        };
        return related_response(&state, &kind, &owner_id, &id);
    }

    let Some(resource) = state.get(&kind, &id) else {
        return not_found(&format!("{kind} {id} not found"));
    };
    let include = parse_include(&query);
    let included = resolve_included(&state, resource, &include);
    Json(json!({
        "data": render_resource(&state, resource),
        "included": included,
    }))
    .into_response()
}

/// PATCH /{kind}/{id}
pub async fn update_resource(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    apply_update(&mut state, &kind, &id, &body)
}

/// PATCH /{kind} (singleton kinds only)
pub async fn update_singleton(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    apply_update(&mut state, &kind, &id, &body)
}

fn apply_update(state: &mut MockState, kind: &str, id: &str, body: &Value) -> Response {
    let attributes = body
        .get("data")
        .and_then(|d| d.get("attributes"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let Some(resource) = state.get_mut(kind, id) else {
        return not_found(&format!("{kind} {id} not found"));
    };
    for (key, value) in attributes {
        resource.attributes.insert(key, value);
    }
    resource.meta.insert("updated".to_string(), Value::String(now));

    let rendered = render_resource(state, state.get(kind, id).unwrap());
    Json(json!({ "data": rendered })).into_response()
}

/// DELETE /{kind}/{id}
pub async fn delete_resource(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let mut state = state.write().await;
    if state.remove(&kind, &id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&format!("{kind} {id} not found"))
    }
}
