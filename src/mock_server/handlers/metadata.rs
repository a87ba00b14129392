//! Metadata endpoint handlers.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Map, Value};

use super::{not_found, SharedState};
use crate::mock_server::state::{owner_key, MockState};

fn render_metadata(id: &str, map: &Map<String, Value>) -> Value {
    json!({
        "data": {
            "id": id,
            "type": "metadata",
            "attributes": map,
        }
    })
}

fn read_metadata(state: &MockState, kind: &str, id: &str) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    Json(render_metadata(id, &state.metadata_for(kind, id))).into_response()
}

fn write_metadata(
    state: &mut MockState,
    kind: &str,
    id: &str,
    body: &Value,
    replace: bool,
) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    let attributes = body
        .get("data")
        .and_then(|d| d.get("attributes"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let key = owner_key(kind, id);
    if replace {
        state.metadata.insert(key.clone(), attributes);
    } else {
        let map = state.metadata.entry(key.clone()).or_default();
        for (k, v) in attributes {
            map.insert(k, v);
        }
    }
    Json(render_metadata(id, &state.metadata[&key])).into_response()
}

/// GET /{kind}/{id}/metadata
pub async fn get_metadata(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    read_metadata(&state, &kind, &id)
}

/// PATCH /{kind}/{id}/metadata (merge)
pub async fn update_metadata(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    write_metadata(&mut state, &kind, &id, &body, false)
}

/// PUT /{kind}/{id}/metadata (replace)
pub async fn replace_metadata(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    write_metadata(&mut state, &kind, &id, &body, true)
}

/// GET /{kind}/metadata (singleton kinds)
pub async fn get_singleton_metadata(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
) -> Response {
    let state = state.read().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    read_metadata(&state, &kind, &id)
}

/// PATCH /{kind}/metadata (singleton kinds)
pub async fn update_singleton_metadata(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    write_metadata(&mut state, &kind, &id, &body, false)
}

/// PUT /{kind}/metadata (singleton kinds)
pub async fn replace_singleton_metadata(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    write_metadata(&mut state, &kind, &id, &body, true)
}
