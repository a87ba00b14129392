//! Timeseries endpoint handlers: cursor-paginated reads, reading creation,
//! aggregation, and the live SSE variant.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::Stream;
use serde_json::{json, Value};

use super::{not_found, request_base, unprocessable, SharedState};
use crate::mock_server::state::{MockState, StoredPoint};

const DEFAULT_PAGE_SIZE: usize = 100;

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Parse an aggregation bucket size like `30s`, `10m`, `6h`, or `1d` into
/// seconds. Unparsable sizes fall back to one hour.
fn bucket_seconds(raw: &str) -> i64 {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    let count: i64 = digits.parse().unwrap_or(1);
    match raw.chars().last() {
        Some('s') => count,
        Some('m') => count * 60,
        Some('h') => count * 3600,
        Some('d') => count * 86400,
        _ => 3600,
    }
}

/// The points matching the request's filters, ascending by timestamp.
fn filtered(points: Vec<StoredPoint>, query: &HashMap<String, String>) -> Vec<StoredPoint> {
    let port = query.get("filter[port]");
    let start = query.get("filter[start]").and_then(|s| parse_timestamp(s));
    let end = query.get("filter[end]").and_then(|s| parse_timestamp(s));
    points
        .into_iter()
        .filter(|p| port.map(|want| &p.port == want).unwrap_or(true))
        .filter(|p| match p.parsed_timestamp() {
            Some(ts) => {
                start.map(|s| ts >= s).unwrap_or(true) && end.map(|e| ts < e).unwrap_or(true)
            }
            None => false,
        })
        .collect()
}

/// Bucket numeric readings and emit one aggregate point per (port, bucket),
/// newest first. The value object carries only the requested operations.
fn aggregated(points: &[StoredPoint], ops: &str, size: i64) -> Vec<Value> {
    let ops: Vec<&str> = ops.split(',').collect();
    let mut buckets: BTreeMap<(String, i64), Vec<f64>> = BTreeMap::new();
    let mut first_ids: HashMap<(String, i64), String> = HashMap::new();

    for point in points {
        let Some(ts) = point.parsed_timestamp() else {
            continue;
        };
        let Some(value) = point.value.as_f64() else {
            continue;
        };
        let bucket = ts.timestamp().div_euclid(size) * size;
        let key = (point.port.clone(), bucket);
        first_ids.entry(key.clone()).or_insert_with(|| point.id.clone());
        buckets.entry(key).or_default().push(value);
    }

    buckets
        .into_iter()
        .rev()
        .map(|((port, bucket), values)| {
            let mut aggregate = serde_json::Map::new();
            if ops.contains(&"min") {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                aggregate.insert("min".to_string(), json!(min));
            }
            if ops.contains(&"max") {
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                aggregate.insert("max".to_string(), json!(max));
            }
            if ops.contains(&"avg") {
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                aggregate.insert("avg".to_string(), json!(avg));
            }
            let timestamp = DateTime::<Utc>::from_timestamp(bucket, 0)
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default();
            json!({
                "id": first_ids[&(port.clone(), bucket)].clone(),
                "type": "data-point",
                "attributes": {
                    "port": port,
                    "value": aggregate,
                    "timestamp": timestamp,
                },
                "meta": {},
            })
        })
        .collect()
}

/// One page of readings plus its continuation link.
///
/// Without `page[id]` the page is the newest readings, descending, with a
/// `links.prev` continuation toward older ones. An anchored request pages
/// ascending from the anchor (inclusive) with a `links.next` continuation,
/// unless the anchor came from a `dir=prev` continuation link, in which
/// case descending resumes there. Continuation links carry only their own
/// cursor; the client re-sends its fixed filters each request.
fn page_response(
    points: Vec<StoredPoint>,
    query: &HashMap<String, String>,
    link_base: &str,
) -> Response {
    let size = query
        .get("page[size]")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let anchor = query.get("page[id]");
    let descending = match anchor {
        None => true,
        Some(_) => query.get("dir").map(String::as_str) == Some("prev"),
    };

    let ordered: Vec<StoredPoint> = if descending {
        points.into_iter().rev().collect()
    } else {
        points
    };
    let start = match anchor {
        Some(id) => match ordered.iter().position(|p| &p.id == id) {
            Some(pos) => pos,
            None => ordered.len(),
        },
        None => 0,
    };
    let end = (start + size).min(ordered.len());

    let data: Vec<Value> = ordered[start..end].iter().map(StoredPoint::render).collect();
    let continuation = ordered.get(end).map(|next| {
        let dir = if descending { "prev" } else { "next" };
        format!("{link_base}?page[id]={}&dir={dir}", next.id)
    });
    let links = if descending {
        json!({ "prev": continuation, "next": null })
    } else {
        json!({ "prev": null, "next": continuation })
    };

    Json(json!({ "data": data, "links": links })).into_response()
}

fn points_response(
    state: &MockState,
    kind: &str,
    id: &str,
    link_base: &str,
    query: &HashMap<String, String>,
) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    let points = filtered(state.points_for(kind, id), query);

    if let Some(ops) = query.get("agg[type]") {
        let size = bucket_seconds(query.get("agg[size]").map(String::as_str).unwrap_or("1h"));
        let data = aggregated(&points, ops, size);
        return Json(json!({ "data": data })).into_response();
    }

    page_response(points, query, link_base)
}

fn insert_point(state: &mut MockState, kind: &str, id: &str, body: &Value) -> Response {
    if state.get(kind, id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    let attributes = body.get("data").and_then(|d| d.get("attributes"));
    let Some(port) = attributes
        .and_then(|a| a.get("port"))
        .and_then(Value::as_str)
    else {
        return unprocessable("reading has no port");
    };
    let Some(value) = attributes.and_then(|a| a.get("value")) else {
        return unprocessable("reading has no value");
    };
    let timestamp = attributes
        .and_then(|a| a.get("timestamp"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let point = StoredPoint {
        id: state.generate_id(),
        port: port.to_string(),
        value: value.clone(),
        timestamp,
    };
    let rendered = point.render();
    state.add_point(kind, id, point);
    (StatusCode::CREATED, Json(json!({ "data": rendered }))).into_response()
}

/// The live stream: every stored reading as one SSE event, then keep-alives
/// until the client closes.
fn live_stream(points: Vec<StoredPoint>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = points
        .into_iter()
        .map(|p| Ok(Event::default().data(json!({ "data": p.render() }).to_string())));
    Sse::new(futures::stream::iter(events)).keep_alive(KeepAlive::default())
}

/// GET /{kind}/{id}/timeseries
pub async fn list_points(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    let link_base = format!("{}/{kind}/{id}/timeseries", request_base(&headers));
    points_response(&state, &kind, &id, &link_base, &query)
}

/// POST /{kind}/{id}/timeseries
pub async fn create_point(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    insert_point(&mut state, &kind, &id, &body)
}

/// GET /{kind}/{id}/timeseries/live
pub async fn live_points(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    if state.get(&kind, &id).is_none() {
        return not_found(&format!("{kind} {id} not found"));
    }
    live_stream(state.points_for(&kind, &id)).into_response()
}

/// GET /{kind}/timeseries (singleton kinds)
pub async fn list_singleton_points(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    let link_base = format!("{}/{kind}/timeseries", request_base(&headers));
    points_response(&state, &kind, &id, &link_base, &query)
}

/// POST /{kind}/timeseries (singleton kinds)
pub async fn create_singleton_point(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    insert_point(&mut state, &kind, &id, &body)
}

/// GET /{kind}/timeseries/live (singleton kinds)
pub async fn live_singleton_points(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
) -> Response {
    let state = state.read().await;
    let Some(id) = state.singleton(&kind).map(|r| r.id.clone()) else {
        return not_found(&format!("{kind} not found"));
    };
    live_stream(state.points_for(&kind, &id)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, port: &str, value: Value, timestamp: &str) -> StoredPoint {
        StoredPoint {
            id: id.to_string(),
            port: port.to_string(),
            value,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_bucket_seconds() {
        assert_eq!(bucket_seconds("30s"), 30);
        assert_eq!(bucket_seconds("10m"), 600);
        assert_eq!(bucket_seconds("6h"), 21600);
        assert_eq!(bucket_seconds("1d"), 86400);
        assert_eq!(bucket_seconds("garbage"), 3600);
    }

    #[test]
    fn test_filter_by_port_and_window() {
        let points = vec![
            point("p1", "t", json!(22), "2016-09-01T00:00:00.000Z"),
            point("p2", "h", json!(40), "2016-09-01T01:00:00.000Z"),
            point("p3", "t", json!(24), "2016-09-01T02:00:00.000Z"),
        ];
        let mut query = HashMap::new();
        query.insert("filter[port]".to_string(), "t".to_string());
        query.insert(
            "filter[end]".to_string(),
            "2016-09-01T02:00:00.000Z".to_string(),
        );
        let kept = filtered(points, &query);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "p1");
    }

    #[test]
    fn test_aggregation_buckets_by_hour() {
        let points = vec![
            point("p1", "t", json!(22.0), "2016-09-01T00:10:00.000Z"),
            point("p2", "t", json!(24.0), "2016-09-01T00:40:00.000Z"),
            point("p3", "t", json!(30.0), "2016-09-01T01:10:00.000Z"),
        ];
        let data = aggregated(&points, "min,max,avg", 3600);
        assert_eq!(data.len(), 2);
        // Newest bucket first.
        assert_eq!(data[0]["attributes"]["value"]["avg"], json!(30.0));
        assert_eq!(data[1]["attributes"]["value"]["min"], json!(22.0));
        assert_eq!(data[1]["attributes"]["value"]["max"], json!(24.0));
        assert_eq!(data[1]["attributes"]["value"]["avg"], json!(23.0));
    }

    #[test]
    fn test_aggregation_respects_requested_ops() {
        let points = vec![point("p1", "t", json!(22.0), "2016-09-01T00:10:00.000Z")];
        let data = aggregated(&points, "avg", 3600);
        let value = data[0]["attributes"]["value"].as_object().unwrap();
        assert!(value.contains_key("avg"));
        assert!(!value.contains_key("min"));
    }
}
