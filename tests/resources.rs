//! Endpoint tests for the resource engine.
//!
//! Uses wiremock to mock the Helium API and verify URL shapes, request
//! bodies, include handling, and error classification.

use helium_api::{Error, Resource, Sensor, Session};
use helium_api::{DeviceConfiguration, Label, Organization};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sensor_node(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "sensor",
        "attributes": { "name": name },
        "meta": { "created": "2016-09-01T12:00:00.000Z", "updated": "2016-09-01T12:00:00.000Z" }
    })
}

#[tokio::test]
async fn test_find_hits_kind_and_id_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor/abc-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": sensor_node("abc-123", "office") })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let sensor = session.sensor("abc-123").await.unwrap();

    assert_eq!(sensor.id(), Some("abc-123"));
    assert_eq!(sensor.name(), Some("office"));
    assert_eq!(sensor.short_id(), Some("abc"));
    assert!(sensor.meta().created().is_some());
}

#[tokio::test]
async fn test_all_returns_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [sensor_node("a", "one"), sensor_node("b", "two")]
        })))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let sensors = session.sensors().await.unwrap();

    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[1].name(), Some("two"));
}

#[tokio::test]
async fn test_find_with_include_builds_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/label/l1"))
        .and(query_param("include", "sensor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "l1",
                "type": "label",
                "attributes": { "name": "home" },
                "relationships": {
                    "sensor": { "data": [{ "id": "s1", "type": "sensor" }] }
                }
            },
            "included": [sensor_node("s1", "office")]
        })))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let label = Label::find(&session, "l1", &["sensor"]).await.unwrap();

    // Resolved from the cache, no further request.
    let sensors = label.included_sensors().unwrap();
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].name(), Some("office"));
}

#[tokio::test]
async fn test_where_metadata_sends_filter_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor"))
        .and(query_param("filter[metadata]", r#"{"zone":"kitchen"}"#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [sensor_node("s1", "office")] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let sensors = Sensor::where_metadata(&session, &json!({"zone": "kitchen"}), &[])
        .await
        .unwrap();

    assert_eq!(sensors.len(), 1);
}

#[tokio::test]
async fn test_create_posts_typed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/label"))
        .and(body_json(json!({
            "data": { "type": "label", "attributes": { "name": "new label" } }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "l9", "type": "label", "attributes": { "name": "new label" } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let mut attributes = serde_json::Map::new();
    attributes.insert("name".to_string(), json!("new label"));
    let label = Label::create(&session, attributes).await.unwrap();

    assert_eq!(label.id(), Some("l9"));
    assert_eq!(label.name(), Some("new label"));
}

#[tokio::test]
async fn test_update_patches_with_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/sensor/s1"))
        .and(body_json(json!({
            "data": { "type": "sensor", "id": "s1", "attributes": { "name": "renamed" } }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": sensor_node("s1", "renamed") })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sensor/s1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": sensor_node("s1", "old") })),
        )
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let sensor = session.sensor("s1").await.unwrap();

    let mut attributes = serde_json::Map::new();
    attributes.insert("name".to_string(), json!("renamed"));
    let updated = sensor.update(attributes).await.unwrap();

    assert_eq!(updated.name(), Some("renamed"));
    // The original instance is untouched.
    assert_eq!(sensor.name(), Some("old"));
}

#[tokio::test]
async fn test_delete_expects_no_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor/s1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": sensor_node("s1", "x") })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sensor/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let sensor = session.sensor("s1").await.unwrap();
    sensor.delete().await.unwrap();
}

#[tokio::test]
async fn test_not_found_classification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "detail": "sensor missing not found", "status": "404" }]
        })))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    match session.sensor("missing").await {
        Err(Error::NotFound(errors)) => {
            assert_eq!(errors.status, 404);
            assert_eq!(errors.message, "sensor missing not found");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_classification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sensor"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    match session.sensors().await {
        Err(Error::Server(errors)) => {
            assert_eq!(errors.status, 500);
            // Malformed body degrades to the raw text.
            assert_eq!(errors.message, "boom");
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[tokio::test]
async fn test_singleton_is_fetched_and_updated_without_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "o1", "type": "organization", "attributes": { "name": "Org" } }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "o1", "type": "organization", "attributes": { "name": "Renamed" } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let org = session.authorized_organization().await.unwrap();
    assert!(org.is_singleton());
    assert_eq!(org.name(), Some("Org"));

    let mut attributes = serde_json::Map::new();
    attributes.insert("name".to_string(), json!("Renamed"));
    let renamed = org.update(attributes).await.unwrap();
    assert_eq!(renamed.name(), Some("Renamed"));
    assert!(renamed.is_singleton());
}

#[tokio::test]
async fn test_hyphenated_kind_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/device-configuration/dc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "dc1",
                "type": "device-configuration",
                "meta": { "loaded": true }
            }
        })))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let dc = DeviceConfiguration::find(&session, "dc1", &[]).await.unwrap();
    assert!(dc.is_loaded());
}

#[tokio::test]
async fn test_organization_equality_is_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "o1", "type": "organization", "attributes": { "name": "Org" } }
        })))
        .mount(&mock_server)
        .await;

    let session = Session::new("test-token", &mock_server.uri()).unwrap();
    let a = Organization::authorized(&session).await.unwrap();
    let b = Organization::authorized(&session).await.unwrap();
    assert_eq!(a, b);
}
