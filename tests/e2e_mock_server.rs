//! E2E tests using the mock Helium server.
//!
//! These tests exercise full workflows against the stateful mock server,
//! testing realistic scenarios rather than individual endpoints.

#![cfg(feature = "test-server")]

use helium_api::mock_server::{fixtures, MockServer};
use helium_api::{
    Configurable, Device, DeviceConfiguration, Direction, Error, HasMetadata, HasTimeseries,
    Label, PointValue, Resource, Sensor, Session, TimeseriesOptions,
};
use serde_json::json;

fn attrs(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    let client = reqwest::Client::new();
    let result = client.get(format!("{}/health", url)).send().await;
    assert!(result.is_err());
}

// =============================================================================
// Resource CRUD Workflows
// =============================================================================

#[tokio::test]
async fn test_create_then_find_returns_equal_instance() {
    let server = MockServer::start_empty().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let created = Sensor::create(&session, attrs(&[("name", json!("porch"))]))
        .await
        .unwrap();
    let id = created.id().unwrap().to_string();

    let found = session.sensor(&id).await.unwrap();
    assert_eq!(created, found);
    assert_eq!(found.name(), Some("porch"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_delete_then_find_is_not_found() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_GARAGE).await.unwrap();
    sensor.delete().await.unwrap();

    match session.sensor(fixtures::SENSOR_GARAGE).await {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_returns_new_instance() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let renamed = sensor
        .update(attrs(&[("name", json!("corner office"))]))
        .await
        .unwrap();

    assert_eq!(renamed.name(), Some("corner office"));
    assert_eq!(sensor.name(), Some("office"));
    // Same identity, different attribute state.
    assert_eq!(sensor, renamed);

    server.shutdown().await;
}

// =============================================================================
// Relationship Workflows
// =============================================================================

#[tokio::test]
async fn test_include_matches_direct_fetch() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let label = Label::find(&session, fixtures::LABEL_HOME, &["sensor"])
        .await
        .unwrap();

    let from_cache = label.included_sensors().unwrap();
    let from_server = label.sensors().await.unwrap();
    assert_eq!(from_cache, from_server);
    assert_eq!(from_cache.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_label_membership_round_trip() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let label = session.label(fixtures::LABEL_HOME).await.unwrap();
    let new_sensor = Sensor::create(&session, attrs(&[("name", json!("attic"))]))
        .await
        .unwrap();

    // Add: membership changes.
    assert!(label.add_sensors(&[new_sensor.clone()]).await.unwrap());
    let members = label.sensors().await.unwrap();
    assert!(members.contains(&new_sensor));

    // Adding again is accepted without a change.
    assert!(!label.add_sensors(&[new_sensor.clone()]).await.unwrap());

    // Remove: back to the original membership.
    assert!(label.remove_sensors(&[new_sensor.clone()]).await.unwrap());
    let members = label.sensors().await.unwrap();
    assert!(!members.contains(&new_sensor));
    assert_eq!(members.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_replace_clears_membership() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let label = session.label(fixtures::LABEL_HOME).await.unwrap();
    assert!(label.update_sensors(&[]).await.unwrap());
    assert!(label.sensors().await.unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_label_with_members() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let label = Label::create_with_members(
        &session,
        attrs(&[("name", json!("favorites"))]),
        &[sensor.clone()],
        &[],
    )
    .await
    .unwrap();

    let members = label.sensors().await.unwrap();
    assert_eq!(members, vec![sensor]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_reverse_navigation_through_include() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let labels = sensor.labels().await.unwrap();

    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].id(), Some(fixtures::LABEL_HOME));

    server.shutdown().await;
}

// =============================================================================
// Device Configuration Workflows
// =============================================================================

#[tokio::test]
async fn test_device_configuration_traversal() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let dc = sensor.device_configuration(false).await.unwrap().unwrap();
    assert!(dc.is_loaded());
    assert_eq!(dc.id(), Some(fixtures::DEVICE_CONFIGURATION));

    let configuration = dc.configuration().await.unwrap().unwrap();
    assert_eq!(configuration.id(), Some(fixtures::CONFIGURATION));

    match dc.device().await.unwrap() {
        Some(Device::Sensor(device)) => assert_eq!(device.id(), Some(fixtures::SENSOR_OFFICE)),
        other => panic!("expected the office sensor, got {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_device_configuration() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_GARAGE).await.unwrap();
    let configuration =
        helium_api::Configuration::find(&session, fixtures::CONFIGURATION, &[])
            .await
            .unwrap();

    let dc = DeviceConfiguration::create_for(&session, &sensor, &configuration)
        .await
        .unwrap();
    // Freshly created associations start out pending.
    assert!(!dc.is_loaded());

    match dc.device().await.unwrap() {
        Some(Device::Sensor(device)) => assert_eq!(device.id(), Some(fixtures::SENSOR_GARAGE)),
        other => panic!("expected the garage sensor, got {other:?}"),
    }

    server.shutdown().await;
}

// =============================================================================
// Timeseries Workflows
// =============================================================================

#[tokio::test]
async fn test_timeseries_pages_newest_first_by_default() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let mut timeseries = sensor
        .timeseries(TimeseriesOptions {
            page_size: Some(2),
            ..Default::default()
        })
        .unwrap();

    let ids: Vec<String> = timeseries
        .take(10)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        [fixtures::POINT_NEW, fixtures::POINT_MID, fixtures::POINT_OLD]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_timeseries_anchored_ascending() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let mut timeseries = sensor
        .timeseries(TimeseriesOptions {
            page_size: Some(2),
            start_id: Some(fixtures::POINT_OLD.to_string()),
            direction: Direction::Next,
            ..Default::default()
        })
        .unwrap();

    let ids: Vec<String> = timeseries
        .take(10)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        [fixtures::POINT_OLD, fixtures::POINT_MID, fixtures::POINT_NEW]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_posted_reading_pages_back_out() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_GARAGE).await.unwrap();
    let timeseries = sensor.timeseries(TimeseriesOptions::default()).unwrap();
    let posted = timeseries.create("t", json!(19.5), None).await.unwrap();
    assert_eq!(posted.port().unwrap(), "t");

    let mut fresh = sensor.timeseries(TimeseriesOptions::default()).unwrap();
    let point = fresh.next().await.unwrap().unwrap();
    assert_eq!(point.id(), posted.id());
    assert_eq!(point.value().unwrap(), PointValue::Scalar(json!(19.5)));

    server.shutdown().await;
}

#[tokio::test]
async fn test_timeseries_aggregation() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let mut timeseries = sensor
        .timeseries(TimeseriesOptions {
            agg_type: Some("min,max,avg".to_string()),
            agg_size: Some("1d".to_string()),
            ..Default::default()
        })
        .unwrap();

    // All three fixture readings land in one daily bucket.
    let point = timeseries.next().await.unwrap().unwrap();
    match point.value().unwrap() {
        PointValue::Aggregate(agg) => {
            assert_eq!(agg.min, Some(21.5));
            assert_eq!(agg.max, Some(23.5));
            assert!((agg.avg.unwrap() - 22.333).abs() < 0.001);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
    assert!(timeseries.next().await.unwrap().is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_timeseries_port_filter() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let ts = sensor.timeseries(TimeseriesOptions::default()).unwrap();
    ts.create("h", json!(40), None).await.unwrap();

    let mut humidity = sensor
        .timeseries(TimeseriesOptions {
            port: Some("h".to_string()),
            ..Default::default()
        })
        .unwrap();
    let points = humidity.take(10).await.unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].port().unwrap(), "h");

    server.shutdown().await;
}

#[tokio::test]
async fn test_live_stream_end_to_end() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let timeseries = sensor.timeseries(TimeseriesOptions::default()).unwrap();
    let mut live = timeseries.live().await.unwrap();

    let points = live.take(3).await.unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].id(), Some(fixtures::POINT_OLD));
    live.close();

    server.shutdown().await;
}

// =============================================================================
// Metadata Workflows
// =============================================================================

#[tokio::test]
async fn test_metadata_update_merges_and_replace_swaps() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let sensor = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    let metadata = sensor.metadata().await.unwrap();
    assert!(metadata.attributes().as_map().is_empty());

    let metadata = metadata.update(attrs(&[("zone", json!("kitchen"))])).await.unwrap();
    let metadata = metadata.update(attrs(&[("floor", json!(2))])).await.unwrap();
    assert_eq!(metadata.attributes().string("zone"), Some("kitchen"));
    assert_eq!(metadata.attributes().integer("floor"), Some(2));

    let metadata = metadata.replace(attrs(&[("floor", json!(3))])).await.unwrap();
    assert_eq!(metadata.attributes().integer("floor"), Some(3));
    assert!(metadata.attributes().get("zone").is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_where_metadata_filters_server_side() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let office = session.sensor(fixtures::SENSOR_OFFICE).await.unwrap();
    office
        .metadata()
        .await
        .unwrap()
        .update(attrs(&[("zone", json!("kitchen"))]))
        .await
        .unwrap();

    let matched = Sensor::where_metadata(&session, &json!({"zone": "kitchen"}), &[])
        .await
        .unwrap();
    assert_eq!(matched, vec![office]);

    let unmatched = Sensor::where_metadata(&session, &json!({"zone": "basement"}), &[])
        .await
        .unwrap();
    assert!(unmatched.is_empty());

    server.shutdown().await;
}

// =============================================================================
// Singleton Workflows
// =============================================================================

#[tokio::test]
async fn test_authorized_organization_and_user() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let organization = session.authorized_organization().await.unwrap();
    assert!(organization.is_singleton());
    assert_eq!(organization.name(), Some("Test Organization"));

    let users = organization.users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email(), Some("test@helium.com"));

    let user = session.authorized_user().await.unwrap();
    assert_eq!(user.id(), users[0].id());

    server.shutdown().await;
}

#[tokio::test]
async fn test_singleton_metadata_and_timeseries() {
    let server = MockServer::start().await;
    let session = Session::new("test-token", server.url()).unwrap();

    let organization = session.authorized_organization().await.unwrap();

    // Metadata addressed without an id segment.
    let metadata = organization.metadata().await.unwrap();
    let metadata = metadata.update(attrs(&[("plan", json!("pro"))])).await.unwrap();
    assert_eq!(metadata.attributes().string("plan"), Some("pro"));

    // Organization-wide timeseries, same addressing.
    let timeseries = organization.timeseries(TimeseriesOptions::default()).unwrap();
    timeseries.create("t", json!(20), None).await.unwrap();
    let mut fresh = organization.timeseries(TimeseriesOptions::default()).unwrap();
    assert!(fresh.next().await.unwrap().is_some());

    server.shutdown().await;
}
