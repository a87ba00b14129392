//! Mock Helium API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the Helium
//! JSONAPI service for integration and end-to-end testing. Unlike wiremock
//! which mocks at the HTTP level per-test, this server maintains state
//! across requests, enabling realistic workflow testing: resources created
//! through the client are findable, relationship mutations persist, and
//! posted timeseries readings page back out through continuation links.
//!
//! # Example
//!
//! ```ignore
//! use helium_api::mock_server::MockServer;
//! use helium_api::{Session, Sensor, Resource};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let session = Session::new("test-token", &server.url()).unwrap();
//!
//!     // Server comes with default fixtures
//!     let sensors = session.sensors().await.unwrap();
//!     assert!(!sensors.is_empty());
//!
//!     server.shutdown().await;
//! }
//! ```

pub mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::MockServer;
pub use state::{MockState, Ref, StoredPoint, StoredResource};
