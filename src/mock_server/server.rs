//! Mock Helium API server.
//!
//! Provides an axum-based HTTP server that simulates the Helium JSONAPI
//! service.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

/// A mock Helium API server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns
    /// immediately. Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this URL when creating a `Session` for testing.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the axum router with all routes.
    ///
    /// Static segments win over captures, so the singleton routes
    /// (`/{kind}/metadata`, `/{kind}/timeseries`, ...) coexist with the
    /// id-addressed ones.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            // Collection / singleton roots
            .route(
                "/:kind",
                get(handlers::list_or_singleton)
                    .post(handlers::create_resource)
                    .patch(handlers::update_singleton),
            )
            // Singleton sub-resources
            .route(
                "/:kind/metadata",
                get(handlers::get_singleton_metadata)
                    .patch(handlers::update_singleton_metadata)
                    .put(handlers::replace_singleton_metadata),
            )
            .route(
                "/:kind/timeseries",
                get(handlers::list_singleton_points).post(handlers::create_singleton_point),
            )
            .route(
                "/:kind/timeseries/live",
                get(handlers::live_singleton_points),
            )
            .route(
                "/:kind/relationships/:rel",
                get(handlers::get_singleton_relationship)
                    .patch(handlers::update_singleton_relationship),
            )
            // Id-addressed resources
            .route(
                "/:kind/:id",
                get(handlers::get_resource)
                    .patch(handlers::update_resource)
                    .delete(handlers::delete_resource),
            )
            .route(
                "/:kind/:id/metadata",
                get(handlers::get_metadata)
                    .patch(handlers::update_metadata)
                    .put(handlers::replace_metadata),
            )
            .route(
                "/:kind/:id/timeseries",
                get(handlers::list_points).post(handlers::create_point),
            )
            .route("/:kind/:id/timeseries/live", get(handlers::live_points))
            .route(
                "/:kind/:id/relationships/:rel",
                get(handlers::get_relationship).patch(handlers::update_relationship),
            )
            .route("/:kind/:id/:rel", get(handlers::get_related))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
