//! Session with the Helium API.
//!
//! A [`Session`] is a cheaply cloneable handle pairing a transport
//! [`Adapter`] with a base URL. It offers the request helpers the resource
//! engine builds on, plus convenience accessors for the "roots" of Helium
//! resources (sensors, labels, elements, the authorized user and
//! organization).

use std::env;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::adapter::{Adapter, ApiResponse, ByteStream, HttpAdapter};
use crate::error::{Error, Result};
use crate::jsonapi::Document;
use crate::models::{Element, Label, Organization, Sensor, User};
use crate::resource::Resource;

const DEFAULT_API_URL: &str = "https://api.helium.com/v1";

/// A session with the Helium service.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// adapter. Resources constructed from responses keep a clone of the
/// session that fetched them and handle further requests independently.
///
/// # Example
///
/// ```no_run
/// use helium_api::Session;
///
/// # async fn example() -> helium_api::Result<()> {
/// // Create from environment variables
/// let session = Session::from_env()?;
///
/// // Or configure manually
/// let session = Session::new("your-api-token", "https://api.helium.com/v1")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    adapter: Arc<dyn Adapter>,
    base_url: Arc<Url>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session from environment variables.
    ///
    /// Uses `HELIUM_API_KEY` for authentication and optionally
    /// `HELIUM_API_URL` for the base URL (defaults to
    /// `https://api.helium.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if `HELIUM_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let token = env::var("HELIUM_API_KEY").map_err(|_| {
            Error::Config("HELIUM_API_KEY environment variable not set".to_string())
        })?;

        let base_url = env::var("HELIUM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(&token, &base_url)
    }

    /// Create a new session with the provided token and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let adapter = HttpAdapter::new(token)?;
        Self::with_adapter(Arc::new(adapter), base_url)
    }

    /// Create a session with an injected adapter.
    ///
    /// This is the seam for alternate transports: anything implementing
    /// [`Adapter`] can stand in for the default HTTP adapter.
    pub fn with_adapter(adapter: Arc<dyn Adapter>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            adapter,
            base_url: Arc::new(base_url),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    pub(crate) fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.as_str().trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        Url::parse(&url).map_err(Error::from)
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self, query))]
    pub(crate) async fn get(&self, url: Url, query: &[(String, String)]) -> Result<ApiResponse> {
        self.adapter.request(Method::GET, url, query, None).await
    }

    /// Make a POST request with an optional JSON body.
    #[tracing::instrument(skip(self, body))]
    pub(crate) async fn post(&self, url: Url, body: Option<Value>) -> Result<ApiResponse> {
        self.adapter.request(Method::POST, url, &[], body).await
    }

    /// Make a PATCH request with an optional JSON body.
    #[tracing::instrument(skip(self, body))]
    pub(crate) async fn patch(&self, url: Url, body: Option<Value>) -> Result<ApiResponse> {
        self.adapter.request(Method::PATCH, url, &[], body).await
    }

    /// Make a PUT request with an optional JSON body.
    #[tracing::instrument(skip(self, body))]
    pub(crate) async fn put(&self, url: Url, body: Option<Value>) -> Result<ApiResponse> {
        self.adapter.request(Method::PUT, url, &[], body).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub(crate) async fn delete(&self, url: Url) -> Result<ApiResponse> {
        self.adapter.request(Method::DELETE, url, &[], None).await
    }

    /// Open a streaming GET for a server-push endpoint.
    #[tracing::instrument(skip(self, query))]
    pub(crate) async fn stream(&self, url: Url, query: &[(String, String)]) -> Result<ByteStream> {
        self.adapter.stream(url, query).await
    }

    /// Fetch all sensors for the authorized API key.
    pub async fn sensors(&self) -> Result<Vec<Sensor>> {
        Sensor::all(self, &[]).await
    }

    /// Find a single sensor by its UUID.
    pub async fn sensor(&self, id: &str) -> Result<Sensor> {
        Sensor::find(self, id, &[]).await
    }

    /// Fetch all labels for the authorized API key.
    pub async fn labels(&self) -> Result<Vec<Label>> {
        Label::all(self, &[]).await
    }

    /// Find a single label by its UUID.
    pub async fn label(&self, id: &str) -> Result<Label> {
        Label::find(self, id, &[]).await
    }

    /// Fetch all elements for the authorized API key.
    pub async fn elements(&self) -> Result<Vec<Element>> {
        Element::all(self, &[]).await
    }

    /// Find a single element by its UUID.
    pub async fn element(&self, id: &str) -> Result<Element> {
        Element::find(self, id, &[]).await
    }

    /// Get the user for the authorized API key.
    pub async fn authorized_user(&self) -> Result<User> {
        User::singleton(self, &[]).await
    }

    /// Get the organization for the authorized API key.
    pub async fn authorized_organization(&self) -> Result<Organization> {
        Organization::singleton(self, &[]).await
    }
}

/// Interpret a response expected to carry a JSONAPI document.
///
/// A status other than `code` is classified into an error. An empty body
/// on success yields an empty document.
pub(crate) fn expect_document(response: &ApiResponse, code: u16) -> Result<Document> {
    if response.status != code {
        return Err(Error::classify(response.status, response.body.as_deref()));
    }
    match &response.body {
        Some(body) if !body.is_empty() => serde_json::from_slice(body).map_err(Error::from),
        _ => Ok(Document::default()),
    }
}

/// Interpret a response by status alone.
///
/// Returns `Ok(true)` on `code`, `Ok(false)` on `false_code` (the "accepted
/// but unchanged" signal used by relationship mutation), and a classified
/// error on anything else.
pub(crate) fn expect_status(
    response: &ApiResponse,
    code: u16,
    false_code: Option<u16>,
) -> Result<bool> {
    if response.status == code {
        return Ok(true);
    }
    if false_code == Some(response.status) {
        return Ok(false);
    }
    Err(Error::classify(response.status, response.body.as_deref()))
}
