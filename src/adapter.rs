//! Transport adapters.
//!
//! The core resource, relationship and timeseries logic is written against
//! the [`Adapter`] trait: perform one HTTP request, get back a uniform
//! response descriptor. The default implementation is a reqwest-backed
//! adapter; tests can inject their own.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("helium-api/", env!("CARGO_PKG_VERSION"));

/// A stream of raw body chunks from a server-push endpoint.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// A uniform response descriptor produced by an [`Adapter`].
#[derive(Debug)]
pub struct ApiResponse {
    /// Numeric HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body, `None` or empty on bodiless responses.
    pub body: Option<Vec<u8>>,
}

impl ApiResponse {
    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            Some(body) if !body.is_empty() => serde_json::from_slice(body).map_err(Error::from),
            _ => Err(Error::NoData),
        }
    }
}

/// The transport capability the core operates against.
///
/// Every network-issuing operation in the library goes through an adapter,
/// making each call a potential suspension point. A synchronous caller can
/// satisfy the same API by blocking on the returned futures; the resource
/// logic never assumes either model.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Perform one HTTP request and return the response descriptor.
    async fn request(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse>;

    /// Open a streaming GET, yielding raw body chunks as they arrive.
    ///
    /// Used by the live timeseries endpoint. The connection is released
    /// when the returned stream is dropped.
    async fn stream(&self, url: Url, query: &[(String, String)]) -> Result<ByteStream>;
}

/// The default reqwest-backed adapter.
///
/// Sets the JSON `Accept`/`Content-Type` headers, the library user agent,
/// and the API token as the `Authorization` header on every request, and
/// applies a coarse request timeout. Cancellation beyond that is the
/// caller's concern.
pub struct HttpAdapter {
    http: reqwest::Client,
}

impl HttpAdapter {
    /// Build an adapter authenticating with the given API token.
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(token)
                .map_err(|_| Error::Config("API token is not a valid header value".to_string()))?,
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { http })
    }
}

impl std::fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdapter").finish_non_exhaustive()
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
    async fn request(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(Error::Http)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::Http)?;
        let body = if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        };

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    async fn stream(&self, url: Url, query: &[(String, String)]) -> Result<ByteStream> {
        // The client-level timeout covers the entire body read, which would
        // cut off a long-lived live connection. Lift it for streaming.
        let mut request = self.http.get(url).timeout(Duration::from_secs(60 * 60 * 24));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(Error::Http)?;
        let status = response.status().as_u16();
        if status != 200 {
            let body = response.bytes().await.ok().map(|b| b.to_vec());
            return Err(Error::classify(status, body.as_deref()));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(Error::Http));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_rejects_invalid_token() {
        let result = HttpAdapter::new("bad\ntoken");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_response_json_on_empty_body() {
        let response = ApiResponse {
            status: 204,
            headers: HeaderMap::new(),
            body: None,
        };
        let result: Result<serde_json::Value> = response.json();
        assert!(matches!(result, Err(Error::NoData)));
    }
}
