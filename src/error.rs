//! Error types for Helium API operations.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during Helium API operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or incomplete.
    #[error("Helium configuration required: {0}")]
    Config(String),

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(ApiErrors),

    /// The request was rejected by the server (HTTP 4xx other than 404).
    #[error("client error: {0}")]
    Client(ApiErrors),

    /// The server failed to process the request (HTTP 5xx).
    #[error("server error: {0}")]
    Server(ApiErrors),

    /// A success status that does not match what the operation expected.
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// A cached-include relationship accessor was called for a relationship
    /// that was never fetched via `include`.
    #[error("relationship '{0}' was not included")]
    NotIncluded(&'static str),

    /// A required attribute is missing from the resource.
    #[error("attribute '{0}' not present")]
    NoAttribute(String),

    /// An operation needed a persisted id but the resource has none.
    #[error("resource has no id")]
    MissingId,

    /// A response document carried no primary data.
    #[error("response document has no data")]
    NoData,

    /// A polymorphic relationship returned an unrecognized resource type.
    #[error("unknown resource type '{0}'")]
    UnknownKind(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Classify a non-expected HTTP status into an error.
    ///
    /// 404 maps to [`Error::NotFound`], other 4xx to [`Error::Client`],
    /// 5xx to [`Error::Server`]. Anything else (a success code the caller
    /// did not expect) becomes [`Error::UnexpectedStatus`].
    pub fn classify(status: u16, body: Option<&[u8]>) -> Self {
        match status {
            404 => Error::NotFound(ApiErrors::from_body(status, body)),
            400..=499 => Error::Client(ApiErrors::from_body(status, body)),
            500..=599 => Error::Server(ApiErrors::from_body(status, body)),
            other => Error::UnexpectedStatus(other),
        }
    }
}

/// One entry of a JSONAPI `errors` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorEntry {
    /// Short summary of the problem.
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable explanation.
    #[serde(default)]
    pub detail: Option<String>,
    /// Status code as reported inside the error entry.
    #[serde(default)]
    pub status: Option<String>,
}

/// The decoded error payload of a failed response.
#[derive(Debug, Clone)]
pub struct ApiErrors {
    /// The HTTP status code of the response.
    pub status: u16,
    /// The server-provided error list, empty if the body had none.
    pub errors: Vec<ApiErrorEntry>,
    /// Primary human-readable message.
    pub message: String,
}

const NO_MESSAGE: &str = "[no message]";

impl ApiErrors {
    /// Decode the `errors` array from a response body.
    ///
    /// A body that is not JSON, or that has no `errors` array, degrades to
    /// the raw body text (or a placeholder) as the message.
    pub fn from_body(status: u16, body: Option<&[u8]>) -> Self {
        let errors = body
            .and_then(|b| serde_json::from_slice::<serde_json::Value>(b).ok())
            .and_then(|v| {
                v.get("errors")
                    .cloned()
                    .and_then(|e| serde_json::from_value::<Vec<ApiErrorEntry>>(e).ok())
            })
            .unwrap_or_default();

        let message = errors
            .first()
            .and_then(|e| e.detail.clone())
            .unwrap_or_else(|| {
                body.filter(|b| !b.is_empty())
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_else(|| NO_MESSAGE.to_string())
            });

        Self {
            status,
            errors,
            message,
        }
    }
}

impl std::fmt::Display for ApiErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

/// Result type alias for Helium operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let body = br#"{"errors":[{"detail":"sensor not found","status":"404"}]}"#;
        match Error::classify(404, Some(body)) {
            Error::NotFound(errors) => {
                assert_eq!(errors.status, 404);
                assert_eq!(errors.message, "sensor not found");
                assert_eq!(errors.errors.len(), 1);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_client_and_server() {
        assert!(matches!(Error::classify(422, None), Error::Client(_)));
        assert!(matches!(Error::classify(500, None), Error::Server(_)));
        assert!(matches!(
            Error::classify(200, None),
            Error::UnexpectedStatus(200)
        ));
    }

    #[test]
    fn test_malformed_body_degrades_to_text() {
        let errors = ApiErrors::from_body(400, Some(b"not json at all"));
        assert_eq!(errors.message, "not json at all");
        assert!(errors.errors.is_empty());
    }

    #[test]
    fn test_missing_body_uses_placeholder() {
        let errors = ApiErrors::from_body(500, None);
        assert_eq!(errors.message, NO_MESSAGE);
    }

    #[test]
    fn test_errors_without_detail_fall_back() {
        let body = br#"{"errors":[{"title":"Bad Request"}]}"#;
        let errors = ApiErrors::from_body(400, Some(body));
        assert_eq!(errors.errors.len(), 1);
        // No detail on the first error; message falls back to the raw body.
        assert!(errors.message.contains("Bad Request"));
    }
}
