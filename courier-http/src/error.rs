//! Error taxonomy surfaced to callers.

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Boxed error raised by middlewares and opaque transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for endpoint requests.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised while turning an [`Endpoint`](crate::Endpoint) into a request.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The composed URL could not be parsed into components.
    #[error("Invalid URL components: {0}")]
    Components(String),

    /// A relative path was given but no base URL is configured.
    #[error("No base URL configured for relative path {0:?}")]
    MissingBaseUrl(String),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header {name:?}: {message}")]
    InvalidHeader {
        /// Header name as supplied.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// The body could not be serialized with its encoding.
    #[error("Failed to serialize body: {0}")]
    Body(String),

    /// The multipart form has nothing to serialize.
    #[error("Multipart form has no fields")]
    InvalidFormData,
}

/// Terminal failure of an endpoint request.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The endpoint could not be turned into a valid request.
    #[error("Unable to build request from endpoint: {0}")]
    UrlGeneration(BuildError),

    /// A pre-request or post-response hook raised an error.
    #[error("Middleware error: {0}")]
    Middleware(BoxError),

    /// Middlewares kept asking for retries past the retry budget.
    #[error("Middleware max retry request reached")]
    MiddlewareMaxRetry,

    /// Response status outside the accepted range.
    #[error("Error with status code: {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Raw response body, possibly empty.
        body: Bytes,
    },

    /// The response succeeded but carried no payload.
    #[error("The request returned an empty response")]
    EmptyResponse,

    /// The payload could not be decoded into the target type.
    #[error("Failed to parse the JSON response: {0}")]
    ParsingFailed(serde_json::Error),

    /// The payload is not valid UTF-8 text.
    #[error("Unable to convert response data to string")]
    DataToString {
        /// Payload that failed to decode.
        data: Bytes,
    },

    /// The request was cancelled by the caller.
    #[error("The network request has been cancelled")]
    Cancelled,

    /// The transport could not perform the request.
    #[error("Unable to perform the request")]
    NetworkFailure,

    /// The multipart form could not be serialized.
    #[error("Multipart form data is invalid")]
    InvalidFormData,

    /// Unanticipated error passed through from a collaborator.
    #[error("Generic error: {0}")]
    Generic(BoxError),

    /// Server error payload decoded as JSON.
    #[error("Server error: {0}")]
    ParsedError(serde_json::Value),
}

impl From<BuildError> for NetworkError {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::InvalidFormData => Self::InvalidFormData,
            other => Self::UrlGeneration(other),
        }
    }
}

impl NetworkError {
    /// Get the HTTP status code if this is a status error.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Decode the body of a status error into a caller-defined error payload.
    pub fn error_body<E: DeserializeOwned>(&self) -> Option<E> {
        match self {
            Self::Status { body, .. } if !body.is_empty() => serde_json::from_slice(body).ok(),
            _ => None,
        }
    }

    /// Replace a status error carrying a JSON body with [`NetworkError::ParsedError`].
    ///
    /// Any other error is returned unchanged.
    pub fn into_parsed(self) -> Self {
        match self.error_body::<serde_json::Value>() {
            Some(value) => Self::ParsedError(value),
            None => self,
        }
    }
}
