//! Ready-made middlewares.

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use http::header::HeaderName;

use crate::error::BoxError;
use crate::middleware::{GLOBAL_PATH, Middleware, PostResponse};
use crate::{Request, ResponseHead, TransportError};

/// Logging middleware that logs requests and responses.
pub struct LoggingMiddleware {
    path_component: String,
    log_headers: bool,
}

impl LoggingMiddleware {
    /// Create a new global logging middleware.
    pub fn new() -> Self {
        Self {
            path_component: GLOBAL_PATH.to_string(),
            log_headers: false,
        }
    }

    /// Scope the middleware to a path segment.
    pub fn for_path(mut self, component: impl Into<String>) -> Self {
        self.path_component = component.into();
        self
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn path_component(&self) -> &str {
        &self.path_component
    }

    async fn pre_request(&self, request: &Request) -> Result<(), BoxError> {
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in request.headers() {
                tracing::trace!(header = %name, value = ?value, "Request header");
            }
        }

        Ok(())
    }

    async fn post_response(
        &self,
        data: Option<&Bytes>,
        response: Option<&ResponseHead>,
        error: Option<&TransportError>,
    ) -> Result<PostResponse, BoxError> {
        if let Some(error) = error {
            tracing::debug!(error = %error, "HTTP request failed");
        }

        if let Some(response) = response {
            tracing::debug!(
                status = %response.status(),
                bytes = data.map(Bytes::len).unwrap_or(0),
                "Received HTTP response"
            );

            if self.log_headers {
                for (name, value) in response.headers() {
                    tracing::trace!(header = %name, value = ?value, "Response header");
                }
            }
        }

        Ok(PostResponse::Proceed)
    }
}

/// Requests a retry whenever the response status is one of the given codes.
///
/// The client caps how many retries a logical request may make, so this
/// never loops forever.
pub struct RetryOnStatusMiddleware {
    path_component: String,
    statuses: Vec<StatusCode>,
}

impl RetryOnStatusMiddleware {
    /// Retry on any of `statuses`.
    pub fn new(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            path_component: GLOBAL_PATH.to_string(),
            statuses: statuses.into_iter().collect(),
        }
    }

    /// Retry on 502, 503 and 504.
    pub fn gateway_errors() -> Self {
        Self::new([
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GATEWAY_TIMEOUT,
        ])
    }

    /// Scope the middleware to a path segment.
    pub fn for_path(mut self, component: impl Into<String>) -> Self {
        self.path_component = component.into();
        self
    }
}

#[async_trait]
impl Middleware for RetryOnStatusMiddleware {
    fn path_component(&self) -> &str {
        &self.path_component
    }

    async fn post_response(
        &self,
        _data: Option<&Bytes>,
        response: Option<&ResponseHead>,
        _error: Option<&TransportError>,
    ) -> Result<PostResponse, BoxError> {
        match response {
            Some(response) if self.statuses.contains(&response.status()) => {
                tracing::debug!(status = %response.status(), "Requesting retry for status");
                Ok(PostResponse::RetryRequest)
            }
            _ => Ok(PostResponse::Proceed),
        }
    }
}

/// Rejects requests that do not carry a given header.
pub struct RequireHeaderMiddleware {
    path_component: String,
    header: HeaderName,
}

impl RequireHeaderMiddleware {
    /// Require `header` on every request.
    pub fn new(header: HeaderName) -> Self {
        Self {
            path_component: GLOBAL_PATH.to_string(),
            header,
        }
    }

    /// Scope the middleware to a path segment.
    pub fn for_path(mut self, component: impl Into<String>) -> Self {
        self.path_component = component.into();
        self
    }
}

#[async_trait]
impl Middleware for RequireHeaderMiddleware {
    fn path_component(&self) -> &str {
        &self.path_component
    }

    async fn pre_request(&self, request: &Request) -> Result<(), BoxError> {
        if request.headers().contains_key(&self.header) {
            Ok(())
        } else {
            Err(format!("missing required header {}", self.header).into())
        }
    }
}
