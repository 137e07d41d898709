//! Path-scoped middleware chain.
//!
//! Middlewares registered with the path component `"/"` are global and run
//! for every request. Any other component scopes a middleware to requests
//! whose URL contains that component as a path segment. Global middlewares
//! always run before path-scoped ones; within each group registration order
//! is preserved.

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

use crate::error::BoxError;
use crate::{Request, ResponseHead, TransportError};

/// Path component that marks a middleware as global.
pub const GLOBAL_PATH: &str = "/";

/// Decision returned by a post-response hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostResponse {
    /// Continue with the next middleware.
    Proceed,
    /// Skip the remaining middlewares and send the request again.
    RetryRequest,
}

/// Request interceptor with a pre-request and a post-response hook.
///
/// Middlewares are shared by every request of a client and must not keep
/// per-request mutable state.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Path segment this middleware is scoped to, or `"/"` for all requests.
    fn path_component(&self) -> &str {
        GLOBAL_PATH
    }

    /// Inspect the request before it is sent. An error abandons the attempt.
    async fn pre_request(&self, _request: &Request) -> Result<(), BoxError> {
        Ok(())
    }

    /// Inspect what the transport produced and decide whether to retry.
    async fn post_response(
        &self,
        _data: Option<&Bytes>,
        _response: Option<&ResponseHead>,
        _error: Option<&TransportError>,
    ) -> Result<PostResponse, BoxError> {
        Ok(PostResponse::Proceed)
    }
}

/// Ordered set of registered middlewares.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the chain.
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Add a shared middleware to the chain.
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Number of registered middlewares.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Check whether no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Middlewares that apply to `url`: global ones first, then path-matched.
    pub fn matching(&self, url: &Url) -> Vec<&Arc<dyn Middleware>> {
        let segments: Vec<Cow<'_, str>> = url
            .path_segments()
            .map(|segments| {
                segments
                    .map(|s| percent_decode_str(s).decode_utf8_lossy())
                    .collect()
            })
            .unwrap_or_default();

        let (global, scoped): (Vec<_>, Vec<_>) = self
            .middlewares
            .iter()
            .filter(|m| {
                let component = m.path_component();
                component == GLOBAL_PATH || segments.iter().any(|s| s == component)
            })
            .partition(|m| m.path_component() == GLOBAL_PATH);

        global.into_iter().chain(scoped).collect()
    }

    /// Run the pre-request hooks for `request`, stopping at the first error.
    pub async fn run_pre_request(&self, request: &Request) -> Result<(), BoxError> {
        for middleware in self.matching(request.url()) {
            tracing::trace!(
                path_component = middleware.path_component(),
                "Running pre-request middleware"
            );
            middleware.pre_request(request).await?;
        }
        Ok(())
    }

    /// Run the post-response hooks for `request`.
    ///
    /// Returns [`PostResponse::RetryRequest`] as soon as one middleware asks
    /// for a retry; the remaining middlewares are skipped.
    pub async fn run_post_response(
        &self,
        request: &Request,
        data: Option<&Bytes>,
        response: Option<&ResponseHead>,
        error: Option<&TransportError>,
    ) -> Result<PostResponse, BoxError> {
        for middleware in self.matching(request.url()) {
            tracing::trace!(
                path_component = middleware.path_component(),
                "Running post-response middleware"
            );
            if middleware.post_response(data, response, error).await? == PostResponse::RetryRequest {
                return Ok(PostResponse::RetryRequest);
            }
        }
        Ok(PostResponse::Proceed)
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}
