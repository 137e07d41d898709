//! # Courier HTTP
//!
//! An endpoint-driven HTTP client. Calls are described declaratively with
//! [`Endpoint`] values; the [`Client`] turns each one into a request, runs it
//! through a path-scoped middleware chain, sends it and maps the response to
//! a typed result.
//!
//! ## Features
//!
//! - **Endpoints**: Path, method, headers, query, JSON/form/text bodies and multipart forms
//! - **Middlewares**: Global and path-scoped pre-request and post-response hooks
//! - **Bounded Retry**: Middlewares may ask for a retry, at most twice per request
//! - **Typed Results**: Raw bytes, UTF-8 text, JSON via serde, or no payload
//! - **Delivery**: `async`/`await`, callbacks on a chosen runtime, or blocking calls
//! - **Cancellation**: Cancel in-flight requests with a `CancellationToken`
//! - **Debug Output**: curl reconstructions of every attempt
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http::{Client, ClientConfig, Endpoint, Json};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new("https://api.example.com"))?;
//!
//!     let Json(user) = client
//!         .request::<Json<User>>(&Endpoint::get("/users/1"))
//!         .await?;
//!
//!     println!("{} is {}", user.id, user.name);
//!     Ok(())
//! }
//! ```
//!
//! ## With Middlewares
//!
//! ```rust,no_run
//! use courier_http::{
//!     Body, Client, ClientConfig, Endpoint, LoggingMiddleware, RetryOnStatusMiddleware,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://api.example.com")
//!         .header("X-Api-Key", "secret")
//!         .debug(true)
//!         .build();
//!
//!     let client = Client::builder(config)
//!         .middleware(LoggingMiddleware::new())
//!         .middleware(RetryOnStatusMiddleware::gateway_errors().for_path("orders"))
//!         .build()?;
//!
//!     let endpoint = Endpoint::post("/orders")
//!         .body(Body::json(&serde_json::json!({"item": "widget", "quantity": 5}))?);
//!
//!     // Endpoints that return nothing on success decode into `()`
//!     client.request::<()>(&endpoint).await?;
//!     Ok(())
//! }
//! ```

mod body;
mod builtin;
mod client;
mod config;
mod delivery;
mod endpoint;
mod error;
mod middleware;
mod multipart;
mod progress;
mod response;
mod transport;

pub mod curl;
pub mod request;

pub use body::{Body, BodyEncoding};
pub use builtin::{LoggingMiddleware, RequireHeaderMiddleware, RetryOnStatusMiddleware};
pub use client::{Client, ClientBuilder, MAX_RETRIES};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use delivery::{BlockingClient, CallOptions, RequestHandle};
pub use endpoint::Endpoint;
pub use error::{BoxError, BuildError, NetworkError, Result};
pub use middleware::{GLOBAL_PATH, Middleware, MiddlewareChain, PostResponse};
pub use multipart::MultipartForm;
pub use progress::ProgressIndicator;
pub use request::Request;
pub use response::{Decode, Json, Outcome, ResponseHead};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportOutcome};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use courier_http::prelude::*;
/// ```
pub mod prelude {
    pub use crate::body::{Body, BodyEncoding};
    pub use crate::client::Client;
    pub use crate::config::ClientConfig;
    pub use crate::delivery::{BlockingClient, CallOptions};
    pub use crate::endpoint::Endpoint;
    pub use crate::error::{NetworkError, Result};
    pub use crate::middleware::{Middleware, PostResponse};
    pub use crate::multipart::MultipartForm;
    pub use crate::response::{Json, Outcome};
    pub use http::{Method, StatusCode};
}
