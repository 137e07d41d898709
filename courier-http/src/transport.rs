//! Transport collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::error::BoxError;
use crate::{ClientConfig, NetworkError, Request, ResponseHead};

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The call timed out.
    #[error("Request timed out")]
    Timeout,

    /// No connection could be established.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Other(BoxError),
}

impl TransportError {
    /// Map the transport failure into the caller-facing taxonomy.
    pub(crate) fn into_network_error(self) -> NetworkError {
        match self {
            Self::Cancelled => NetworkError::Cancelled,
            Self::Timeout | Self::Connect(_) => NetworkError::NetworkFailure,
            Self::Other(e) => NetworkError::Generic(e),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Other(Box::new(error))
        }
    }
}

/// What one transport call produced.
///
/// Any combination of the three parts may be present: a transport can fail
/// after the response head arrived, in which case both `response` and
/// `error` are set.
#[derive(Debug, Default)]
pub struct TransportOutcome {
    /// Response body.
    pub data: Option<Bytes>,
    /// Response metadata.
    pub response: Option<ResponseHead>,
    /// Transport failure.
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    /// Successful exchange.
    pub fn success(response: ResponseHead, data: Bytes) -> Self {
        Self {
            data: Some(data),
            response: Some(response),
            error: None,
        }
    }

    /// Failed exchange.
    pub fn failure(error: TransportError) -> Self {
        Self {
            data: None,
            response: None,
            error: Some(error),
        }
    }
}

/// Executes one request attempt.
///
/// Dropping the returned future cancels the call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and collect the response.
    async fn execute(&self, request: Request) -> TransportOutcome;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent);

        if config.gzip {
            builder = builder.gzip(true);
        }
        if config.brotli {
            builder = builder.brotli(true);
        }
        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    fn to_reqwest(&self, request: Request) -> reqwest::Request {
        let mut out = reqwest::Request::new(request.method().clone(), request.url().clone());
        *out.headers_mut() = request.headers().clone();
        if let Some(body) = request.body() {
            *out.body_mut() = Some(reqwest::Body::from(body.clone()));
        }
        out
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> TransportOutcome {
        let response = match self.inner.execute(self.to_reqwest(request)).await {
            Ok(response) => response,
            Err(e) => return TransportOutcome::failure(e.into()),
        };

        let head = ResponseHead::new(
            response.status(),
            response.headers().clone(),
            response.url().clone(),
        );

        match response.bytes().await {
            Ok(data) => TransportOutcome::success(head, data),
            Err(e) => TransportOutcome {
                data: None,
                response: Some(head),
                error: Some(e.into()),
            },
        }
    }
}
