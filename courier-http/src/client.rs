//! Request execution engine.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::curl;
use crate::delivery::CallOptions;
use crate::progress::ProgressGuard;
use crate::request;
use crate::{
    ClientConfig, Decode, Endpoint, Middleware, MiddlewareChain, NetworkError, Outcome,
    PostResponse, ReqwestTransport, Result, Transport, TransportError, TransportOutcome,
};

/// Retries allowed after the initial attempt of a logical request.
pub const MAX_RETRIES: u32 = 2;

/// Endpoint-driven HTTP client.
///
/// Cloning is cheap; clones share the configuration, middlewares and
/// transport, none of which change after construction.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    middlewares: Arc<MiddlewareChain>,
}

enum Attempt {
    Done(Outcome<Bytes>),
    Retry,
}

impl Client {
    /// Create a client with the default `reqwest` transport and no middlewares.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a client.
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            middlewares: MiddlewareChain::new(),
            transport: None,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the registered middlewares.
    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Send `endpoint` and decode the payload into `D`.
    pub async fn request<D: Decode>(&self, endpoint: &Endpoint) -> Result<D> {
        self.request_with(endpoint, &CallOptions::default())
            .await
            .into_result()
    }

    /// Send `endpoint` with per-call options, keeping the final metadata.
    pub async fn request_with<D: Decode>(
        &self,
        endpoint: &Endpoint,
        options: &CallOptions,
    ) -> Outcome<D> {
        self.execute(endpoint, options).await.decode()
    }

    /// Run the full pipeline for `endpoint` and return the raw payload.
    ///
    /// Each attempt rebuilds the request and reruns the middlewares. A retry
    /// is only made when a post-response middleware asks for one, and at most
    /// [`MAX_RETRIES`] times.
    pub async fn execute(&self, endpoint: &Endpoint, options: &CallOptions) -> Outcome<Bytes> {
        let mut attempt = 0;
        loop {
            match self.attempt(endpoint, options, attempt).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry => attempt += 1,
            }
        }
    }

    async fn attempt(&self, endpoint: &Endpoint, options: &CallOptions, attempt: u32) -> Attempt {
        if options.cancel_token().is_cancelled() {
            return Attempt::Done(Outcome::failure(NetworkError::Cancelled, None, None));
        }

        let request = match request::build(endpoint, &self.config) {
            Ok(request) => request,
            Err(e) => {
                warn!(path = endpoint.path(), error = %e, "Failed to build request");
                return Attempt::Done(Outcome::failure(e.into(), None, None));
            }
        };

        if attempt > MAX_RETRIES {
            warn!(url = %request.url(), attempts = attempt, "Retry budget exhausted");
            return Attempt::Done(Outcome::failure(
                NetworkError::MiddlewareMaxRetry,
                Some(request),
                None,
            ));
        }

        let use_middlewares = endpoint.allow_middlewares() && !self.middlewares.is_empty();

        if use_middlewares && let Err(e) = self.middlewares.run_pre_request(&request).await {
            warn!(url = %request.url(), error = %e, "Pre-request middleware failed");
            return Attempt::Done(Outcome::failure(
                NetworkError::Middleware(e),
                Some(request),
                None,
            ));
        }

        debug!(
            method = %request.method(),
            url = %request.url(),
            attempt = attempt + 1,
            "Sending request"
        );

        let outcome = {
            let _progress = ProgressGuard::show(options.progress());
            tokio::select! {
                biased;
                _ = options.cancel_token().cancelled() => None,
                outcome = self.transport.execute(request.clone()) => Some(outcome),
            }
        };

        let Some(TransportOutcome {
            data,
            response,
            error,
        }) = outcome
        else {
            debug!(url = %request.url(), "Request cancelled in flight");
            return Attempt::Done(Outcome::failure(NetworkError::Cancelled, Some(request), None));
        };

        if self.config.debug {
            curl::log_exchange(&request, response.as_ref(), data.as_ref());
        }

        if matches!(error, Some(TransportError::Cancelled)) {
            return Attempt::Done(Outcome::failure(
                NetworkError::Cancelled,
                Some(request),
                response,
            ));
        }

        if use_middlewares {
            let decision = self
                .middlewares
                .run_post_response(&request, data.as_ref(), response.as_ref(), error.as_ref())
                .await;
            match decision {
                Ok(PostResponse::Proceed) => {}
                Ok(PostResponse::RetryRequest) => {
                    debug!(url = %request.url(), attempt = attempt + 1, "Middleware requested retry");
                    return Attempt::Retry;
                }
                Err(e) => {
                    warn!(url = %request.url(), error = %e, "Post-response middleware failed");
                    return Attempt::Done(Outcome::failure(
                        NetworkError::Middleware(e),
                        Some(request),
                        response,
                    ));
                }
            }
        }

        let result = self.validate(data, response.as_ref(), error);
        Attempt::Done(Outcome {
            result,
            request: Some(request),
            response,
        })
    }

    fn validate(
        &self,
        data: Option<Bytes>,
        response: Option<&crate::ResponseHead>,
        error: Option<TransportError>,
    ) -> Result<Bytes> {
        if let Some(error) = error {
            warn!(error = %error, "Transport error");
            return Err(error.into_network_error());
        }

        let Some(response) = response else {
            error!("Transport reported neither a response nor an error");
            return Err(NetworkError::NetworkFailure);
        };

        let status = response.status();
        if !self.config.accepts(status.as_u16()) {
            return Err(NetworkError::Status {
                status,
                body: data.unwrap_or_default(),
            });
        }

        match data {
            Some(data) if !data.is_empty() => Ok(data),
            _ => Err(NetworkError::EmptyResponse),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("middlewares", &self.middlewares)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    middlewares: MiddlewareChain,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Register a middleware. Registration order is dispatch order within
    /// the global and path-scoped groups.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares = self.middlewares.with_middleware(middleware);
        self
    }

    /// Register a shared middleware.
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Use a custom transport instead of `reqwest`.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(&self.config)
                    .map_err(|e| NetworkError::Generic(Box::new(e)))?,
            ),
        };

        Ok(Client {
            transport,
            config: Arc::new(self.config),
            middlewares: Arc::new(self.middlewares),
        })
    }
}
