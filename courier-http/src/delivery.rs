//! Callback and blocking delivery of request outcomes.
//!
//! Both shapes drive the same engine as [`Client::request`]: the callback
//! path spawns it on a runtime, and the blocking path waits on the callback
//! through a one-shot channel.

use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Client, ClientConfig, Decode, Endpoint, NetworkError, Outcome, ProgressIndicator, Result};

/// Per-call options.
#[derive(Clone, Default)]
pub struct CallOptions {
    cancel: CancellationToken,
    progress: Option<Arc<dyn ProgressIndicator>>,
}

impl CallOptions {
    /// Options with a fresh cancellation token and no progress indicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the call through `token`.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report attempt start and settle to `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn progress(&self) -> Option<&Arc<dyn ProgressIndicator>> {
        self.progress.as_ref()
    }
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Handle to a request started with [`Client::dispatch`].
#[derive(Debug)]
pub struct RequestHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// Cancel the request. The callback still runs, with
    /// [`NetworkError::Cancelled`] unless the request already settled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check whether the callback has run.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the callback has run.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Request task failed");
        }
    }
}

impl Client {
    /// Start `endpoint` on `runtime` and pass the outcome to `callback`.
    ///
    /// The callback runs exactly once, on the given runtime.
    pub fn dispatch<D, F>(
        &self,
        endpoint: Endpoint,
        options: CallOptions,
        runtime: &Handle,
        callback: F,
    ) -> RequestHandle
    where
        D: Decode + Send + 'static,
        F: FnOnce(Outcome<D>) + Send + 'static,
    {
        let client = self.clone();
        let cancel = options.cancel_token().clone();
        let task = runtime.spawn(async move {
            let outcome = client.request_with::<D>(&endpoint, &options).await;
            callback(outcome);
        });
        RequestHandle { cancel, task }
    }
}

/// Blocking wrapper around [`Client`].
///
/// Owns a runtime for the requests and must not be used from inside an
/// async context.
pub struct BlockingClient {
    client: Client,
    runtime: Runtime,
}

impl BlockingClient {
    /// Create a blocking client with the default transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_client(Client::new(config)?)
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("courier-http-blocking")
            .enable_all()
            .build()
            .map_err(|e| NetworkError::Generic(Box::new(e)))?;
        Ok(Self { client, runtime })
    }

    /// Get the wrapped client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send `endpoint` and block until the decoded payload is available.
    pub fn request<D: Decode + Send + 'static>(&self, endpoint: &Endpoint) -> Result<D> {
        self.request_with(endpoint, CallOptions::default())
            .into_result()
    }

    /// Send `endpoint` with per-call options and block for the outcome.
    pub fn request_with<D: Decode + Send + 'static>(
        &self,
        endpoint: &Endpoint,
        options: CallOptions,
    ) -> Outcome<D> {
        let (tx, rx) = oneshot::channel();
        self.client
            .dispatch(endpoint.clone(), options, self.runtime.handle(), move |outcome| {
                let _ = tx.send(outcome);
            });

        match rx.blocking_recv() {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!("Request task ended without delivering an outcome");
                Outcome::failure(NetworkError::NetworkFailure, None, None)
            }
        }
    }
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("client", &self.client)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::ScriptedTransport;
    use crate::{Json, NetworkError};
    use bytes::Bytes;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn client(transport: &Arc<ScriptedTransport>) -> Client {
        Client::builder(ClientConfig::new("https://api.example.com"))
            .transport(Arc::clone(transport))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_invokes_callback_once() {
        let transport = Arc::new(ScriptedTransport::new(&[(200, "[1,2,3]")]));
        let (tx, rx) = oneshot::channel();

        let handle = client(&transport).dispatch::<Json<Vec<u32>>, _>(
            Endpoint::get("/numbers"),
            CallOptions::new(),
            &Handle::current(),
            move |outcome| {
                let _ = tx.send(outcome.into_result());
            },
        );

        let Json(numbers) = rx.await.unwrap().unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);
        handle.join().await;
    }

    #[tokio::test]
    async fn test_dispatch_cancel() {
        let transport = Arc::new(
            ScriptedTransport::new(&[(200, "late")]).with_delay(Duration::from_secs(30)),
        );
        let (tx, rx) = oneshot::channel();

        let handle = client(&transport).dispatch::<Bytes, _>(
            Endpoint::get("/slow"),
            CallOptions::new(),
            &Handle::current(),
            move |outcome| {
                let _ = tx.send(outcome.into_result());
            },
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        assert!(matches!(rx.await.unwrap(), Err(NetworkError::Cancelled)));
    }

    #[test]
    fn test_blocking_request() {
        let transport = Arc::new(ScriptedTransport::new(&[(200, "hello"), (500, "boom")]));
        let blocking = BlockingClient::from_client(client(&transport)).unwrap();

        let text: String = blocking.request(&Endpoint::get("/greeting")).unwrap();
        assert_eq!(text, "hello");

        let outcome = blocking.request_with::<String>(&Endpoint::get("/broken"), CallOptions::new());
        assert_eq!(
            outcome.result.unwrap_err().status_code(),
            Some(http::StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
