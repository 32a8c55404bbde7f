//! The client handle and request dispatch.
//!
//! [`PubSubClient`] owns one pooled `reqwest` client plus the retry runner
//! and cancellation token shared by every call. Each logical operation goes
//! through [`PubSubClient::call`]: the URL is expanded from the operation's
//! template, the API key header is attached (except for the token
//! exchange), exactly one HTTP request is sent per attempt, and the raw
//! response is handed to the classifier.
//!
//! Transport-level failures, including per-attempt timeouts, surface as
//! [`PubSubError::Connection`] and are therefore retryable.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::config::ClientConfig;
use crate::client::retry::{RetryObserver, RetryPolicy, RetryRunner, Sleeper};
use crate::error::{PubSubError, Result};
use crate::protocol::{classify, constants, Operation};

/// Asynchronous client for the messaging service.
///
/// Cloning is cheap and clones share the connection pool, the retry
/// plumbing and the cancellation token.
///
/// ```
/// use pubsub_http_client::{ClientConfig, PubSubClient};
///
/// let client = PubSubClient::new(ClientConfig::new(
///     "https://msg.example.org",
///     "TEST",
///     "s3cr3t",
/// ));
/// assert_eq!(client.config().project, "TEST");
/// ```
#[derive(Debug, Clone)]
pub struct PubSubClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    retry: RetryRunner,
    cancel: CancellationToken,
}

impl PubSubClient {
    /// Create a client from a configuration carrying an API key.
    ///
    /// For certificate-based construction use
    /// [`connect`](PubSubClient::connect).
    pub fn new(config: ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_total_connections as usize);

        if !config.proxy_url.is_empty() {
            if let Ok(proxy) = reqwest::Proxy::all(&config.proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let http = builder.build().unwrap_or_default();

        PubSubClient {
            http,
            config: Arc::new(config),
            retry: RetryRunner::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A handle that cancels in-flight and future retried calls when
    /// [`cancel`](CancellationToken::cancel) is invoked on it.
    ///
    /// The handle is shared with every clone of this client. Cancelled
    /// calls fail with [`PubSubError::Cancelled`].
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replace the sleeper the retry coordinator waits with.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry.sleeper = sleeper;
        self
    }

    /// Replace the observer notified on every retry.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.retry.observer = observer;
        self
    }

    /// URL for an operation on a project-scoped resource.
    pub(crate) fn project_url(&self, op: Operation, resource: &str) -> String {
        op.url(&[&self.config.endpoint, &self.config.project, resource])
    }

    /// URL for an operation addressed at the service origin only.
    pub(crate) fn origin_url(&self, op: Operation) -> String {
        op.url(&[&self.config.endpoint])
    }

    /// URL for a user-scoped operation.
    pub(crate) fn user_url(&self, op: Operation, name: &str) -> String {
        op.url(&[&self.config.endpoint, name])
    }

    /// Run `op` against `url` under `policy`.
    pub(crate) async fn call(
        &self,
        op: Operation,
        url: String,
        body: Option<String>,
        policy: &RetryPolicy,
    ) -> Result<Value> {
        self.retry
            .run(op, policy, &self.cancel, || {
                self.dispatch(op, &url, body.as_deref(), policy.per_call_timeout())
            })
            .await
    }

    /// One network attempt: send the request, classify the response.
    async fn dispatch(
        &self,
        op: Operation,
        url: &str,
        body: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let mut request = self.http.request(op.verb(), url);

        if !op.skips_api_key() {
            request = request.header(constants::headers::API_KEY, &self.config.token);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| connection_error(op, &e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| connection_error(op, &e))?;

        classify(op, status, &bytes)
    }
}

pub(crate) fn connection_error(op: Operation, e: &reqwest::Error) -> PubSubError {
    PubSubError::Connection {
        operation: op.name(),
        detail: e.to_string(),
    }
}

/// Decode a classified success payload into a typed response.
pub(crate) fn decode_payload<T: serde::de::DeserializeOwned>(
    op: Operation,
    value: Value,
) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        PubSubError::Message(format!("unexpected [{}] response shape: {e}", op.name()))
    })
}

/// Serialize a request body, mapping encoder failures onto the payload
/// error kind.
pub(crate) fn encode_body<T: serde::Serialize>(op: Operation, body: &T) -> Result<String> {
    serde_json::to_string(body).map_err(|e| {
        PubSubError::Message(format!("failed to encode [{}] request body: {e}", op.name()))
    })
}

/// Append query pairs to an absolute URL, percent-encoding the values.
pub(crate) fn append_query(url: &str, pairs: &[(&str, String)]) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            {
                let mut query = parsed.query_pairs_mut();
                for (key, value) in pairs {
                    query.append_pair(key, value);
                }
            }
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}
