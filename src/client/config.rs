//! Client configuration.

use std::path::PathBuf;

/// Configuration for [`PubSubClient`](crate::PubSubClient).
///
/// `endpoint` is a full origin (scheme, host, optional port), so plain-HTTP
/// test servers work as well as production HTTPS deployments. Authentication
/// uses `token` when set; otherwise [`PubSubClient::connect`] exchanges the
/// `cert`/`key` pair for a token against the authentication service on
/// `authn_port`.
///
/// # Examples
///
/// ```
/// use pubsub_http_client::ClientConfig;
///
/// // The common case: endpoint, project and API key.
/// let config = ClientConfig::new("https://msg.example.org", "TEST", "s3cr3t");
///
/// // Tuning knobs via struct update syntax.
/// let config = ClientConfig {
///     request_timeout_ms: 5_000,
///     ..ClientConfig::new("https://msg.example.org", "TEST", "s3cr3t")
/// };
/// assert_eq!(config.project, "TEST");
/// ```
///
/// [`PubSubClient::connect`]: crate::PubSubClient::connect
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service origin, e.g. `https://msg.example.org`.
    pub endpoint: String,
    /// Project namespace all topic and subscription calls operate in.
    pub project: String,
    /// API key sent in the `x-api-key` header. May start empty when a
    /// certificate pair is provided instead.
    pub token: String,
    /// Port of the x509 authentication service on the endpoint host.
    pub authn_port: u16,
    /// Path to a PEM client certificate, for token-less construction.
    pub cert: PathBuf,
    /// Path to the PEM private key belonging to `cert`.
    pub key: PathBuf,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Upper bound on idle pooled connections per host.
    pub max_total_connections: u32,
    /// Optional proxy URL. Empty disables proxying.
    pub proxy_url: String,
}

impl ClientConfig {
    /// Configuration with the required triple set and every knob at its
    /// default.
    pub fn new(
        endpoint: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        ClientConfig {
            endpoint: endpoint.into(),
            project: project.into(),
            token: token.into(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: String::new(),
            project: String::new(),
            token: String::new(),
            authn_port: 8443,
            cert: PathBuf::new(),
            key: PathBuf::new(),
            request_timeout_ms: 30_000,
            max_total_connections: 10,
            proxy_url: String::new(),
        }
    }
}
