//! Certificate-based token retrieval.
//!
//! Deployments that issue API keys out of band never touch this module.
//! The alternative path is [`PubSubClient::connect`] with an empty token:
//! the client presents an x509 certificate pair to the authentication
//! service listening on `authn_port` of the endpoint host and adopts the
//! token it hands back.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::client::config::ClientConfig;
use crate::client::dispatch::{connection_error, PubSubClient};
use crate::error::{PubSubError, Result};
use crate::protocol::{classify, Operation};

const NO_CERTIFICATE: &str = "No certificate provided.";

impl PubSubClient {
    /// Create a client, exchanging `config.cert`/`config.key` for an API
    /// key when `config.token` is empty.
    ///
    /// With a non-empty token this is equivalent to
    /// [`new`](PubSubClient::new).
    ///
    /// ```ignore
    /// let config = ClientConfig {
    ///     cert: "/etc/grid-security/hostcert.pem".into(),
    ///     key: "/etc/grid-security/hostkey.pem".into(),
    ///     ..ClientConfig::new("https://msg.example.org", "TEST", "")
    /// };
    /// let client = PubSubClient::connect(config).await?;
    /// ```
    pub async fn connect(mut config: ClientConfig) -> Result<Self> {
        if config.token.is_empty() {
            let probe = PubSubClient::new(config.clone());
            match probe.auth_via_cert(&config.cert, &config.key).await {
                Ok(token) => config.token = token,
                Err(PubSubError::Service {
                    operation,
                    code,
                    status,
                    message,
                }) if message == NO_CERTIFICATE => {
                    return Err(PubSubError::Service {
                        operation,
                        code,
                        status,
                        message: format!("{NO_CERTIFICATE} No token provided."),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(PubSubClient::new(config))
    }

    /// Exchange a PEM certificate pair for an API key.
    ///
    /// The exchange is a single unretried request against the
    /// authentication service, sent without the API key header.
    pub async fn auth_via_cert(&self, cert: &Path, key: &Path) -> Result<String> {
        let op = Operation::AuthX509;

        if cert.as_os_str().is_empty() && key.as_os_str().is_empty() {
            return Err(PubSubError::Service {
                operation: op.name(),
                code: Some(400),
                status: None,
                message: NO_CERTIFICATE.to_string(),
            });
        }

        let cert_pem = read_pem(op, cert).await?;
        let key_pem = read_pem(op, key).await?;
        let identity = reqwest::Identity::from_pkcs8_pem(&cert_pem, &key_pem)
            .map_err(|e| connection_error(op, &e))?;

        // One-off client: the pooled one has no client certificate.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(self.config().request_timeout_ms))
            .identity(identity)
            .build()
            .map_err(|e| connection_error(op, &e))?;

        let url = op.url(&[&self.authn_origin()?, &self.endpoint_host()?]);
        let response = http
            .request(op.verb(), &url)
            .send()
            .await
            .map_err(|e| connection_error(op, &e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| connection_error(op, &e))?;

        let value = classify(op, status, &bytes)?;
        match value.get("token").and_then(Value::as_str) {
            Some(token) => Ok(token.to_string()),
            None => Err(PubSubError::Service {
                operation: op.name(),
                code: Some(500),
                status: None,
                message: format!("Token was not found in the response. Response: {value}"),
            }),
        }
    }

    fn endpoint_host(&self) -> Result<String> {
        let parsed = parse_endpoint(&self.config().endpoint)?;
        Ok(parsed.host_str().unwrap_or_default().to_string())
    }

    /// Origin of the authentication service: the endpoint host on
    /// `authn_port`, keeping the endpoint's scheme.
    fn authn_origin(&self) -> Result<String> {
        let parsed = parse_endpoint(&self.config().endpoint)?;
        Ok(format!(
            "{}://{}:{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default(),
            self.config().authn_port
        ))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<url::Url> {
    url::Url::parse(endpoint)
        .map_err(|e| PubSubError::Message(format!("invalid endpoint `{endpoint}`: {e}")))
}

async fn read_pem(op: Operation, path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| PubSubError::Connection {
        operation: op.name(),
        detail: format!("{}: {e}", path.display()),
    })
}
