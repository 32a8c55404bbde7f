//! Error types and result handling.
//!
//! The whole crate reports failures through a single tagged union,
//! [`PubSubError`]. Four kinds mirror how the messaging service and the
//! infrastructure in front of it fail:
//!
//! | Kind | Meaning | Retryable |
//! |------|---------|-----------|
//! | [`Connection`](PubSubError::Connection) | transport-level failure, no HTTP status | yes |
//! | [`Service`](PubSubError::Service) | the service rejected the request | no |
//! | [`Timeout`](PubSubError::Timeout) | service-reported 408, or 504 behind a balancer | yes |
//! | [`Balancer`](PubSubError::Balancer) | load balancer failed before the service | yes |
//!
//! Two more cover client-local conditions: [`Message`](PubSubError::Message)
//! for payload encode/decode failures and [`Cancelled`](PubSubError::Cancelled)
//! when a cancellation token or deadline stops a retried call.
//!
//! Every network-classified error renders as
//! `While trying the [<operation>]: <detail>` so callers and logs always see
//! which logical operation failed.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PubSubError>;

/// All failure kinds surfaced by the client.
///
/// `Service`, `Timeout` and `Balancer` carry the numeric code and optional
/// symbolic status extracted from the service's JSON error body
/// (`{"error": {"code": .., "message": .., "status": ..}}`). Fields absent
/// from the body stay `None`; the message is always populated.
#[derive(Debug, Error)]
pub enum PubSubError {
    /// The request never completed at the transport layer (DNS failure,
    /// refused or reset connection, transport read timeout). Carries no HTTP
    /// status.
    #[error("While trying the [{operation}]: {detail}")]
    Connection {
        /// Logical operation that was being attempted.
        operation: &'static str,
        /// Description of the underlying transport failure.
        detail: String,
    },

    /// The service explicitly rejected the request. Never retried: a request
    /// the service refuses once will be refused again.
    #[error("While trying the [{operation}]: {message}")]
    Service {
        /// Logical operation that was being attempted.
        operation: &'static str,
        /// Numeric error code from the response body, or the HTTP status
        /// when the body carried none it could be synthesized from.
        code: Option<u16>,
        /// Symbolic status label such as `ALREADY_EXIST`, when present.
        status: Option<String>,
        /// Human-readable failure description.
        message: String,
    },

    /// The service or the balancer in front of it reported a timeout
    /// (HTTP 408 anywhere, HTTP 504 on balancer-routed operations).
    #[error("While trying the [{operation}]: {message}")]
    Timeout {
        /// Logical operation that was being attempted.
        operation: &'static str,
        /// Numeric error code, see [`PubSubError::Service`].
        code: Option<u16>,
        /// Symbolic status label, when present.
        status: Option<String>,
        /// Human-readable failure description.
        message: String,
    },

    /// Infrastructure in front of the service failed (HTTP 500/502/503 on
    /// operations routed through a load balancer).
    #[error("While trying the [{operation}]: {message}")]
    Balancer {
        /// Logical operation that was being attempted.
        operation: &'static str,
        /// Numeric error code, see [`PubSubError::Service`].
        code: Option<u16>,
        /// Symbolic status label, when present.
        status: Option<String>,
        /// Human-readable failure description.
        message: String,
    },

    /// A retried call was stopped by a cancellation token or a policy
    /// deadline before it could complete.
    #[error("While trying the [{operation}]: {reason}")]
    Cancelled {
        /// Logical operation that was being attempted.
        operation: &'static str,
        /// What stopped the call.
        reason: String,
    },

    /// A message payload could not be encoded or decoded, or a success
    /// response did not have the expected shape.
    #[error("{0}")]
    Message(String),
}

impl PubSubError {
    /// Whether the retry coordinator may re-attempt after this error.
    ///
    /// Connection, timeout and balancer failures are presumed transient.
    /// Service rejections, cancellations and payload errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PubSubError::Connection { .. }
                | PubSubError::Timeout { .. }
                | PubSubError::Balancer { .. }
        )
    }

    /// The numeric error code, when one was reported or synthesized.
    pub fn code(&self) -> Option<u16> {
        match self {
            PubSubError::Service { code, .. }
            | PubSubError::Timeout { code, .. }
            | PubSubError::Balancer { code, .. } => *code,
            _ => None,
        }
    }

    /// The symbolic status label from the error body, when present.
    pub fn status_label(&self) -> Option<&str> {
        match self {
            PubSubError::Service { status, .. }
            | PubSubError::Timeout { status, .. }
            | PubSubError::Balancer { status, .. } => status.as_deref(),
            _ => None,
        }
    }

    /// The logical operation the error belongs to, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            PubSubError::Connection { operation, .. }
            | PubSubError::Service { operation, .. }
            | PubSubError::Timeout { operation, .. }
            | PubSubError::Balancer { operation, .. }
            | PubSubError::Cancelled { operation, .. } => Some(operation),
            PubSubError::Message(_) => None,
        }
    }
}
