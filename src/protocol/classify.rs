//! Response classification.
//!
//! [`classify`] turns a raw HTTP response (status code plus body bytes) into
//! either a decoded JSON payload or the right [`PubSubError`] kind for the
//! operation that produced it. The function is pure: the same inputs always
//! yield the same outcome, and no state is consulted or mutated.
//!
//! Precedence, first match wins:
//!
//! 1. `200` is success, always. An unparseable body decodes to an empty
//!    object rather than an error.
//! 2. `401`/`403` are [`Service`](PubSubError::Service) errors for every
//!    operation.
//! 3. `408`, and `504` on balancer-routed operations, are
//!    [`Timeout`](PubSubError::Timeout) errors.
//! 4. A code in the operation's documented error set is a `Service` error.
//! 5. A balancer code on a balancer-routed operation is a
//!    [`Balancer`](PubSubError::Balancer) error.
//! 6. Anything else falls through to a `Service` error.

use serde_json::Value;

use crate::error::{PubSubError, Result};
use crate::protocol::routes::Operation;

/// Classify a raw response for `op` into a payload or an error.
pub fn classify(op: Operation, status: u16, body: &[u8]) -> Result<Value> {
    if status == 200 {
        return Ok(decode_success(body));
    }

    let detail = ErrorDetail::from_body(status, body);
    match status {
        401 | 403 => Err(detail.service(op)),
        408 => Err(detail.timeout(op)),
        504 if op.is_balancer_sensitive() => Err(detail.timeout(op)),
        s if op.service_error_codes().contains(&s) => Err(detail.service(op)),
        s if op.is_balancer_sensitive() && op.balancer_error_codes().contains(&s) => {
            Err(detail.balancer(op))
        }
        _ => Err(detail.service(op)),
    }
}

/// Decode a 200 body. Empty or non-JSON bodies become an empty object so a
/// successful call never classifies as a failure.
fn decode_success(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// Error fields pulled out of a response body.
///
/// The service reports errors as
/// `{"error": {"code": <int>, "message": <str>, "status": <str>}}`. Bodies
/// that do not follow that shape are wrapped: the raw text becomes the
/// message and the HTTP status stands in for the code.
#[derive(Debug, PartialEq, Eq)]
struct ErrorDetail {
    code: Option<u16>,
    status: Option<String>,
    message: String,
}

impl ErrorDetail {
    fn from_body(http_status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        if let Some(err) = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_object)
        {
            let code = err
                .get("code")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok());
            let status = err.get("status").and_then(Value::as_str).map(String::from);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| http_status.to_string());
            return ErrorDetail { code, status, message };
        }

        let text = String::from_utf8_lossy(body);
        let message = if text.trim().is_empty() {
            http_status.to_string()
        } else {
            text.trim().to_string()
        };
        ErrorDetail { code: Some(http_status), status: None, message }
    }

    fn service(self, op: Operation) -> PubSubError {
        PubSubError::Service {
            operation: op.name(),
            code: self.code,
            status: self.status,
            message: self.message,
        }
    }

    fn timeout(self, op: Operation) -> PubSubError {
        PubSubError::Timeout {
            operation: op.name(),
            code: self.code,
            status: self.status,
            message: self.message,
        }
    }

    fn balancer(self, op: Operation) -> PubSubError {
        PubSubError::Balancer {
            operation: op.name(),
            code: self.code,
            status: self.status,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERROR_BODY: &[u8] =
        br#"{"error": {"code": 404, "message": "Topic doesn't exist", "status": "NOT_FOUND"}}"#;

    #[test]
    fn test_success_parses_json() {
        let value = classify(Operation::TopicGet, 200, br#"{"name": "t1"}"#).unwrap();
        assert_eq!(value["name"], "t1");
    }

    #[test]
    fn test_success_with_garbage_body_is_empty_object() {
        let value = classify(Operation::SubAck, 200, b"not json at all").unwrap();
        assert_eq!(value, Value::Object(serde_json::Map::new()));

        let value = classify(Operation::SubAck, 200, b"").unwrap();
        assert_eq!(value, Value::Object(serde_json::Map::new()));
    }

    #[test]
    fn test_registered_code_is_service_error() {
        let err = classify(Operation::TopicGet, 404, ERROR_BODY).unwrap_err();
        match err {
            PubSubError::Service { operation, code, status, message } => {
                assert_eq!(operation, "topic_get");
                assert_eq!(code, Some(404));
                assert_eq!(status.as_deref(), Some("NOT_FOUND"));
                assert_eq!(message, "Topic doesn't exist");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_401_and_403_always_service_errors() {
        for op in Operation::ALL {
            for status in [401u16, 403] {
                let err = classify(op, status, b"").unwrap_err();
                assert!(
                    matches!(err, PubSubError::Service { .. }),
                    "{} {}",
                    op.name(),
                    status
                );
            }
        }
    }

    #[test]
    fn test_408_is_timeout_everywhere() {
        let err = classify(Operation::SubAck, 408, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Timeout { .. }));

        let err = classify(Operation::TopicGet, 408, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Timeout { .. }));
    }

    #[test]
    fn test_504_timeout_only_behind_balancer() {
        let err = classify(Operation::SubPull, 504, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Timeout { .. }));

        let err = classify(Operation::TopicPublish, 504, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Timeout { .. }));

        // A 504 on an operation that never crosses the balancer is neither a
        // timeout nor a balancer failure.
        let err = classify(Operation::TopicGet, 504, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Service { .. }));
    }

    #[test]
    fn test_balancer_codes_on_routed_operations() {
        for op in [Operation::SubPull, Operation::SubAck, Operation::TopicPublish] {
            for status in [500u16, 502, 503] {
                let err = classify(op, status, b"").unwrap_err();
                assert!(
                    matches!(err, PubSubError::Balancer { .. }),
                    "{} {}",
                    op.name(),
                    status
                );
            }
        }

        let err = classify(Operation::TopicGet, 502, b"").unwrap_err();
        assert!(matches!(err, PubSubError::Service { .. }));
    }

    #[test]
    fn test_catch_all_is_service_error() {
        let err = classify(Operation::ApiVersion, 418, b"teapot").unwrap_err();
        match err {
            PubSubError::Service { code, message, .. } => {
                assert_eq!(code, Some(418));
                assert_eq!(message, "teapot");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_plaintext_body_becomes_the_message() {
        let err = classify(Operation::TopicGet, 500, b"Cannot get topic").unwrap_err();
        assert_eq!(
            err.to_string(),
            "While trying the [topic_get]: Cannot get topic"
        );
        assert_eq!(err.code(), Some(500));
        assert_eq!(err.status_label(), None);
    }

    #[test]
    fn test_empty_body_message_is_the_status_code() {
        let err = classify(Operation::TopicGet, 500, b"").unwrap_err();
        assert_eq!(err.to_string(), "While trying the [topic_get]: 500");
    }

    #[test]
    fn test_missing_error_fields_stay_unset() {
        let err = classify(
            Operation::TopicGet,
            404,
            br#"{"error": {"message": "Topic doesn't exist"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), None);
        assert_eq!(err.status_label(), None);
        assert_eq!(
            err.to_string(),
            "While trying the [topic_get]: Topic doesn't exist"
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        let cases: &[(Operation, u16, &[u8])] = &[
            (Operation::SubPull, 200, br#"{"receivedMessages": []}"#),
            (Operation::SubPull, 504, b""),
            (Operation::TopicGet, 404, ERROR_BODY),
            (Operation::SubAck, 502, b"Bad Gateway"),
        ];
        for (op, status, body) in cases {
            let first = format!("{:?}", classify(*op, *status, body));
            let second = format!("{:?}", classify(*op, *status, body));
            assert_eq!(first, second);
        }
    }
}
