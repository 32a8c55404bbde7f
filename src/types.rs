//! Data types exchanged with the messaging service.
//!
//! All of these map one-to-one onto the service's JSON wire shapes via
//! serde. Request-only bodies (pull, acknowledge, publish) are crate
//! private; everything a caller can receive is public.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PubSubMessage`] | A message payload with base64-encoded data and attributes |
//! | [`ReceivedMessage`] | A pulled message paired with its acknowledgment id |
//! | [`Topic`] / [`Subscription`] | Managed resources |
//! | [`User`] / [`UserPage`] / [`Project`] | Account management resources |
//! | [`Acl`] | Authorized-user list attached to a topic or subscription |

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{PubSubError, Result};

/// A single message, as published to a topic or pulled from a subscription.
///
/// The `data` payload travels base64-encoded on the wire; [`set_data`] and
/// [`data`] do the encoding and decoding so callers work with raw bytes.
///
/// ```
/// use pubsub_http_client::PubSubMessage;
///
/// let msg = PubSubMessage::new()
///     .with_data(b"foo1")
///     .with_attribute("bar1", "baz1");
///
/// assert_eq!(
///     serde_json::to_string(&msg).unwrap(),
///     r#"{"attributes":{"bar1":"baz1"},"data":"Zm9vMQ=="}"#
/// );
/// assert_eq!(msg.data().unwrap().to_vec(), b"foo1".to_vec());
/// ```
///
/// [`set_data`]: PubSubMessage::set_data
/// [`data`]: PubSubMessage::data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSubMessage {
    /// Free-form key/value metadata attached to the message.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Base64-encoded payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,

    /// Service-assigned id, present on received messages only.
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Service-assigned publish timestamp, present on received messages only.
    #[serde(rename = "publishTime", default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl PubSubMessage {
    /// An empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_data`](Self::set_data).
    pub fn with_data(mut self, raw: impl AsRef<[u8]>) -> Self {
        self.set_data(raw);
        self
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Replace the payload. The raw bytes are base64-encoded for the wire.
    pub fn set_data(&mut self, raw: impl AsRef<[u8]>) {
        self.data = Some(STANDARD.encode(raw.as_ref()));
    }

    /// Set one metadata attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// The decoded payload. A message without data decodes to empty bytes.
    ///
    /// Returns [`PubSubError::Message`] when the wire data is not valid
    /// base64.
    pub fn data(&self) -> Result<Bytes> {
        match &self.data {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| PubSubError::Message(format!("invalid base64 message data: {e}"))),
            None => Ok(Bytes::new()),
        }
    }

    /// The payload exactly as it travels on the wire, still base64-encoded.
    pub fn encoded_data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// A message delivered by a pull, paired with the acknowledgment id the
/// service expects back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedMessage {
    /// Opaque id passed to [`acknowledge`](crate::PubSubClient::acknowledge).
    #[serde(rename = "ackId")]
    pub ack_id: String,
    /// The delivered message.
    pub message: PubSubMessage,
}

/// Body of a pull call. Both fields are strings on the wire.
#[derive(Debug, Serialize)]
pub(crate) struct PullRequest {
    #[serde(rename = "maxMessages")]
    pub(crate) max_messages: String,
    #[serde(rename = "returnImmediately")]
    pub(crate) return_immediately: String,
}

/// Response of a pull call.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PullResponse {
    #[serde(rename = "receivedMessages", default)]
    pub(crate) received_messages: Vec<ReceivedMessage>,
}

/// Body of an acknowledge call.
#[derive(Debug, Serialize)]
pub(crate) struct AckRequest {
    #[serde(rename = "ackIds")]
    pub(crate) ack_ids: Vec<String>,
}

/// Body of a publish call.
#[derive(Debug, Serialize)]
pub(crate) struct PublishRequest {
    pub(crate) messages: Vec<PubSubMessage>,
}

/// Response of a publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublishResponse {
    /// Service-assigned ids of the published messages, in input order.
    #[serde(rename = "messageIds", default)]
    pub message_ids: Vec<String>,
}

/// A topic, as returned by the topic endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Topic {
    /// Fully qualified name, `/projects/<project>/topics/<topic>`.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TopicList {
    #[serde(default)]
    pub(crate) topics: Vec<Topic>,
}

/// Push delivery retry policy, part of [`PushConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushRetryPolicy {
    /// Retry policy type, `linear` unless the service says otherwise.
    #[serde(rename = "type")]
    pub kind: String,
    /// Retry period in milliseconds.
    pub period: u64,
}

impl Default for PushRetryPolicy {
    fn default() -> Self {
        PushRetryPolicy { kind: "linear".to_string(), period: 300 }
    }
}

/// Push delivery configuration of a subscription. An empty endpoint means
/// the subscription is in pull mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// HTTPS endpoint messages are pushed to.
    #[serde(rename = "pushEndpoint")]
    pub push_endpoint: String,
    /// Retry behavior for failed pushes.
    #[serde(rename = "retryPolicy")]
    pub retry_policy: PushRetryPolicy,
}

/// A subscription, as returned by the subscription endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Subscription {
    /// Fully qualified name, `/projects/<project>/subscriptions/<sub>`.
    pub name: String,
    /// Fully qualified name of the topic the subscription feeds from.
    pub topic: String,
    /// Push delivery settings, empty for pull subscriptions.
    #[serde(rename = "pushConfig")]
    pub push_config: PushConfig,
    /// Seconds the service waits for an acknowledgment before redelivery.
    #[serde(rename = "ackDeadlineSeconds")]
    pub ack_deadline_seconds: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubscriptionList {
    #[serde(default)]
    pub(crate) subscriptions: Vec<Subscription>,
}

/// Offset positions of a subscription on its topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscriptionOffsets {
    /// Newest available offset.
    pub max: i64,
    /// Oldest available offset.
    pub min: i64,
    /// The subscription's current position.
    pub current: i64,
}

/// Which of the three subscription offsets to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    /// Newest available offset.
    Max,
    /// Oldest available offset.
    Min,
    /// The subscription's current position.
    Current,
}

impl OffsetKind {
    /// The key used in the offsets response.
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetKind::Max => "max",
            OffsetKind::Min => "min",
            OffsetKind::Current => "current",
        }
    }
}

/// Authorized-user list of a topic or subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Acl {
    /// Usernames allowed to use the resource.
    pub authorized_users: Vec<String>,
}

/// A user's membership in one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProject {
    /// Project name.
    pub project: String,
    /// Roles held under the project.
    pub roles: Vec<String>,
    /// Topics the user may use. View only, ignored on writes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    /// Subscriptions the user may use. View only, ignored on writes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subscriptions: Vec<String>,
}

/// A service user.
///
/// On create and update only the membership and profile fields are sent;
/// identifiers, the token and the audit timestamps are assigned by the
/// service and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Service-assigned unique id.
    #[serde(skip_serializing)]
    pub uuid: String,
    /// Username.
    #[serde(skip_serializing)]
    pub name: String,
    /// Project memberships.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<UserProject>,
    /// Given name.
    #[serde(rename = "first_name", skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    /// Family name.
    #[serde(rename = "last_name", skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    /// Organization the user belongs to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub organization: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// The user's API key.
    #[serde(skip_serializing)]
    pub token: String,
    /// Contact e-mail.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Service-wide roles.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_roles: Vec<String>,
    /// Creation timestamp.
    #[serde(skip_serializing)]
    pub created_on: String,
    /// Last modification timestamp.
    #[serde(skip_serializing)]
    pub modified_on: String,
    /// Username of the creator.
    #[serde(skip_serializing)]
    pub created_by: String,
}

impl User {
    /// A user with just a name, ready to be enriched and created.
    pub fn named(name: impl Into<String>) -> Self {
        User { name: name.into(), ..Default::default() }
    }
}

/// One page of the paginated user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserPage {
    /// Users on this page.
    pub users: Vec<User>,
    /// Total number of users across all pages.
    #[serde(rename = "totalSize")]
    pub total_size: i64,
    /// Opaque token for fetching the next page, empty on the last page.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: String,
}

/// A project, as returned by the project endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created_on: String,
    /// Last modification timestamp.
    pub modified_on: String,
    /// Username of the creator.
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_data_round_trip() {
        let msg = PubSubMessage::new().with_data(b"foo1");
        assert_eq!(msg.encoded_data(), Some("Zm9vMQ=="));
        assert_eq!(msg.data().unwrap().to_vec(), b"foo1".to_vec());
    }

    #[test]
    fn test_message_serializes_attributes_before_data() {
        let msg = PubSubMessage::new()
            .with_data(b"foo1")
            .with_attribute("bar1", "baz1");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"attributes":{"bar1":"baz1"},"data":"Zm9vMQ=="}"#
        );
    }

    #[test]
    fn test_message_unicode_payload() {
        let text = "ùňĭćőđĕ";
        let msg = PubSubMessage::new().with_data(text.as_bytes());
        assert_eq!(msg.encoded_data(), Some("w7nFiMStxIfFkcSRxJU="));
        assert_eq!(msg.data().unwrap().to_vec(), text.as_bytes().to_vec());
    }

    #[test]
    fn test_message_without_data_decodes_empty() {
        let msg = PubSubMessage::new().with_attribute("k", "v");
        assert!(msg.data().unwrap().is_empty());
    }

    #[test]
    fn test_message_invalid_base64_is_an_error() {
        let msg: PubSubMessage =
            serde_json::from_str(r#"{"data": "n%t valid b64"}"#).unwrap();
        let err = msg.data().unwrap_err();
        assert!(matches!(err, PubSubError::Message(_)));
    }

    #[test]
    fn test_pull_response_decodes_received_messages() {
        let body = r#"{
            "receivedMessages": [{
                "ackId": "projects/TEST/subscriptions/subscription1:1221",
                "message": {
                    "messageId": "1221",
                    "attributes": {"foo": "bar"},
                    "data": "YmFzZTY0ZW5jb2RlZA==",
                    "publishTime": "2016-02-24T11:55:09.786127994Z"
                }
            }]
        }"#;
        let resp: PullResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.received_messages.len(), 1);
        let received = &resp.received_messages[0];
        assert_eq!(received.ack_id, "projects/TEST/subscriptions/subscription1:1221");
        assert_eq!(received.message.message_id.as_deref(), Some("1221"));
        assert_eq!(
            received.message.data().unwrap().to_vec(),
            b"base64encoded".to_vec()
        );
        assert_eq!(
            received.message.publish_time.as_deref(),
            Some("2016-02-24T11:55:09.786127994Z")
        );
    }

    #[test]
    fn test_empty_pull_response() {
        let resp: PullResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.received_messages.is_empty());
    }

    #[test]
    fn test_ack_request_wire_shape() {
        let body = AckRequest { ack_ids: vec!["1221".to_string()] };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"ackIds":["1221"]}"#);
    }

    #[test]
    fn test_pull_request_wire_shape() {
        let body = PullRequest {
            max_messages: 1.to_string(),
            return_immediately: false.to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"maxMessages":"1","returnImmediately":"false"}"#
        );
    }

    #[test]
    fn test_subscription_decodes_with_defaults() {
        let sub: Subscription = serde_json::from_str(
            r#"{
                "name": "/projects/TEST/subscriptions/subscription1",
                "topic": "/projects/TEST/topics/topic1",
                "pushConfig": {},
                "ackDeadlineSeconds": 10
            }"#,
        )
        .unwrap();
        assert_eq!(sub.topic, "/projects/TEST/topics/topic1");
        assert_eq!(sub.ack_deadline_seconds, 10);
        assert!(sub.push_config.push_endpoint.is_empty());
    }

    #[test]
    fn test_user_serializes_profile_fields_only() {
        let mut user = User::named("visitor");
        user.uuid = "u-123".to_string();
        user.token = "secret".to_string();
        user.email = "visitor@example.org".to_string();
        user.projects = vec![UserProject {
            project: "TEST".to_string(),
            roles: vec!["consumer".to_string()],
            ..Default::default()
        }];
        let body: serde_json::Value = serde_json::to_value(&user).unwrap();
        assert!(body.get("uuid").is_none());
        assert!(body.get("name").is_none());
        assert!(body.get("token").is_none());
        assert_eq!(body["email"], "visitor@example.org");
        assert_eq!(body["projects"][0]["project"], "TEST");
    }

    #[test]
    fn test_offset_kind_keys() {
        assert_eq!(OffsetKind::Max.as_str(), "max");
        assert_eq!(OffsetKind::Min.as_str(), "min");
        assert_eq!(OffsetKind::Current.as_str(), "current");
    }
}
