#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Overview
//!
//! This crate is an asynchronous access layer for an HTTP pub/sub
//! messaging service. Every call maps onto one well-known service route,
//! carries the caller's API key, and classifies the JSON response into
//! either a typed payload or one of a small set of error kinds:
//!
//! 1. **Connection errors** - the transport failed before a status line
//! 2. **Service errors** - the service rejected the request; never retried
//! 3. **Timeout errors** - `408`, or `504` on load-balanced routes
//! 4. **Balancer errors** - `500`/`502`/`503`/`504` on load-balanced routes
//!
//! Connection, timeout and balancer errors are transient and eligible for
//! retry under a caller-supplied [`RetryPolicy`]; service errors always
//! surface immediately.
//!
//! ## Key Features
//!
//! - **Topic and subscription management** scoped to a project namespace
//! - **Publish/pull/acknowledge** with a combined pull-and-ack loop that
//!   never acknowledges what it cannot hand over
//! - **Fixed-delay and exponential-backoff retries** with injectable
//!   sleepers and observers for deterministic tests
//! - **Cancellation and deadlines**: a shared [`CancellationToken`] handle
//!   plus per-call and whole-call time budgets
//! - **User and project administration** for service-role keys
//! - **x509 token exchange** against the authentication service
//!
//! ## Usage
//!
//! ```ignore
//! use pubsub_http_client::{ClientConfig, PubSubClient, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> pubsub_http_client::Result<()> {
//!     let client = PubSubClient::new(ClientConfig::new(
//!         "https://msg.example.org",
//!         "TEST",
//!         "s3cr3t",
//!     ));
//!
//!     let messages = client
//!         .pull_and_ack("subscription1", 10, true, &RetryPolicy::none())
//!         .await?;
//!     for msg in messages {
//!         println!("{}", String::from_utf8_lossy(&msg.data()?));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - The client handle, per-operation methods, retry plumbing
//! - **[error]** - The error taxonomy and result alias
//! - **[protocol]** - Route table and response classification
//! - **[types]** - Wire payload types (messages, subscriptions, users, ...)
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{ClientConfig, PubSubClient, RetryMode, RetryPolicy};
pub use error::{PubSubError, Result};
pub use protocol::Operation;
pub use types::{
    Acl, OffsetKind, Project, PubSubMessage, PublishResponse, PushConfig, ReceivedMessage,
    Subscription, SubscriptionOffsets, Topic, User, UserPage,
};
