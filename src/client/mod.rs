//! Asynchronous client for the messaging service.
//!
//! This module provides the complete client surface, enabling callers to:
//!
//! - **Manage topics and subscriptions** within a project
//! - **Publish and consume messages** with acknowledgement handling
//! - **Retry transient failures** with fixed or exponentially growing delays
//! - **Administer users and projects** using service-role keys
//! - **Authenticate via x509 certificates** when no API key is at hand
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── auth     - x509 token exchange and PubSubClient::connect
//! ├── config   - Client configuration
//! ├── consume  - Pull, acknowledge and the pull-and-ack loop
//! ├── dispatch - PubSubClient handle and request dispatch
//! ├── retry    - Retry policies, sleepers and observers
//! ├── service  - Service status, version, metrics and usage reports
//! ├── subs     - Subscription management and offsets
//! ├── topics   - Topic management and publishing
//! └── users    - User and project administration
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PubSubClient`] | Main client handle, cheap to clone |
//! | [`ClientConfig`] | Endpoint, project and authentication options |
//! | [`RetryPolicy`] | Attempt budget, delay mode, timeouts and deadline |
//! | [`RetryObserver`] | Hook notified before every retry |
//! | [`Sleeper`] | Delay source, swappable in tests |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use pubsub_http_client::client::{ClientConfig, PubSubClient};
//!
//! let client = PubSubClient::new(ClientConfig::new(
//!     "https://msg.example.org",
//!     "TEST",
//!     "s3cr3t",
//! ));
//! assert_eq!(client.config().project, "TEST");
//! ```
//!
//! ## Publishing
//!
//! ```ignore
//! use std::time::Duration;
//! use pubsub_http_client::{PubSubMessage, RetryPolicy};
//!
//! let msg = PubSubMessage::new()
//!     .with_data(b"foo1")
//!     .with_attribute("bar1", "baz1");
//! let receipt = client
//!     .publish("topic1", vec![msg], &RetryPolicy::backoff(3, Duration::from_secs(5)))
//!     .await?;
//! println!("published as {:?}", receipt.message_ids);
//! ```
//!
//! ## Consuming
//!
//! ```ignore
//! let messages = client
//!     .pull_and_ack("subscription1", 10, true, &RetryPolicy::none())
//!     .await?;
//! for msg in messages {
//!     println!("{:?}", msg.data()?);
//! }
//! ```

mod auth;
mod config;
mod consume;
mod dispatch;
mod retry;
mod service;
mod subs;
mod topics;
mod users;

pub use config::ClientConfig;
pub use dispatch::PubSubClient;
pub use retry::{
    InstantSleeper, RetryAttempt, RetryMode, RetryObserver, RetryPolicy, SilentObserver, Sleeper,
    TokioSleeper, TracingObserver, TrackingSleeper,
};
