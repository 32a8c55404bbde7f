//! Consume-side operations: pull, acknowledge, and the combined cycle.

use crate::client::dispatch::{decode_payload, encode_body, PubSubClient};
use crate::client::retry::RetryPolicy;
use crate::error::Result;
use crate::protocol::Operation;
use crate::types::{AckRequest, PubSubMessage, PullRequest, PullResponse, ReceivedMessage};

impl PubSubClient {
    /// Pull up to `max_messages` messages from a subscription.
    ///
    /// With `return_immediately` set the service answers right away even
    /// when no messages are queued; otherwise it may hold the request until
    /// messages arrive. Each returned message carries the acknowledgment id
    /// to pass to [`acknowledge`](Self::acknowledge).
    ///
    /// ```ignore
    /// let received = client
    ///     .pull("subscription1", 10, true, &RetryPolicy::none())
    ///     .await?;
    /// for r in &received {
    ///     println!("{}: {:?}", r.ack_id, r.message.data()?);
    /// }
    /// ```
    pub async fn pull(
        &self,
        sub: &str,
        max_messages: usize,
        return_immediately: bool,
        policy: &RetryPolicy,
    ) -> Result<Vec<ReceivedMessage>> {
        let body = encode_body(
            Operation::SubPull,
            &PullRequest {
                max_messages: max_messages.to_string(),
                return_immediately: return_immediately.to_string(),
            },
        )?;
        let url = self.project_url(Operation::SubPull, sub);
        let value = self.call(Operation::SubPull, url, Some(body), policy).await?;
        let response: PullResponse = decode_payload(Operation::SubPull, value)?;
        Ok(response.received_messages)
    }

    /// Acknowledge delivered messages by their acknowledgment ids.
    ///
    /// The service acknowledges the highest offset among the ids together
    /// with everything before it.
    pub async fn acknowledge(
        &self,
        sub: &str,
        ack_ids: Vec<String>,
        policy: &RetryPolicy,
    ) -> Result<()> {
        let body = encode_body(Operation::SubAck, &AckRequest { ack_ids })?;
        let url = self.project_url(Operation::SubAck, sub);
        self.call(Operation::SubAck, url, Some(body), policy).await?;
        Ok(())
    }

    /// Pull messages and acknowledge them in one consume cycle.
    ///
    /// The retry policy applies to the pulls. When a pull succeeds but the
    /// following acknowledgment fails, the delivered messages are dropped
    /// and the cycle restarts with a fresh pull, so the acknowledgment
    /// deadline window always starts at the latest pull. Returns the
    /// messages of the cycle whose acknowledgment went through, or an empty
    /// vector once the subscription has nothing queued.
    pub async fn pull_and_ack(
        &self,
        sub: &str,
        max_messages: usize,
        return_immediately: bool,
        policy: &RetryPolicy,
    ) -> Result<Vec<PubSubMessage>> {
        loop {
            let received = self
                .pull(sub, max_messages, return_immediately, policy)
                .await?;
            if received.is_empty() {
                return Ok(Vec::new());
            }

            let (ack_ids, messages): (Vec<String>, Vec<PubSubMessage>) = received
                .into_iter()
                .map(|r| (r.ack_id, r.message))
                .unzip();

            match self.acknowledge(sub, ack_ids, &RetryPolicy::none()).await {
                Ok(()) => return Ok(messages),
                Err(e) => {
                    tracing::warn!("Continuing with pull after failed acknowledge: {}", e);
                }
            }
        }
    }
}
