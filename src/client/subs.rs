//! Subscription management: lifecycle, push configuration and offsets.

use serde_json::{json, Value};

use crate::client::dispatch::{decode_payload, encode_body, PubSubClient};
use crate::client::retry::RetryPolicy;
use crate::error::{PubSubError, Result};
use crate::protocol::Operation;
use crate::types::{
    Acl, OffsetKind, PushConfig, Subscription, SubscriptionList, SubscriptionOffsets,
};

impl PubSubClient {
    /// All subscriptions of the configured project.
    pub async fn list_subs(&self, policy: &RetryPolicy) -> Result<Vec<Subscription>> {
        let url = self.project_url(Operation::SubList, "");
        let value = self.call(Operation::SubList, url, None, policy).await?;
        let list: SubscriptionList = decode_payload(Operation::SubList, value)?;
        Ok(list.subscriptions)
    }

    /// Fetch one subscription by name.
    pub async fn get_sub(&self, sub: &str, policy: &RetryPolicy) -> Result<Subscription> {
        let url = self.project_url(Operation::SubGet, sub);
        let value = self.call(Operation::SubGet, url, None, policy).await?;
        decode_payload(Operation::SubGet, value)
    }

    /// Whether the subscription exists. A 404 maps to `false`, every other
    /// failure propagates.
    pub async fn has_sub(&self, sub: &str, policy: &RetryPolicy) -> Result<bool> {
        match self.get_sub(sub, policy).await {
            Ok(_) => Ok(true),
            Err(PubSubError::Service { code: Some(404), .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a subscription on a topic of the configured project.
    ///
    /// The subscription starts in pull mode; passing a `push_config` issues
    /// a [`modify_push_config`](Self::modify_push_config) follow-up call
    /// that switches it to push delivery right away, and the returned
    /// subscription is the follow-up's response, reflecting the applied
    /// push configuration. `ack_deadline` is the redelivery window in
    /// seconds, 10 unless the service says otherwise.
    pub async fn create_sub(
        &self,
        sub: &str,
        topic: &str,
        ack_deadline: u32,
        push_config: Option<&PushConfig>,
        policy: &RetryPolicy,
    ) -> Result<Subscription> {
        let full_topic = format!("projects/{}/topics/{}", self.config().project, topic);
        let body = json!({
            "topic": full_topic,
            "ackDeadlineSeconds": ack_deadline,
        })
        .to_string();
        let url = self.project_url(Operation::SubCreate, sub);
        let value = self
            .call(Operation::SubCreate, url, Some(body), policy)
            .await?;
        let created = decode_payload(Operation::SubCreate, value)?;
        match push_config {
            Some(config) => self.modify_push_config(sub, Some(config), policy).await,
            None => Ok(created),
        }
    }

    /// Delete a subscription.
    pub async fn delete_sub(&self, sub: &str, policy: &RetryPolicy) -> Result<()> {
        let url = self.project_url(Operation::SubDelete, sub);
        self.call(Operation::SubDelete, url, None, policy).await?;
        Ok(())
    }

    /// Change the push delivery settings of a subscription.
    ///
    /// `None` clears the push endpoint and returns the subscription to pull
    /// mode.
    pub async fn modify_push_config(
        &self,
        sub: &str,
        push_config: Option<&PushConfig>,
        policy: &RetryPolicy,
    ) -> Result<Subscription> {
        let body = match push_config {
            Some(config) => encode_body(Operation::SubPushConfig, &json!({ "pushConfig": config }))?,
            None => json!({ "pushConfig": {} }).to_string(),
        };
        let url = self.project_url(Operation::SubPushConfig, sub);
        let value = self
            .call(Operation::SubPushConfig, url, Some(body), policy)
            .await?;
        decode_payload(Operation::SubPushConfig, value)
    }

    /// The authorized-user list of a subscription.
    pub async fn sub_acl(&self, sub: &str, policy: &RetryPolicy) -> Result<Acl> {
        let url = self.project_url(Operation::SubGetAcl, sub);
        let value = self.call(Operation::SubGetAcl, url, None, policy).await?;
        decode_payload(Operation::SubGetAcl, value)
    }

    /// Replace the authorized-user list of a subscription. An empty list
    /// resets it.
    pub async fn modify_sub_acl(
        &self,
        sub: &str,
        authorized_users: Vec<String>,
        policy: &RetryPolicy,
    ) -> Result<()> {
        let body = encode_body(Operation::SubModifyAcl, &Acl { authorized_users })?;
        let url = self.project_url(Operation::SubModifyAcl, sub);
        self.call(Operation::SubModifyAcl, url, Some(body), policy)
            .await?;
        Ok(())
    }

    /// The min, max and current offsets of a subscription.
    pub async fn offsets(&self, sub: &str, policy: &RetryPolicy) -> Result<SubscriptionOffsets> {
        let url = self.project_url(Operation::SubOffsets, sub);
        let value = self.call(Operation::SubOffsets, url, None, policy).await?;
        decode_payload(Operation::SubOffsets, value)
    }

    /// One of the three offsets of a subscription.
    pub async fn offset(
        &self,
        sub: &str,
        kind: OffsetKind,
        policy: &RetryPolicy,
    ) -> Result<i64> {
        let offsets = self.offsets(sub, policy).await?;
        Ok(match kind {
            OffsetKind::Max => offsets.max,
            OffsetKind::Min => offsets.min,
            OffsetKind::Current => offsets.current,
        })
    }

    /// Move the current offset of a subscription.
    pub async fn modify_offset(
        &self,
        sub: &str,
        move_to: i64,
        policy: &RetryPolicy,
    ) -> Result<()> {
        let body = json!({ "offset": move_to }).to_string();
        let url = self.project_url(Operation::SubModifyOffset, sub);
        self.call(Operation::SubModifyOffset, url, Some(body), policy)
            .await?;
        Ok(())
    }

    /// The first offset recorded at or after an RFC 3339 timestamp.
    pub async fn time_to_offset(
        &self,
        sub: &str,
        timestamp: &str,
        policy: &RetryPolicy,
    ) -> Result<i64> {
        let url = Operation::SubTimeToOffset.url(&[
            &self.config().endpoint,
            &self.config().project,
            sub,
            timestamp,
        ]);
        let value = self
            .call(Operation::SubTimeToOffset, url, None, policy)
            .await?;
        value
            .get("offset")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                PubSubError::Message("missing offset in [sub_timeToOffset] response".to_string())
            })
    }
}
