//! Topic management and publishing.

use crate::client::dispatch::{decode_payload, encode_body, PubSubClient};
use crate::client::retry::RetryPolicy;
use crate::error::{PubSubError, Result};
use crate::protocol::Operation;
use crate::types::{Acl, PublishRequest, PublishResponse, PubSubMessage, Topic, TopicList};

impl PubSubClient {
    /// All topics of the configured project.
    pub async fn list_topics(&self, policy: &RetryPolicy) -> Result<Vec<Topic>> {
        let url = self.project_url(Operation::TopicList, "");
        let value = self.call(Operation::TopicList, url, None, policy).await?;
        let list: TopicList = decode_payload(Operation::TopicList, value)?;
        Ok(list.topics)
    }

    /// Fetch one topic by name.
    pub async fn get_topic(&self, topic: &str, policy: &RetryPolicy) -> Result<Topic> {
        let url = self.project_url(Operation::TopicGet, topic);
        let value = self.call(Operation::TopicGet, url, None, policy).await?;
        decode_payload(Operation::TopicGet, value)
    }

    /// Whether the topic exists. A 404 maps to `false`, every other failure
    /// propagates.
    pub async fn has_topic(&self, topic: &str, policy: &RetryPolicy) -> Result<bool> {
        match self.get_topic(topic, policy).await {
            Ok(_) => Ok(true),
            Err(PubSubError::Service { code: Some(404), .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a topic.
    pub async fn create_topic(&self, topic: &str, policy: &RetryPolicy) -> Result<Topic> {
        let url = self.project_url(Operation::TopicCreate, topic);
        let value = self.call(Operation::TopicCreate, url, None, policy).await?;
        decode_payload(Operation::TopicCreate, value)
    }

    /// Delete a topic.
    pub async fn delete_topic(&self, topic: &str, policy: &RetryPolicy) -> Result<()> {
        let url = self.project_url(Operation::TopicDelete, topic);
        self.call(Operation::TopicDelete, url, None, policy).await?;
        Ok(())
    }

    /// Publish messages to a topic, returning the assigned message ids.
    ///
    /// ```ignore
    /// let msg = PubSubMessage::new()
    ///     .with_data(b"foo1")
    ///     .with_attribute("bar1", "baz1");
    /// let response = client
    ///     .publish("topic1", vec![msg], &RetryPolicy::none())
    ///     .await?;
    /// println!("published as {:?}", response.message_ids);
    /// ```
    pub async fn publish(
        &self,
        topic: &str,
        messages: Vec<PubSubMessage>,
        policy: &RetryPolicy,
    ) -> Result<PublishResponse> {
        let body = encode_body(Operation::TopicPublish, &PublishRequest { messages })?;
        let url = self.project_url(Operation::TopicPublish, topic);
        let value = self
            .call(Operation::TopicPublish, url, Some(body), policy)
            .await?;
        decode_payload(Operation::TopicPublish, value)
    }

    /// The authorized-user list of a topic.
    pub async fn topic_acl(&self, topic: &str, policy: &RetryPolicy) -> Result<Acl> {
        let url = self.project_url(Operation::TopicGetAcl, topic);
        let value = self.call(Operation::TopicGetAcl, url, None, policy).await?;
        decode_payload(Operation::TopicGetAcl, value)
    }

    /// Replace the authorized-user list of a topic. An empty list resets it.
    pub async fn modify_topic_acl(
        &self,
        topic: &str,
        authorized_users: Vec<String>,
        policy: &RetryPolicy,
    ) -> Result<()> {
        let body = encode_body(Operation::TopicModifyAcl, &Acl { authorized_users })?;
        let url = self.project_url(Operation::TopicModifyAcl, topic);
        self.call(Operation::TopicModifyAcl, url, Some(body), policy)
            .await?;
        Ok(())
    }
}
