//! User and project administration.
//!
//! These endpoints are only available to keys carrying service-level roles;
//! ordinary publisher/consumer keys will see 401/403 service errors.

use serde_json::{json, Map, Value};

use crate::client::dispatch::{append_query, decode_payload, encode_body, PubSubClient};
use crate::client::retry::RetryPolicy;
use crate::error::{PubSubError, Result};
use crate::protocol::Operation;
use crate::types::{Project, User, UserPage, UserProject};

impl PubSubClient {
    /// Create a user. The username comes from `user.name`; profile and
    /// membership fields are taken from the remaining fields.
    pub async fn create_user(&self, user: &User, policy: &RetryPolicy) -> Result<User> {
        if user.name.is_empty() {
            return Err(PubSubError::Message("user name is required".to_string()));
        }
        let body = encode_body(Operation::UserCreate, user)?;
        let url = self.user_url(Operation::UserCreate, &user.name);
        let value = self
            .call(Operation::UserCreate, url, Some(body), policy)
            .await?;
        decode_payload(Operation::UserCreate, value)
    }

    /// Update the user known as `name`.
    ///
    /// Only non-empty fields of `update` are sent. A non-empty
    /// `update.name` renames the user.
    pub async fn update_user(
        &self,
        name: &str,
        update: &User,
        policy: &RetryPolicy,
    ) -> Result<User> {
        let mut body = serde_json::to_value(update).map_err(|e| {
            PubSubError::Message(format!("failed to encode [user_update] request body: {e}"))
        })?;
        if !update.name.is_empty() {
            body["name"] = json!(update.name);
        }
        let url = self.user_url(Operation::UserUpdate, name);
        let value = self
            .call(Operation::UserUpdate, url, Some(body.to_string()), policy)
            .await?;
        decode_payload(Operation::UserUpdate, value)
    }

    /// Fetch a user by username.
    pub async fn get_user(&self, name: &str, policy: &RetryPolicy) -> Result<User> {
        let url = self.user_url(Operation::UserGet, name);
        let value = self.call(Operation::UserGet, url, None, policy).await?;
        decode_payload(Operation::UserGet, value)
    }

    /// Fetch the user owning an API key.
    pub async fn get_user_by_token(&self, token: &str, policy: &RetryPolicy) -> Result<User> {
        let url = self.user_url(Operation::UserGetByToken, token);
        let value = self
            .call(Operation::UserGetByToken, url, None, policy)
            .await?;
        decode_payload(Operation::UserGetByToken, value)
    }

    /// Fetch a user by uuid.
    pub async fn get_user_by_uuid(&self, uuid: &str, policy: &RetryPolicy) -> Result<User> {
        let url = self.user_url(Operation::UserGetByUuid, uuid);
        let value = self
            .call(Operation::UserGetByUuid, url, None, policy)
            .await?;
        decode_payload(Operation::UserGetByUuid, value)
    }

    /// The profile of the user the client authenticates as.
    pub async fn get_user_profile(&self, policy: &RetryPolicy) -> Result<User> {
        let url = self.origin_url(Operation::UserGetProfile);
        let value = self
            .call(Operation::UserGetProfile, url, None, policy)
            .await?;
        decode_payload(Operation::UserGetProfile, value)
    }

    /// One page of the user listing.
    ///
    /// `page_size` of zero lets the service choose; `next_page_token` comes
    /// from the previous page and is empty for the first one.
    pub async fn list_users(
        &self,
        details: bool,
        page_size: usize,
        next_page_token: &str,
        policy: &RetryPolicy,
    ) -> Result<UserPage> {
        let url = append_query(
            &self.origin_url(Operation::UsersList),
            &[
                ("details", details.to_string()),
                ("pageSize", page_size.to_string()),
                ("nextPageToken", next_page_token.to_string()),
            ],
        );
        let value = self.call(Operation::UsersList, url, None, policy).await?;
        decode_payload(Operation::UsersList, value)
    }

    /// Delete a user.
    pub async fn delete_user(&self, name: &str, policy: &RetryPolicy) -> Result<()> {
        let url = self.user_url(Operation::UserDelete, name);
        self.call(Operation::UserDelete, url, None, policy).await?;
        Ok(())
    }

    /// Invalidate and reissue the API key of a user. The returned user
    /// carries the fresh token.
    pub async fn refresh_user_token(&self, name: &str, policy: &RetryPolicy) -> Result<User> {
        let url = self.user_url(Operation::UserRefreshToken, name);
        let value = self
            .call(Operation::UserRefreshToken, url, None, policy)
            .await?;
        decode_payload(Operation::UserRefreshToken, value)
    }

    /// Assign an existing user to a project. `project` defaults to the
    /// configured one.
    pub async fn add_project_member(
        &self,
        username: &str,
        project: Option<&str>,
        roles: Vec<String>,
        policy: &RetryPolicy,
    ) -> Result<User> {
        let project = project.unwrap_or(&self.config().project);
        let body = json!({ "roles": roles }).to_string();
        let url =
            Operation::ProjectAddMember.url(&[&self.config().endpoint, project, username]);
        let value = self
            .call(Operation::ProjectAddMember, url, Some(body), policy)
            .await?;
        decode_payload(Operation::ProjectAddMember, value)
    }

    /// Fetch a member of a project. `project` defaults to the configured
    /// one.
    pub async fn get_project_member(
        &self,
        username: &str,
        project: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<User> {
        let project = project.unwrap_or(&self.config().project);
        let url =
            Operation::ProjectGetMember.url(&[&self.config().endpoint, project, username]);
        let value = self
            .call(Operation::ProjectGetMember, url, None, policy)
            .await?;
        decode_payload(Operation::ProjectGetMember, value)
    }

    /// Create a user scoped to a single project. `project` defaults to the
    /// configured one.
    pub async fn create_project_member(
        &self,
        username: &str,
        project: Option<&str>,
        roles: Vec<String>,
        email: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<User> {
        let project = project.unwrap_or(&self.config().project);
        let member = User {
            projects: vec![UserProject {
                project: project.to_string(),
                roles,
                ..Default::default()
            }],
            email: email.unwrap_or_default().to_string(),
            ..Default::default()
        };
        let body = encode_body(Operation::ProjectCreateMember, &member)?;
        let url =
            Operation::ProjectCreateMember.url(&[&self.config().endpoint, project, username]);
        let value = self
            .call(Operation::ProjectCreateMember, url, Some(body), policy)
            .await?;
        decode_payload(Operation::ProjectCreateMember, value)
    }

    /// Remove a user from a project.
    pub async fn remove_project_member(
        &self,
        username: &str,
        project: &str,
        policy: &RetryPolicy,
    ) -> Result<()> {
        let url =
            Operation::ProjectRemoveMember.url(&[&self.config().endpoint, project, username]);
        self.call(Operation::ProjectRemoveMember, url, None, policy)
            .await?;
        Ok(())
    }

    /// Create a project.
    pub async fn create_project(
        &self,
        name: &str,
        description: &str,
        policy: &RetryPolicy,
    ) -> Result<Project> {
        let body = json!({ "description": description }).to_string();
        let url = self.user_url(Operation::ProjectCreate, name);
        let value = self
            .call(Operation::ProjectCreate, url, Some(body), policy)
            .await?;
        decode_payload(Operation::ProjectCreate, value)
    }

    /// Update a project's description, name, or both.
    pub async fn update_project(
        &self,
        name: &str,
        updated_name: Option<&str>,
        description: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<Project> {
        let mut body = Map::new();
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        if let Some(updated_name) = updated_name {
            body.insert("name".to_string(), json!(updated_name));
        }
        let body = Value::Object(body).to_string();
        let url = self.user_url(Operation::ProjectUpdate, name);
        let value = self
            .call(Operation::ProjectUpdate, url, Some(body), policy)
            .await?;
        decode_payload(Operation::ProjectUpdate, value)
    }

    /// Fetch a project by name.
    pub async fn get_project(&self, name: &str, policy: &RetryPolicy) -> Result<Project> {
        let url = self.user_url(Operation::ProjectGet, name);
        let value = self.call(Operation::ProjectGet, url, None, policy).await?;
        decode_payload(Operation::ProjectGet, value)
    }

    /// Delete a project.
    pub async fn delete_project(&self, name: &str, policy: &RetryPolicy) -> Result<()> {
        let url = self.user_url(Operation::ProjectDelete, name);
        self.call(Operation::ProjectDelete, url, None, policy)
            .await?;
        Ok(())
    }
}
