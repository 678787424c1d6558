//! Privileged user management through the Supabase Auth (GoTrue) admin API

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::db::{KeyTier, SupabaseClient};
use crate::types::{GatewayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        if !self.email.contains('@') {
            return Err(GatewayError::Validation("email is invalid".into()));
        }
        if self.password.len() < 6 {
            return Err(GatewayError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait UserAdmin: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedUser>;
    /// Returns false when the user does not exist
    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;
}

#[derive(Serialize)]
struct AdminCreateBody<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: serde_json::Value,
}

pub struct SupabaseAuthAdmin {
    client: SupabaseClient,
}

impl SupabaseAuthAdmin {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.client.base_url())
    }
}

#[async_trait]
impl UserAdmin for SupabaseAuthAdmin {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedUser> {
        let metadata = match &user.full_name {
            Some(name) => serde_json::json!({ "full_name": name }),
            None => serde_json::json!({}),
        };
        let resp = self
            .client
            .authed(Method::POST, &self.users_url(), KeyTier::ServiceRole)
            .json(&AdminCreateBody {
                email: &user.email,
                password: &user.password,
                email_confirm: true,
                user_metadata: metadata,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("create user request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!("create user ({}): {}", status, body)));
        }
        let created: CreatedUser = resp
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("invalid create user response: {}", e)))?;
        info!(user = %created.id, "User created");
        Ok(created)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let url = format!("{}/{}", self.users_url(), user_id);
        let resp = self
            .client
            .authed(Method::DELETE, &url, KeyTier::ServiceRole)
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("delete user request failed: {}", e)))?;

        match resp.status() {
            s if s.is_success() => {
                info!(user = %user_id, "User deleted");
                Ok(true)
            }
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(GatewayError::Auth(format!("delete user ({}): {}", status, body)))
            }
        }
    }
}

/// In-process user registry for dev mode and tests
#[derive(Default)]
pub struct MemoryUserAdmin {
    users: RwLock<HashMap<Uuid, String>>,
}

impl MemoryUserAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserAdmin for MemoryUserAdmin {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedUser> {
        let mut users = self.users.write().await;
        if users.values().any(|e| e.eq_ignore_ascii_case(&user.email)) {
            return Err(GatewayError::Auth(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        let id = Uuid::new_v4();
        users.insert(id, user.email.clone());
        Ok(CreatedUser {
            id,
            email: Some(user.email.clone()),
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&user_id).is_some())
    }
}
