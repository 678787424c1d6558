//! Transactional email via Resend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

use crate::types::{GatewayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send and return the provider's message id
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}

pub struct ResendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::Config("RESEND_API_KEY is not configured".into()))?;

        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(key)
            .json(&ResendRequest {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Email(format!("Resend request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Email(format!("Resend ({}): {}", status, body)));
        }

        let sent: ResendResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Email(format!("Invalid Resend response: {}", e)))?;
        info!(id = %sent.id, recipients = email.to.len(), "Email sent");
        Ok(sent.id)
    }
}

/// Collects messages instead of sending them
#[derive(Default)]
pub struct MockEmailSender {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl MockEmailSender {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| GatewayError::Internal("mock mailbox poisoned".into()))?;
        sent.push(email.clone());
        Ok(format!("mock-{}", sent.len()))
    }
}
