//! Stripe payments
//!
//! Stripe takes form-encoded bodies with bracketed keys for nested fields
//! (`line_items[0][price]`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{GatewayError, Result};

/// Inputs for a subscription checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutParams {
    pub price_id: String,
    pub user_id: String,
    pub tier_id: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutParams {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("client_reference_id", self.user_id.clone()),
            ("metadata[user_id]", self.user_id.clone()),
            ("metadata[tier_id]", self.tier_id.clone()),
        ];
        if let Some(email) = &self.customer_email {
            fields.push(("customer_email", email.clone()));
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(alias = "id")]
    pub session_id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession>;
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(base_url: impl Into<String>, secret_key: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn key(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| GatewayError::Config("STRIPE_SECRET_KEY is not configured".into()))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(body);
        Err(GatewayError::Payment(format!("Stripe ({}): {}", status, message)))
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession> {
        let key = self.key()?;
        let form = serde_urlencoded::to_string(params.form_fields())
            .map_err(|e| GatewayError::Internal(format!("Cannot encode checkout form: {}", e)))?;

        debug!(
            price = %params.price_id,
            user = %params.user_id,
            "Creating Stripe checkout session"
        );

        let resp = self
            .http
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(key)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| GatewayError::Payment(format!("Stripe request failed: {}", e)))?;

        let session: CheckoutSession = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Payment(format!("Invalid Stripe session: {}", e)))?;
        info!(session = %session.session_id, "Stripe checkout session created");
        Ok(session)
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        let key = self.key()?;
        let resp = self
            .http
            .delete(format!(
                "{}/subscriptions/{}",
                self.base_url,
                urlencoding::encode(subscription_id)
            ))
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| GatewayError::Payment(format!("Stripe request failed: {}", e)))?;
        Self::check(resp).await?;
        info!(subscription = %subscription_id, "Stripe subscription cancelled");
        Ok(())
    }
}

/// Records calls and answers with a fixed session
#[derive(Default)]
pub struct MockPayments {
    pub sessions: Mutex<Vec<CheckoutParams>>,
    pub cancelled: Mutex<Vec<String>>,
}

#[async_trait]
impl PaymentProvider for MockPayments {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession> {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.push(params.clone());
        }
        Ok(CheckoutSession {
            session_id: "cs_test_mock".to_string(),
            url: Some("https://checkout.stripe.com/c/pay/cs_test_mock".to_string()),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(subscription_id.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> CheckoutParams {
        CheckoutParams {
            price_id: "price_123".into(),
            user_id: "user-1".into(),
            tier_id: "tier-1".into(),
            customer_email: Some("a@b.test".into()),
            success_url: "https://site/success".into(),
            cancel_url: "https://site/pricing".into(),
        }
    }

    #[tokio::test]
    async fn test_checkout_posts_form_encoded_line_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_123"))
            .and(body_string_contains("mode=subscription"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_1",
                "url": "https://checkout.stripe.com/c/pay/cs_1"
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new(server.uri(), Some("sk_test".into()), Duration::from_secs(5));
        let session = client.create_checkout_session(&params()).await.unwrap();
        assert_eq!(session.session_id, "cs_1");
    }

    #[tokio::test]
    async fn test_stripe_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub_1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "No such subscription: 'sub_1'"}
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new(server.uri(), Some("sk_test".into()), Duration::from_secs(5));
        let err = client.cancel_subscription("sub_1").await.unwrap_err();
        assert!(err.to_string().contains("No such subscription"));
    }
}
