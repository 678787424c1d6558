//! Trial activation, Stripe checkout and cancellation
//!
//! Each operation is linear: read the rows it needs, call Stripe if it has
//! to, then write the profile. A failure part way leaves earlier side
//! effects in place.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::schemas::{
    ProfileSubscriptionUpdate, SubscriptionStatus, SubscriptionTier, TRIAL_TIER_NAME,
};
use crate::db::ContentStore;
use crate::types::{GatewayError, Result};

use super::payments::{CheckoutParams, CheckoutSession, PaymentProvider};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialActivation {
    pub user_id: Uuid,
    pub tier_id: Uuid,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub tier_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Put the user on the trial tier starting now
pub async fn activate_trial(store: &dyn ContentStore, user_id: Uuid) -> Result<TrialActivation> {
    let tier = store
        .find_tier_by_name(TRIAL_TIER_NAME)
        .await?
        .ok_or_else(|| {
            GatewayError::MissingRow(format!("Subscription tier '{}'", TRIAL_TIER_NAME))
        })?;

    let start = Utc::now();
    let end = Duration::try_days(tier.duration_days)
        .and_then(|length| start.checked_add_signed(length))
        .ok_or_else(|| {
            GatewayError::Internal(format!(
                "Subscription tier '{}' has an out-of-range duration of {} days",
                tier.name, tier.duration_days
            ))
        })?;
    let update = ProfileSubscriptionUpdate {
        subscription_tier_id: Some(tier.id),
        subscription_start: Some(start),
        subscription_end: Some(end),
        subscription_status: Some(SubscriptionStatus::Trial),
    };

    if !store.update_profile_subscription(user_id, update).await? {
        return Err(GatewayError::NotFound(format!("profile {}", user_id)));
    }

    info!(user = %user_id, until = %end, "Trial activated");
    Ok(TrialActivation {
        user_id,
        tier_id: tier.id,
        subscription_start: start,
        subscription_end: end,
    })
}

fn priced(tier: SubscriptionTier) -> Result<(SubscriptionTier, String)> {
    match tier.stripe_price_id.clone().filter(|p| !p.is_empty()) {
        Some(price) => Ok((tier, price)),
        None => Err(GatewayError::Validation(format!(
            "Subscription tier '{}' cannot be purchased",
            tier.name
        ))),
    }
}

/// Open a Stripe Checkout Session for the requested tier
pub async fn create_checkout(
    store: &dyn ContentStore,
    payments: &dyn PaymentProvider,
    site_base: &str,
    request: &CheckoutRequest,
) -> Result<CheckoutSession> {
    let tier = store
        .get_tier(request.tier_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("subscription tier {}", request.tier_id)))?;
    let (tier, price_id) = priced(tier)?;

    let params = CheckoutParams {
        price_id,
        user_id: request.user_id.to_string(),
        tier_id: tier.id.to_string(),
        customer_email: request.email.clone(),
        success_url: format!("{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}", site_base),
        cancel_url: format!("{}/pricing", site_base),
    };
    payments.create_checkout_session(&params).await
}

/// Cancel the user's subscription and mark the profile cancelled
pub async fn cancel_subscription(
    store: &dyn ContentStore,
    payments: &dyn PaymentProvider,
    user_id: Uuid,
) -> Result<()> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("profile {}", user_id)))?;

    match profile.stripe_subscription_id.as_deref() {
        Some(sub) if !sub.is_empty() => payments.cancel_subscription(sub).await?,
        _ => warn!(user = %user_id, "No Stripe subscription on profile, updating status only"),
    }

    let update = ProfileSubscriptionUpdate {
        subscription_status: Some(SubscriptionStatus::Cancelled),
        ..Default::default()
    };
    store.update_profile_subscription(user_id, update).await?;
    info!(user = %user_id, "Subscription cancelled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Profile;
    use crate::db::MemoryStore;
    use crate::services::payments::MockPayments;

    fn profile(id: Uuid, subscription: Option<&str>) -> Profile {
        Profile {
            id,
            email: Some("student@example.com".into()),
            subscription_tier_id: None,
            subscription_start: None,
            subscription_end: None,
            subscription_status: None,
            stripe_customer_id: None,
            stripe_subscription_id: subscription.map(str::to_string),
        }
    }

    fn tier(name: &str, price: Option<&str>, days: i64) -> SubscriptionTier {
        SubscriptionTier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stripe_price_id: price.map(str::to_string),
            duration_days: days,
        }
    }

    #[tokio::test]
    async fn test_missing_trial_tier_names_the_tier() {
        let store = MemoryStore::new();
        let err = activate_trial(&store, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.to_string(), "Subscription tier '3-Day Trial' not found");
        assert_eq!(err.status_code(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_trial_runs_for_tier_duration() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_tier(tier(TRIAL_TIER_NAME, None, 3)).await;
        store.add_profile(profile(user, None)).await;

        let trial = activate_trial(&store, user).await.unwrap();
        assert_eq!(trial.subscription_end - trial.subscription_start, Duration::days(3));

        let saved = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(saved.subscription_status, Some(SubscriptionStatus::Trial));
        assert_eq!(saved.subscription_tier_id, Some(trial.tier_id));
    }

    #[tokio::test]
    async fn test_out_of_range_trial_duration_is_an_error() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_tier(tier(TRIAL_TIER_NAME, None, 100_000_000)).await;
        store.add_profile(profile(user, None)).await;

        let err = activate_trial(&store, user).await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(err.status_code(), hyper::StatusCode::INTERNAL_SERVER_ERROR);

        let saved = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(saved.subscription_status, None);
    }

    #[tokio::test]
    async fn test_checkout_urls_live_under_site() {
        let store = MemoryStore::new();
        let monthly = tier("Monthly", Some("price_m"), 30);
        let tier_id = monthly.id;
        store.add_tier(monthly).await;
        let payments = MockPayments::default();

        let request = CheckoutRequest {
            user_id: Uuid::new_v4(),
            tier_id,
            email: None,
        };
        let session = create_checkout(&store, &payments, "https://medprep.app", &request)
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_mock");

        let sent = payments.sessions.lock().unwrap();
        assert_eq!(sent[0].price_id, "price_m");
        assert_eq!(
            sent[0].success_url,
            "https://medprep.app/payment-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(sent[0].cancel_url, "https://medprep.app/pricing");
    }

    #[tokio::test]
    async fn test_unpriced_tier_cannot_be_purchased() {
        let store = MemoryStore::new();
        let trial = tier(TRIAL_TIER_NAME, None, 3);
        let tier_id = trial.id;
        store.add_tier(trial).await;

        let request = CheckoutRequest {
            user_id: Uuid::new_v4(),
            tier_id,
            email: None,
        };
        let err = create_checkout(&store, &MockPayments::default(), "https://x", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_calls_stripe_and_marks_profile() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_profile(profile(user, Some("sub_42"))).await;
        let payments = MockPayments::default();

        cancel_subscription(&store, &payments, user).await.unwrap();

        assert_eq!(*payments.cancelled.lock().unwrap(), vec!["sub_42".to_string()]);
        let saved = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(saved.subscription_status, Some(SubscriptionStatus::Cancelled));
    }
}
