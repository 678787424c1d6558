//! Subscription tiers and profile subscription state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TIER_TABLE: &str = "subscription_tiers";
pub const PROFILE_TABLE: &str = "profiles";

/// Name of the tier granted by trial activation
pub const TRIAL_TIER_NAME: &str = "3-Day Trial";

/// Purchasable (or trial) subscription tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionTier {
    pub id: Uuid,
    pub name: String,
    /// Stripe price id; absent for the trial tier
    #[serde(default)]
    pub stripe_price_id: Option<String>,
    #[serde(default = "default_duration_days")]
    pub duration_days: i64,
}

fn default_duration_days() -> i64 {
    30
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Cancelled,
    Expired,
}

/// Subscription-related columns of a user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subscription_tier_id: Option<Uuid>,
    #[serde(default)]
    pub subscription_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
}

/// PATCH payload for profile subscription columns; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileSubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tier_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
}
