//! Bookmark, rating and feedback rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BOOKMARK_TABLE: &str = "bookmarks";
pub const RATING_TABLE: &str = "ratings";
pub const FEEDBACK_TABLE: &str = "feedback";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    pub user_id: Uuid,
    /// Kind of bookmarked entity (question, topic, video)
    pub entity_type: String,
    pub entity_id: Uuid,
}

/// One-to-five star rating; one row per user and entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub stars: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub message: String,
    pub status: FeedbackStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFeedback {
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub message: String,
}
