//! Topic and topic-link rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOPIC_TABLE: &str = "topics";
pub const TOPIC_LINK_TABLE: &str = "question_topics";

/// Study topic with structured clinical content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub causes: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub diagnostic_tests: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub video_embed: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a generated topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTopic {
    pub title: String,
    pub definition: String,
    pub causes: String,
    pub symptoms: String,
    pub diagnostic_tests: String,
    pub treatment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_embed: Option<String>,
}

/// Association between a question and a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicLink {
    pub question_id: Uuid,
    pub topic_id: Uuid,
}
