//! Video taxonomy rows managed from the admin screens

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const VIDEO_GROUP_TABLE: &str = "video_groups";
pub const VIDEO_SUBGROUP_TABLE: &str = "video_subgroups";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoGroup {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVideoGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoSubgroup {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVideoSubgroup {
    pub group_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}
