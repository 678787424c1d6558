//! Static pages and blog posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PAGE_TABLE: &str = "pages";
pub const BLOG_TABLE: &str = "blogs";

/// Static CMS page addressed by slug
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticPage {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StaticPage {
    /// Most recent modification time known for the row
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Admin write payload for a static page; the slug comes from the path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPage {
    pub title: String,
    pub content: String,
}

/// Blog post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a blog post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBlogPost {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
}
