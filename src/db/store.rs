//! Storage trait for every table the gateway touches
//!
//! Each method is a single-table operation. Nothing here spans statements:
//! callers that delete then insert accept the window in between.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::schemas::{
    BlogPost, Bookmark, Feedback, FeedbackStatus, NewBlogPost, NewFeedback, NewPage, NewTopic,
    NewVideoGroup, NewVideoSubgroup, Profile, ProfileSubscriptionUpdate, Question, Rating,
    StaticPage, SubscriptionTier, Topic, TopicLink, VideoGroup, VideoSubgroup,
};
use crate::types::Result;

#[async_trait]
pub trait ContentStore: Send + Sync {
    // Questions and topics
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>>;
    async fn list_topics(&self) -> Result<Vec<Topic>>;
    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic>;
    async fn topic_links(&self, question_id: Uuid) -> Result<Vec<TopicLink>>;
    async fn delete_topic_links(&self, question_id: Uuid) -> Result<()>;
    async fn insert_topic_link(&self, link: TopicLink) -> Result<()>;

    // Pages and blogs
    async fn get_page(&self, slug: &str) -> Result<Option<StaticPage>>;
    async fn list_pages(&self) -> Result<Vec<StaticPage>>;
    /// Create or replace the page at `slug`
    async fn upsert_page(&self, slug: &str, page: NewPage) -> Result<StaticPage>;
    /// Published posts, newest first
    async fn list_published_blogs(&self, limit: Option<usize>) -> Result<Vec<BlogPost>>;
    async fn blog_slug_exists(&self, slug: &str) -> Result<bool>;
    async fn insert_blog(&self, post: NewBlogPost) -> Result<BlogPost>;

    // Billing
    async fn find_tier_by_name(&self, name: &str) -> Result<Option<SubscriptionTier>>;
    async fn get_tier(&self, id: Uuid) -> Result<Option<SubscriptionTier>>;
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    /// Returns false when no profile row matched
    async fn update_profile_subscription(
        &self,
        user_id: Uuid,
        update: ProfileSubscriptionUpdate,
    ) -> Result<bool>;

    // Video taxonomy
    async fn list_video_groups(&self) -> Result<Vec<VideoGroup>>;
    async fn create_video_group(&self, group: NewVideoGroup) -> Result<VideoGroup>;
    async fn update_video_group(&self, id: Uuid, group: NewVideoGroup)
        -> Result<Option<VideoGroup>>;
    async fn delete_video_group(&self, id: Uuid) -> Result<bool>;
    async fn list_video_subgroups(&self, group_id: Option<Uuid>) -> Result<Vec<VideoSubgroup>>;
    async fn create_video_subgroup(&self, subgroup: NewVideoSubgroup) -> Result<VideoSubgroup>;
    async fn update_video_subgroup(
        &self,
        id: Uuid,
        subgroup: NewVideoSubgroup,
    ) -> Result<Option<VideoSubgroup>>;
    async fn delete_video_subgroup(&self, id: Uuid) -> Result<bool>;

    // Engagement
    async fn bookmark_exists(&self, bookmark: &Bookmark) -> Result<bool>;
    async fn insert_bookmark(&self, bookmark: Bookmark) -> Result<()>;
    async fn delete_bookmark(&self, bookmark: &Bookmark) -> Result<()>;
    async fn upsert_rating(&self, rating: Rating) -> Result<()>;
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback>;
    async fn list_feedback(&self, status: Option<FeedbackStatus>) -> Result<Vec<Feedback>>;
    async fn update_feedback(
        &self,
        id: Uuid,
        status: FeedbackStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Feedback>>;
}
