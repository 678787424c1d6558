//! In-memory [`ContentStore`] for dev mode and tests

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::schemas::{
    BlogPost, Bookmark, Feedback, FeedbackStatus, NewBlogPost, NewFeedback, NewPage, NewTopic,
    NewVideoGroup, NewVideoSubgroup, Profile, ProfileSubscriptionUpdate, Question, Rating,
    StaticPage, SubscriptionTier, Topic, TopicLink, VideoGroup, VideoSubgroup,
};
use crate::db::store::ContentStore;
use crate::types::Result;

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    topics: Vec<Topic>,
    topic_links: Vec<TopicLink>,
    pages: Vec<StaticPage>,
    blogs: Vec<BlogPost>,
    tiers: Vec<SubscriptionTier>,
    profiles: Vec<Profile>,
    video_groups: Vec<VideoGroup>,
    video_subgroups: Vec<VideoSubgroup>,
    bookmarks: Vec<Bookmark>,
    ratings: Vec<Rating>,
    feedback: Vec<Feedback>,
}

/// Process-local tables behind a single lock
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers; rows the gateway itself never creates

    pub async fn add_question(&self, question: Question) {
        self.tables.write().await.questions.push(question);
    }

    pub async fn add_topic(&self, topic: Topic) {
        self.tables.write().await.topics.push(topic);
    }

    pub async fn add_page(&self, page: StaticPage) {
        self.tables.write().await.pages.push(page);
    }

    pub async fn add_blog(&self, post: BlogPost) {
        self.tables.write().await.blogs.push(post);
    }

    pub async fn add_tier(&self, tier: SubscriptionTier) {
        self.tables.write().await.tiers.push(tier);
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.push(profile);
    }

    pub async fn topic_count(&self) -> usize {
        self.tables.read().await.topics.len()
    }

    pub async fn ratings(&self) -> Vec<Rating> {
        self.tables.read().await.ratings.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        let mut topics = self.tables.read().await.topics.clone();
        topics.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(topics)
    }

    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic> {
        let row = Topic {
            id: Uuid::new_v4(),
            title: topic.title,
            definition: Some(topic.definition),
            causes: Some(topic.causes),
            symptoms: Some(topic.symptoms),
            diagnostic_tests: Some(topic.diagnostic_tests),
            treatment: Some(topic.treatment),
            video_embed: topic.video_embed,
            created_at: Some(Utc::now()),
        };
        self.tables.write().await.topics.push(row.clone());
        Ok(row)
    }

    async fn topic_links(&self, question_id: Uuid) -> Result<Vec<TopicLink>> {
        let tables = self.tables.read().await;
        Ok(tables
            .topic_links
            .iter()
            .filter(|l| l.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn delete_topic_links(&self, question_id: Uuid) -> Result<()> {
        self.tables
            .write()
            .await
            .topic_links
            .retain(|l| l.question_id != question_id);
        Ok(())
    }

    async fn insert_topic_link(&self, link: TopicLink) -> Result<()> {
        self.tables.write().await.topic_links.push(link);
        Ok(())
    }

    async fn get_page(&self, slug: &str) -> Result<Option<StaticPage>> {
        let tables = self.tables.read().await;
        Ok(tables.pages.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_pages(&self) -> Result<Vec<StaticPage>> {
        let mut pages = self.tables.read().await.pages.clone();
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn upsert_page(&self, slug: &str, page: NewPage) -> Result<StaticPage> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.pages.iter_mut().find(|p| p.slug == slug) {
            existing.title = page.title;
            existing.content = page.content;
            existing.updated_at = Some(now);
            return Ok(existing.clone());
        }
        let row = StaticPage {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: page.title,
            content: page.content,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.pages.push(row.clone());
        Ok(row)
    }

    async fn list_published_blogs(&self, limit: Option<usize>) -> Result<Vec<BlogPost>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<BlogPost> =
            tables.blogs.iter().filter(|b| b.published).cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn blog_slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.tables.read().await.blogs.iter().any(|b| b.slug == slug))
    }

    async fn insert_blog(&self, post: NewBlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let row = BlogPost {
            id: Uuid::new_v4(),
            slug: post.slug,
            title: post.title,
            excerpt: Some(post.excerpt),
            content: post.content,
            published: post.published,
            created_at: now,
            updated_at: Some(now),
        };
        self.tables.write().await.blogs.push(row.clone());
        Ok(row)
    }

    async fn find_tier_by_name(&self, name: &str) -> Result<Option<SubscriptionTier>> {
        let tables = self.tables.read().await;
        Ok(tables.tiers.iter().find(|t| t.name == name).cloned())
    }

    async fn get_tier(&self, id: Uuid) -> Result<Option<SubscriptionTier>> {
        let tables = self.tables.read().await;
        Ok(tables.tiers.iter().find(|t| t.id == id).cloned())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn update_profile_subscription(
        &self,
        user_id: Uuid,
        update: ProfileSubscriptionUpdate,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == user_id) else {
            return Ok(false);
        };
        if let Some(tier) = update.subscription_tier_id {
            profile.subscription_tier_id = Some(tier);
        }
        if let Some(start) = update.subscription_start {
            profile.subscription_start = Some(start);
        }
        if let Some(end) = update.subscription_end {
            profile.subscription_end = Some(end);
        }
        if let Some(status) = update.subscription_status {
            profile.subscription_status = Some(status);
        }
        Ok(true)
    }

    async fn list_video_groups(&self) -> Result<Vec<VideoGroup>> {
        let mut groups = self.tables.read().await.video_groups.clone();
        groups.sort_by_key(|g| g.display_order);
        Ok(groups)
    }

    async fn create_video_group(&self, group: NewVideoGroup) -> Result<VideoGroup> {
        let row = VideoGroup {
            id: Uuid::new_v4(),
            name: group.name,
            description: group.description,
            display_order: group.display_order,
        };
        self.tables.write().await.video_groups.push(row.clone());
        Ok(row)
    }

    async fn update_video_group(
        &self,
        id: Uuid,
        group: NewVideoGroup,
    ) -> Result<Option<VideoGroup>> {
        let mut tables = self.tables.write().await;
        Ok(tables.video_groups.iter_mut().find(|g| g.id == id).map(|g| {
            g.name = group.name;
            g.description = group.description;
            g.display_order = group.display_order;
            g.clone()
        }))
    }

    async fn delete_video_group(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.video_groups.len();
        tables.video_groups.retain(|g| g.id != id);
        Ok(tables.video_groups.len() < before)
    }

    async fn list_video_subgroups(&self, group_id: Option<Uuid>) -> Result<Vec<VideoSubgroup>> {
        let tables = self.tables.read().await;
        let mut subgroups: Vec<VideoSubgroup> = tables
            .video_subgroups
            .iter()
            .filter(|s| group_id.map_or(true, |g| s.group_id == g))
            .cloned()
            .collect();
        subgroups.sort_by_key(|s| s.display_order);
        Ok(subgroups)
    }

    async fn create_video_subgroup(&self, subgroup: NewVideoSubgroup) -> Result<VideoSubgroup> {
        let row = VideoSubgroup {
            id: Uuid::new_v4(),
            group_id: subgroup.group_id,
            name: subgroup.name,
            description: subgroup.description,
            display_order: subgroup.display_order,
        };
        self.tables.write().await.video_subgroups.push(row.clone());
        Ok(row)
    }

    async fn update_video_subgroup(
        &self,
        id: Uuid,
        subgroup: NewVideoSubgroup,
    ) -> Result<Option<VideoSubgroup>> {
        let mut tables = self.tables.write().await;
        Ok(tables.video_subgroups.iter_mut().find(|s| s.id == id).map(|s| {
            s.group_id = subgroup.group_id;
            s.name = subgroup.name;
            s.description = subgroup.description;
            s.display_order = subgroup.display_order;
            s.clone()
        }))
    }

    async fn delete_video_subgroup(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.video_subgroups.len();
        tables.video_subgroups.retain(|s| s.id != id);
        Ok(tables.video_subgroups.len() < before)
    }

    async fn bookmark_exists(&self, bookmark: &Bookmark) -> Result<bool> {
        Ok(self.tables.read().await.bookmarks.contains(bookmark))
    }

    async fn insert_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        self.tables.write().await.bookmarks.push(bookmark);
        Ok(())
    }

    async fn delete_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        self.tables.write().await.bookmarks.retain(|b| b != bookmark);
        Ok(())
    }

    async fn upsert_rating(&self, rating: Rating) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.ratings.iter_mut().find(|r| {
            r.user_id == rating.user_id
                && r.entity_type == rating.entity_type
                && r.entity_id == rating.entity_id
        }) {
            Some(existing) => existing.stars = rating.stars,
            None => tables.ratings.push(rating),
        }
        Ok(())
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let row = Feedback {
            id: Uuid::new_v4(),
            user_id: feedback.user_id,
            entity_type: feedback.entity_type,
            entity_id: feedback.entity_id,
            message: feedback.message,
            status: FeedbackStatus::Pending,
            admin_notes: None,
            created_at: Some(Utc::now()),
        };
        self.tables.write().await.feedback.push(row.clone());
        Ok(row)
    }

    async fn list_feedback(&self, status: Option<FeedbackStatus>) -> Result<Vec<Feedback>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Feedback> = tables
            .feedback
            .iter()
            .filter(|f| status.map_or(true, |s| f.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_feedback(
        &self,
        id: Uuid,
        status: FeedbackStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Feedback>> {
        let mut tables = self.tables.write().await;
        Ok(tables.feedback.iter_mut().find(|f| f.id == id).map(|f| {
            f.status = status;
            if admin_notes.is_some() {
                f.admin_notes = admin_notes;
            }
            f.clone()
        }))
    }
}
