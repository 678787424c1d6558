//! Supabase PostgREST client and the production [`ContentStore`]
//!
//! Two key tiers are held: the anonymous key for public reads and the
//! service-role key for privileged writes (row-level security bypass).
//! Single-row reads ask PostgREST for an object response; its "no rows"
//! answer (HTTP 406, code `PGRST116`) is mapped to `Ok(None)`.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::Args;
use crate::db::schemas::{
    BlogPost, Bookmark, Feedback, FeedbackStatus, NewBlogPost, NewFeedback, NewPage, NewTopic,
    NewVideoGroup, NewVideoSubgroup, Profile, ProfileSubscriptionUpdate, Question, Rating,
    StaticPage, SubscriptionTier, Topic, TopicLink, VideoGroup, VideoSubgroup, BLOG_TABLE,
    BOOKMARK_TABLE, FEEDBACK_TABLE, PAGE_TABLE, PROFILE_TABLE, QUESTION_TABLE, RATING_TABLE,
    TIER_TABLE, TOPIC_LINK_TABLE, TOPIC_TABLE, VIDEO_GROUP_TABLE, VIDEO_SUBGROUP_TABLE,
};
use crate::db::store::ContentStore;
use crate::types::{GatewayError, Result};

/// Which API key a request is made with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTier {
    Anon,
    ServiceRole,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

const NO_ROWS_CODE: &str = "PGRST116";

/// True when a 406 body is PostgREST's "zero rows for an object request"
fn is_no_rows(body: &str) -> bool {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            err.code.as_deref() == Some(NO_ROWS_CODE)
                && err
                    .details
                    .as_deref()
                    .map(|d| d.contains("0 rows"))
                    .unwrap_or(true)
        }
        Err(_) => false,
    }
}

/// Thin PostgREST / GoTrue HTTP client
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        service_role_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("medgate/0.1")
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_role_key: service_role_key.into(),
        }
    }

    /// Build from configuration; all three settings are required
    pub fn from_args(args: &Args) -> Result<Self> {
        let sb = &args.supabase;
        let url = sb
            .supabase_url
            .as_deref()
            .ok_or_else(|| GatewayError::Config("SUPABASE_URL is not set".into()))?;
        let anon = sb
            .supabase_anon_key
            .clone()
            .ok_or_else(|| GatewayError::Config("SUPABASE_ANON_KEY is not set".into()))?;
        let service = sb.supabase_service_role_key.clone().ok_or_else(|| {
            GatewayError::Config("SUPABASE_SERVICE_ROLE_KEY is not set".into())
        })?;
        Ok(Self::new(url, anon, service, args.request_timeout()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn key(&self, tier: KeyTier) -> &str {
        match tier {
            KeyTier::Anon => &self.anon_key,
            KeyTier::ServiceRole => &self.service_role_key,
        }
    }

    /// Request with `apikey` and bearer headers for the given tier
    pub fn authed(&self, method: Method, url: &str, tier: KeyTier) -> RequestBuilder {
        let key = self.key(tier);
        self.http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, query)
        }
    }

    async fn send(&self, table: &str, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: request failed: {}", table, e)))?;
        check_status(table, resp).await
    }

    /// `GET /rest/v1/{table}?{query}`
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        tier: KeyTier,
    ) -> Result<Vec<T>> {
        debug!(table, query, "PostgREST select");
        let req = self.authed(Method::GET, &self.rest_url(table, query), tier);
        let resp = self.send(table, req).await?;
        resp.json::<Vec<T>>()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: invalid rows: {}", table, e)))
    }

    /// Object request; `Ok(None)` on the no-rows condition
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        tier: KeyTier,
    ) -> Result<Option<T>> {
        debug!(table, query, "PostgREST select single");
        let resp = self
            .authed(Method::GET, &self.rest_url(table, query), tier)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: request failed: {}", table, e)))?;

        if resp.status() == StatusCode::NOT_ACCEPTABLE {
            let body = resp.text().await.unwrap_or_default();
            if is_no_rows(&body) {
                return Ok(None);
            }
            return Err(GatewayError::Database(format!(
                "{}: {}",
                table,
                postgrest_message(&body)
            )));
        }

        let resp = check_status(table, resp).await?;
        resp.json::<T>()
            .await
            .map(Some)
            .map_err(|e| GatewayError::Database(format!("{}: invalid row: {}", table, e)))
    }

    /// Insert one row with the service-role key and return it
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T> {
        let req = self
            .authed(Method::POST, &self.rest_url(table, ""), KeyTier::ServiceRole)
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self
            .send(table, req)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: invalid row: {}", table, e)))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::Database(format!("{}: insert returned no row", table)))
    }

    /// Insert without reading the row back
    pub async fn insert_minimal<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> Result<()> {
        let req = self
            .authed(Method::POST, &self.rest_url(table, ""), KeyTier::ServiceRole)
            .header("Prefer", "return=minimal")
            .json(body);
        self.send(table, req).await.map(|_| ())
    }

    /// Insert, merging into the row that collides on `on_conflict`
    pub async fn upsert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<()> {
        let query = format!("on_conflict={}", on_conflict);
        let req = self
            .authed(Method::POST, &self.rest_url(table, &query), KeyTier::ServiceRole)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body);
        self.send(table, req).await.map(|_| ())
    }

    /// `PATCH` matching rows and return them
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        body: &B,
    ) -> Result<Vec<T>> {
        let req = self
            .authed(Method::PATCH, &self.rest_url(table, query), KeyTier::ServiceRole)
            .header("Prefer", "return=representation")
            .json(body);
        self.send(table, req)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: invalid rows: {}", table, e)))
    }

    /// Delete matching rows; returns how many were removed
    pub async fn delete(&self, table: &str, query: &str) -> Result<usize> {
        let req = self
            .authed(Method::DELETE, &self.rest_url(table, query), KeyTier::ServiceRole)
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self
            .send(table, req)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Database(format!("{}: invalid rows: {}", table, e)))?;
        Ok(rows.len())
    }
}

async fn check_status(table: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::Database(format!(
        "{} ({}): {}",
        table,
        status,
        postgrest_message(&body)
    )))
}

fn postgrest_message(body: &str) -> String {
    serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}

fn eq(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

/// PostgREST-backed store
#[derive(Clone)]
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }
}

fn bookmark_filter(b: &Bookmark) -> String {
    format!(
        "{}&{}&{}",
        eq("user_id", &b.user_id.to_string()),
        eq("entity_type", &b.entity_type),
        eq("entity_id", &b.entity_id.to_string())
    )
}

#[async_trait]
impl ContentStore for SupabaseStore {
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        let query = format!("select=*&{}", eq("id", &id.to_string()));
        self.client
            .select_single(QUESTION_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        self.client
            .select(TOPIC_TABLE, "select=*&order=title.asc", KeyTier::ServiceRole)
            .await
    }

    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic> {
        self.client.insert(TOPIC_TABLE, &topic).await
    }

    async fn topic_links(&self, question_id: Uuid) -> Result<Vec<TopicLink>> {
        let query = format!(
            "select=question_id,topic_id&{}",
            eq("question_id", &question_id.to_string())
        );
        self.client
            .select(TOPIC_LINK_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn delete_topic_links(&self, question_id: Uuid) -> Result<()> {
        let removed = self
            .client
            .delete(TOPIC_LINK_TABLE, &eq("question_id", &question_id.to_string()))
            .await?;
        debug!(%question_id, removed, "Deleted topic links");
        Ok(())
    }

    async fn insert_topic_link(&self, link: TopicLink) -> Result<()> {
        self.client.insert_minimal(TOPIC_LINK_TABLE, &link).await
    }

    async fn get_page(&self, slug: &str) -> Result<Option<StaticPage>> {
        let query = format!("select=*&{}", eq("slug", slug));
        self.client
            .select_single(PAGE_TABLE, &query, KeyTier::Anon)
            .await
    }

    async fn list_pages(&self) -> Result<Vec<StaticPage>> {
        self.client
            .select(PAGE_TABLE, "select=*&order=title.asc", KeyTier::Anon)
            .await
    }

    async fn upsert_page(&self, slug: &str, page: NewPage) -> Result<StaticPage> {
        let body = serde_json::json!({
            "slug": slug,
            "title": page.title,
            "content": page.content,
            "updated_at": chrono::Utc::now(),
        });
        self.client.upsert(PAGE_TABLE, "slug", &body).await?;
        let query = format!("select=*&{}", eq("slug", slug));
        self.client
            .select_single(PAGE_TABLE, &query, KeyTier::ServiceRole)
            .await?
            .ok_or_else(|| {
                GatewayError::Database(format!("{}: upserted page not readable", PAGE_TABLE))
            })
    }

    async fn list_published_blogs(&self, limit: Option<usize>) -> Result<Vec<BlogPost>> {
        let mut query = "select=*&published=eq.true&order=created_at.desc".to_string();
        if let Some(limit) = limit {
            query.push_str(&format!("&limit={}", limit));
        }
        self.client.select(BLOG_TABLE, &query, KeyTier::Anon).await
    }

    async fn blog_slug_exists(&self, slug: &str) -> Result<bool> {
        let query = format!("select=id&{}&limit=1", eq("slug", slug));
        let rows: Vec<serde_json::Value> = self
            .client
            .select(BLOG_TABLE, &query, KeyTier::ServiceRole)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_blog(&self, post: NewBlogPost) -> Result<BlogPost> {
        self.client.insert(BLOG_TABLE, &post).await
    }

    async fn find_tier_by_name(&self, name: &str) -> Result<Option<SubscriptionTier>> {
        let query = format!("select=*&{}&limit=1", eq("name", name));
        let rows: Vec<SubscriptionTier> = self
            .client
            .select(TIER_TABLE, &query, KeyTier::ServiceRole)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn get_tier(&self, id: Uuid) -> Result<Option<SubscriptionTier>> {
        let query = format!("select=*&{}", eq("id", &id.to_string()));
        self.client
            .select_single(TIER_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let query = format!("select=*&{}", eq("id", &user_id.to_string()));
        self.client
            .select_single(PROFILE_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn update_profile_subscription(
        &self,
        user_id: Uuid,
        update: ProfileSubscriptionUpdate,
    ) -> Result<bool> {
        let rows: Vec<serde_json::Value> = self
            .client
            .update(PROFILE_TABLE, &eq("id", &user_id.to_string()), &update)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn list_video_groups(&self) -> Result<Vec<VideoGroup>> {
        self.client
            .select(
                VIDEO_GROUP_TABLE,
                "select=*&order=display_order.asc",
                KeyTier::ServiceRole,
            )
            .await
    }

    async fn create_video_group(&self, group: NewVideoGroup) -> Result<VideoGroup> {
        self.client.insert(VIDEO_GROUP_TABLE, &group).await
    }

    async fn update_video_group(
        &self,
        id: Uuid,
        group: NewVideoGroup,
    ) -> Result<Option<VideoGroup>> {
        let rows: Vec<VideoGroup> = self
            .client
            .update(VIDEO_GROUP_TABLE, &eq("id", &id.to_string()), &group)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_video_group(&self, id: Uuid) -> Result<bool> {
        let removed = self
            .client
            .delete(VIDEO_GROUP_TABLE, &eq("id", &id.to_string()))
            .await?;
        Ok(removed > 0)
    }

    async fn list_video_subgroups(&self, group_id: Option<Uuid>) -> Result<Vec<VideoSubgroup>> {
        let mut query = "select=*&order=display_order.asc".to_string();
        if let Some(group_id) = group_id {
            query.push('&');
            query.push_str(&eq("group_id", &group_id.to_string()));
        }
        self.client
            .select(VIDEO_SUBGROUP_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn create_video_subgroup(&self, subgroup: NewVideoSubgroup) -> Result<VideoSubgroup> {
        self.client.insert(VIDEO_SUBGROUP_TABLE, &subgroup).await
    }

    async fn update_video_subgroup(
        &self,
        id: Uuid,
        subgroup: NewVideoSubgroup,
    ) -> Result<Option<VideoSubgroup>> {
        let rows: Vec<VideoSubgroup> = self
            .client
            .update(VIDEO_SUBGROUP_TABLE, &eq("id", &id.to_string()), &subgroup)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_video_subgroup(&self, id: Uuid) -> Result<bool> {
        let removed = self
            .client
            .delete(VIDEO_SUBGROUP_TABLE, &eq("id", &id.to_string()))
            .await?;
        Ok(removed > 0)
    }

    async fn bookmark_exists(&self, bookmark: &Bookmark) -> Result<bool> {
        let query = format!("select=user_id&{}&limit=1", bookmark_filter(bookmark));
        let rows: Vec<serde_json::Value> = self
            .client
            .select(BOOKMARK_TABLE, &query, KeyTier::ServiceRole)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        self.client.insert_minimal(BOOKMARK_TABLE, &bookmark).await
    }

    async fn delete_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        self.client
            .delete(BOOKMARK_TABLE, &bookmark_filter(bookmark))
            .await
            .map(|_| ())
    }

    async fn upsert_rating(&self, rating: Rating) -> Result<()> {
        self.client
            .upsert(RATING_TABLE, "user_id,entity_type,entity_id", &rating)
            .await
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let body = serde_json::json!({
            "user_id": feedback.user_id,
            "entity_type": feedback.entity_type,
            "entity_id": feedback.entity_id,
            "message": feedback.message,
            "status": FeedbackStatus::Pending,
        });
        self.client.insert(FEEDBACK_TABLE, &body).await
    }

    async fn list_feedback(&self, status: Option<FeedbackStatus>) -> Result<Vec<Feedback>> {
        let mut query = "select=*&order=created_at.desc".to_string();
        if let Some(status) = status {
            query.push('&');
            query.push_str(&eq("status", status.as_str()));
        }
        self.client
            .select(FEEDBACK_TABLE, &query, KeyTier::ServiceRole)
            .await
    }

    async fn update_feedback(
        &self,
        id: Uuid,
        status: FeedbackStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Feedback>> {
        let mut body = serde_json::json!({ "status": status });
        if let Some(notes) = admin_notes {
            body["admin_notes"] = serde_json::json!(notes);
        }
        let rows: Vec<Feedback> = self
            .client
            .update(FEEDBACK_TABLE, &eq("id", &id.to_string()), &body)
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(SupabaseClient::new(
            &server.uri(),
            "anon-key",
            "service-key",
            Duration::from_secs(5),
        ))
    }

    #[test]
    fn test_no_rows_detection() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(is_no_rows(body));

        let many = r#"{"code":"PGRST116","details":"The result contains 2 rows","message":"x"}"#;
        assert!(!is_no_rows(many));
        assert!(!is_no_rows("not json"));
    }

    #[test]
    fn test_eq_filter_is_url_encoded() {
        assert_eq!(eq("name", "3-Day Trial"), "name=eq.3-Day%20Trial");
    }

    #[tokio::test]
    async fn test_missing_page_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/pages"))
            .and(query_param("slug", "eq.missing"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(406).set_body_json(serde_json::json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned"
            })))
            .mount(&server)
            .await;

        let page = store_for(&server).get_page("missing").await.unwrap();
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_database_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/topics"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"message": "relation does not exist"})),
            )
            .mount(&server)
            .await;

        let err = store_for(&server).list_topics().await.unwrap_err();
        match err {
            GatewayError::Database(msg) => assert!(msg.contains("relation does not exist")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_writes_use_service_role_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/question_topics"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .insert_topic_link(TopicLink {
                question_id: Uuid::new_v4(),
                topic_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
    }
}
