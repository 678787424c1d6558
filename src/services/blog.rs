//! Auto-blog generator
//!
//! fetch subject -> ask the model for a draft -> insert a published post.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::ai::{parse_blog_draft, CompletionProvider, CompletionRequest};
use crate::db::schemas::{BlogPost, NewBlogPost};
use crate::db::ContentStore;
use crate::types::{GatewayError, Result};

const BLOG_SYSTEM_PROMPT: &str = "You write accessible, accurate study articles for students \
preparing for medical licensing exams. You answer only with JSON.";

/// Lowercase ASCII slug with single dashes between words
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "post".to_string()
    } else {
        trimmed.to_string()
    }
}

fn dated_slug(title: &str, date: NaiveDate) -> String {
    format!("{}-{}", slugify(title), date.format("%Y%m%d"))
}

pub fn build_blog_request(subject: &str) -> CompletionRequest {
    let prompt = format!(
        "Write a blog article about \"{subject}\" for medical exam candidates.\n\
         Return a JSON object with string fields:\n\
         - \"title\": a specific, readable headline\n\
         - \"excerpt\": one or two sentences for listings\n\
         - \"content\": the article body in Markdown, 400 to 700 words"
    );
    CompletionRequest::user(prompt)
        .with_system(BLOG_SYSTEM_PROMPT)
        .with_temperature(0.7)
        .with_json_output()
}

/// Generate and publish a post about `subject`, or about the newest topic
pub async fn generate_blog_post(
    store: &dyn ContentStore,
    ai: &dyn CompletionProvider,
    subject: Option<&str>,
) -> Result<BlogPost> {
    let subject = match subject.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => latest_topic_title(store).await?,
    };
    debug!(subject = %subject, provider = ai.name(), "Generating blog post");

    let raw = ai.complete(build_blog_request(&subject)).await?;
    let draft = parse_blog_draft(&raw)
        .map_err(|e| GatewayError::Internal(format!("Invalid blog draft: {}", e)))?;

    let base = dated_slug(&draft.title, Utc::now().date_naive());
    let slug = unique_slug(store, &base).await?;

    let post = store
        .insert_blog(NewBlogPost {
            slug,
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            published: true,
        })
        .await?;
    info!(slug = %post.slug, id = %post.id, "Blog post published");
    Ok(post)
}

async fn latest_topic_title(store: &dyn ContentStore) -> Result<String> {
    store
        .list_topics()
        .await?
        .into_iter()
        .max_by_key(|t| t.created_at)
        .map(|t| t.title)
        .ok_or_else(|| {
            GatewayError::Validation("subject is required when no topics exist".to_string())
        })
}

async fn unique_slug(store: &dyn ContentStore, base: &str) -> Result<String> {
    if !store.blog_slug_exists(base).await? {
        return Ok(base.to_string());
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !store.blog_slug_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockProvider;
    use crate::db::schemas::Topic;
    use crate::db::MemoryStore;
    use chrono::Duration;
    use uuid::Uuid;

    const DRAFT: &str =
        r###"{"title":"Asthma: What Every Candidate Should Know","excerpt":"A primer.","content":"## Overview\nText"}"###;

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Asthma: What Every Candidate Should Know"),
            "asthma-what-every-candidate-should-know"
        );
        assert_eq!(slugify("  --Heart  Failure!! "), "heart-failure");
        assert_eq!(slugify("???"), "post");
    }

    #[test]
    fn test_dated_slug_suffix() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(dated_slug("Sepsis 101", date), "sepsis-101-20240309");
    }

    #[tokio::test]
    async fn test_colliding_slugs_get_numeric_suffix() {
        let store = MemoryStore::new();
        let ai = MockProvider::new().with_response(DRAFT);

        let first = generate_blog_post(&store, &ai, Some("asthma")).await.unwrap();
        let second = generate_blog_post(&store, &ai, Some("asthma")).await.unwrap();

        assert!(first.published);
        assert!(first.slug.starts_with("asthma-what-every-candidate-should-know-"));
        assert_eq!(second.slug, format!("{}-2", first.slug));
    }

    #[tokio::test]
    async fn test_defaults_to_newest_topic() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (title, age) in [("Older", 2), ("Newest", 0)] {
            store
                .add_topic(Topic {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    definition: None,
                    causes: None,
                    symptoms: None,
                    diagnostic_tests: None,
                    treatment: None,
                    video_embed: None,
                    created_at: Some(now - Duration::days(age)),
                })
                .await;
        }
        let ai = MockProvider::new().with_response(DRAFT);

        generate_blog_post(&store, &ai, None).await.unwrap();
        assert!(ai.requests()[0].prompt.contains("\"Newest\""));
    }

    #[tokio::test]
    async fn test_no_subject_and_no_topics_is_validation_error() {
        let store = MemoryStore::new();
        let ai = MockProvider::new().with_response(DRAFT);
        let err = generate_blog_post(&store, &ai, Some("  ")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(ai.call_count(), 0);
    }
}
