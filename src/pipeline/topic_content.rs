//! Generate structured clinical content for a list of topic titles
//!
//! One new topic row per successful title. There is no existence check, so
//! running the same list twice creates duplicate rows.

use tracing::{info, warn};

use crate::ai::{parse_topic_content, CompletionProvider, CompletionRequest};
use crate::db::ContentStore;

use super::{BatchSummary, PipelineError};

const CONTENT_SYSTEM_PROMPT: &str = "You are a medical educator writing concise revision \
notes for medical licensing exams. You answer only with JSON.";

pub fn build_content_request(title: &str) -> CompletionRequest {
    let prompt = format!(
        "Write revision notes for the topic \"{title}\".\n\
         Return a JSON object with exactly these string fields:\n\
         - \"definition\": one or two sentences\n\
         - \"causes\": main causes and risk factors\n\
         - \"symptoms\": key symptoms and signs\n\
         - \"diagnostic_tests\": investigations and diagnostic criteria\n\
         - \"treatment\": first-line management\n\
         - \"video_embed\": a YouTube embed URL for a reputable explainer, or an empty string"
    );
    CompletionRequest::user(prompt)
        .with_system(CONTENT_SYSTEM_PROMPT)
        .with_temperature(0.3)
        .with_json_output()
}

pub async fn generate_topic_content(
    store: &dyn ContentStore,
    ai: &dyn CompletionProvider,
    titles: &[String],
) -> Result<BatchSummary, PipelineError> {
    if titles.is_empty() {
        return Err(PipelineError::EmptyInput("topics"));
    }

    info!(topics = titles.len(), provider = ai.name(), "Starting topic content batch");

    let mut summary = BatchSummary::default();
    for raw_title in titles {
        let title = raw_title.trim();
        if title.is_empty() {
            summary.record_error(&format!("{:?}", raw_title), "topic title is empty");
            continue;
        }

        match generate_one(store, ai, title).await {
            Ok(()) => summary.record_success(),
            Err(message) => {
                warn!(topic = %title, error = %message, "Topic content generation failed");
                summary.record_error(title, message);
            }
        }
    }

    info!(
        success = summary.success_count,
        errors = summary.error_count,
        "Topic content batch finished"
    );
    Ok(summary)
}

async fn generate_one(
    store: &dyn ContentStore,
    ai: &dyn CompletionProvider,
    title: &str,
) -> Result<(), String> {
    let raw = ai
        .complete(build_content_request(title))
        .await
        .map_err(|e| format!("AI request failed: {}", e))?;
    let draft = parse_topic_content(&raw)?;
    let row = store
        .insert_topic(draft.into_new_topic(title))
        .await
        .map_err(|e| e.to_string())?;
    info!(topic = %row.title, id = %row.id, "Topic content created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockProvider;
    use crate::db::MemoryStore;

    const VALID: &str = r#"{"definition":"Chronic airway inflammation","causes":"Atopy","symptoms":"Wheeze","diagnostic_tests":"Spirometry","treatment":"ICS","video_embed":"https://www.youtube.com/embed/x"}"#;

    #[tokio::test]
    async fn test_each_title_inserts_a_row_and_reruns_duplicate() {
        let store = MemoryStore::new();
        let ai = MockProvider::new().with_response(VALID);
        let titles = vec!["Asthma".to_string()];

        let first = generate_topic_content(&store, &ai, &titles).await.unwrap();
        let second = generate_topic_content(&store, &ai, &titles).await.unwrap();

        assert_eq!(first.success_count, 1);
        assert_eq!(second.success_count, 1);
        assert_eq!(store.topic_count().await, 2);
    }

    #[tokio::test]
    async fn test_schema_violations_are_item_errors() {
        let store = MemoryStore::new();
        let ai = MockProvider::new().with_script(vec![
            Ok(r#"{"definition":"only this"}"#.into()),
            Ok(VALID.into()),
        ]);
        let titles = vec![
            "Sepsis".to_string(),
            "  ".to_string(),
            "Asthma".to_string(),
        ];

        let summary = generate_topic_content(&store, &ai, &titles).await.unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 2);
        assert!(summary.errors[0].starts_with("Sepsis: "));
        assert_eq!(summary.errors[1], "\"  \": topic title is empty");
        assert_eq!(ai.call_count(), 2);

        let topics = store.list_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title, "Asthma");
        assert_eq!(topics[0].diagnostic_tests.as_deref(), Some("Spirometry"));
    }
}
