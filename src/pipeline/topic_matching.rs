//! Assign each question to its single best-matching topic
//!
//! Per question: load it, ask the model to pick one title from the full
//! topic list at zero temperature, then replace the question's topic links.
//! The delete and the insert are separate statements, so a reader can see
//! the question with no link in between.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{parse_topic_match, CompletionProvider, CompletionRequest, TopicMatch};
use crate::db::schemas::{Question, Topic, TopicLink};
use crate::db::ContentStore;

use super::{BatchSummary, PipelineError};

const MATCH_SYSTEM_PROMPT: &str = "You are a medical education assistant that files exam \
questions under study topics. You answer only with JSON.";

/// Batch tally plus how the successful items split
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    #[serde(flatten)]
    pub batch: BatchSummary,
    pub matched_count: usize,
    pub unmatched_count: usize,
}

/// Prompt embedding the question and every topic title
pub fn build_match_request(question: &Question, topics: &[Topic]) -> CompletionRequest {
    let mut prompt = format!("Question: {}\nOptions:\n", question.question_text.trim());
    for (label, text) in question.labelled_options() {
        prompt.push_str(&format!("{}. {}\n", label, text.trim()));
    }
    prompt.push_str("\nAvailable topics:\n");
    for topic in topics {
        prompt.push_str(&format!("- {}\n", topic.title));
    }
    prompt.push_str(
        "\nPick the single topic this question belongs to. Reply with \
         {\"topic\": \"<exact title from the list>\"}, or {\"topic\": \"None\"} \
         if no topic fits.",
    );

    CompletionRequest::user(prompt)
        .with_system(MATCH_SYSTEM_PROMPT)
        .with_temperature(0.0)
        .with_json_output()
}

/// Link every question id to its best topic
///
/// Fails as a whole only on empty input or an empty topic table, both
/// checked before the first completion call.
pub async fn link_questions_to_topics(
    store: &dyn ContentStore,
    ai: &dyn CompletionProvider,
    question_ids: &[String],
) -> Result<MatchSummary, PipelineError> {
    if question_ids.is_empty() {
        return Err(PipelineError::EmptyInput("questionIds"));
    }

    let topics = store.list_topics().await?;
    if topics.is_empty() {
        return Err(PipelineError::NoTopics);
    }

    info!(
        questions = question_ids.len(),
        topics = topics.len(),
        provider = ai.name(),
        "Starting topic matching batch"
    );

    let mut summary = MatchSummary::default();
    for raw_id in question_ids {
        match link_one(store, ai, &topics, raw_id).await {
            Ok(Some(topic)) => {
                debug!(question_id = %raw_id, topic = %topic.title, "Question linked");
                summary.batch.record_success();
                summary.matched_count += 1;
            }
            Ok(None) => {
                debug!(question_id = %raw_id, "No topic matched");
                summary.batch.record_success();
                summary.unmatched_count += 1;
            }
            Err(message) => {
                warn!(question_id = %raw_id, error = %message, "Topic matching failed");
                summary.batch.record_error(raw_id, message);
            }
        }
    }

    info!(
        success = summary.batch.success_count,
        errors = summary.batch.error_count,
        matched = summary.matched_count,
        "Topic matching batch finished"
    );
    Ok(summary)
}

async fn link_one(
    store: &dyn ContentStore,
    ai: &dyn CompletionProvider,
    topics: &[Topic],
    raw_id: &str,
) -> Result<Option<Topic>, String> {
    let question_id =
        Uuid::parse_str(raw_id.trim()).map_err(|_| "invalid question id".to_string())?;

    let question = store
        .get_question(question_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "question not found".to_string())?;

    let raw = ai
        .complete(build_match_request(&question, topics))
        .await
        .map_err(|e| format!("AI request failed: {}", e))?;

    match parse_topic_match(&raw, topics) {
        TopicMatch::ParseError(msg) => Err(format!("could not parse AI response: {}", msg)),
        TopicMatch::NoMatch => {
            store
                .delete_topic_links(question_id)
                .await
                .map_err(|e| e.to_string())?;
            Ok(None)
        }
        TopicMatch::Matched(topic) => {
            store
                .delete_topic_links(question_id)
                .await
                .map_err(|e| e.to_string())?;
            store
                .insert_topic_link(TopicLink {
                    question_id,
                    topic_id: topic.id,
                })
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(topic))
        }
    }
}
