//! Bulk AI pipelines
//!
//! Both pipelines walk their input strictly in order, one completion call at
//! a time. A failing item is recorded and the loop moves on; nothing is
//! retried or rolled back.

pub mod topic_content;
pub mod topic_matching;

use hyper::StatusCode;
use serde::Serialize;

use crate::types::GatewayError;

pub use topic_content::generate_topic_content;
pub use topic_matching::{link_questions_to_topics, MatchSummary};

/// Success/error tally for a batch
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub success_count: usize,
    pub error_count: usize,
    /// One entry per failed item, prefixed with the item's identifier
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_error(&mut self, item: &str, message: impl std::fmt::Display) {
        self.error_count += 1;
        self.errors.push(format!("{}: {}", item, message));
    }

    pub fn processed(&self) -> usize {
        self.success_count + self.error_count
    }
}

/// Whole-batch failures, raised before any item is processed
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0} must be a non-empty list")]
    EmptyInput(&'static str),

    #[error("No topics found. Create topics before linking questions.")]
    NoTopics,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::EmptyInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::NoTopics => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Gateway(e) => e.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_prefixes_item() {
        let mut summary = BatchSummary::default();
        summary.record_success();
        summary.record_error("q-2", "AI provider error: timeout");
        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.errors, vec!["q-2: AI provider error: timeout"]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["successCount"], 1);
        assert_eq!(json["errorCount"], 1);
    }
}
