//! Question bank rows

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const QUESTION_TABLE: &str = "questions";

/// Multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Correct option tag: A, B, C or D
    pub correct_option: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topic_id: Option<Uuid>,
}

impl Question {
    /// Options labelled the way the client renders them
    pub fn labelled_options(&self) -> [(char, &str); 4] {
        [
            ('A', self.option_a.as_str()),
            ('B', self.option_b.as_str()),
            ('C', self.option_c.as_str()),
            ('D', self.option_d.as_str()),
        ]
    }
}
