//! Typed parsing of model output
//!
//! Model answers are free text. Everything the pipelines act on goes through
//! one of these parsers first, so a malformed answer becomes a value rather
//! than a silent mismatch.

use serde::Deserialize;

use crate::db::schemas::{NewTopic, Topic};

/// Literal the matcher prompt asks for when nothing fits
pub const NO_MATCH_ANSWER: &str = "None";

/// Outcome of asking the model to pick a topic
#[derive(Debug, Clone, PartialEq)]
pub enum TopicMatch {
    Matched(Topic),
    NoMatch,
    ParseError(String),
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[derive(Deserialize)]
struct TopicAnswer {
    topic: Option<String>,
}

/// Parse the matcher's answer against the known topic set
///
/// Accepts `{"topic": "<title>"}` or a bare (optionally quoted) title. An
/// answer that is neither a known title nor `None` is treated as no match.
pub fn parse_topic_match(raw: &str, topics: &[Topic]) -> TopicMatch {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return TopicMatch::ParseError("empty response".to_string());
    }

    let answer = if body.starts_with('{') {
        match serde_json::from_str::<TopicAnswer>(body) {
            Ok(TopicAnswer { topic: Some(t) }) => t,
            Ok(TopicAnswer { topic: None }) => return TopicMatch::NoMatch,
            Err(e) => return TopicMatch::ParseError(format!("invalid JSON answer: {}", e)),
        }
    } else {
        body.trim_matches('"').to_string()
    };

    let answer = answer.trim();
    if answer.is_empty() || answer == NO_MATCH_ANSWER {
        return TopicMatch::NoMatch;
    }

    match topics.iter().find(|t| t.title == answer) {
        Some(topic) => TopicMatch::Matched(topic.clone()),
        None => TopicMatch::NoMatch,
    }
}

/// Structured clinical content requested per topic title
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TopicContentDraft {
    pub definition: String,
    pub causes: String,
    pub symptoms: String,
    #[serde(alias = "diagnosticTests", alias = "diagnostic_criteria")]
    pub diagnostic_tests: String,
    pub treatment: String,
    #[serde(default, alias = "videoEmbed")]
    pub video_embed: Option<String>,
}

impl TopicContentDraft {
    pub fn into_new_topic(self, title: &str) -> NewTopic {
        NewTopic {
            title: title.to_string(),
            definition: self.definition,
            causes: self.causes,
            symptoms: self.symptoms,
            diagnostic_tests: self.diagnostic_tests,
            treatment: self.treatment,
            video_embed: self.video_embed.filter(|v| !v.trim().is_empty()),
        }
    }
}

/// Validate the generator's JSON against the content schema
pub fn parse_topic_content(raw: &str) -> Result<TopicContentDraft, String> {
    let draft: TopicContentDraft = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| format!("response does not match content schema: {}", e))?;

    let required = [
        ("definition", &draft.definition),
        ("causes", &draft.causes),
        ("symptoms", &draft.symptoms),
        ("diagnostic_tests", &draft.diagnostic_tests),
        ("treatment", &draft.treatment),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(format!("field '{}' is empty", field));
    }
    Ok(draft)
}

/// Blog post draft produced by the auto-blog generator
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BlogDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
}

pub fn parse_blog_draft(raw: &str) -> Result<BlogDraft, String> {
    let draft: BlogDraft = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| format!("response does not match blog schema: {}", e))?;
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err("blog draft has an empty title or content".to_string());
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn topic(title: &str) -> Topic {
        Topic {
            id: Uuid::new_v4(),
            title: title.to_string(),
            definition: None,
            causes: None,
            symptoms: None,
            diagnostic_tests: None,
            treatment: None,
            video_embed: None,
            created_at: None,
        }
    }

    #[test]
    fn test_json_answer_matches_exact_title() {
        let topics = vec![topic("Asthma"), topic("Pneumonia")];
        match parse_topic_match(r#"{"topic": "Pneumonia"}"#, &topics) {
            TopicMatch::Matched(t) => assert_eq!(t.title, "Pneumonia"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_and_fenced_answers() {
        let topics = vec![topic("Asthma")];
        assert!(matches!(
            parse_topic_match("\"Asthma\"\n", &topics),
            TopicMatch::Matched(_)
        ));
        assert!(matches!(
            parse_topic_match("```json\n{\"topic\":\"Asthma\"}\n```", &topics),
            TopicMatch::Matched(_)
        ));
    }

    #[test]
    fn test_none_and_unknown_titles_are_no_match() {
        let topics = vec![topic("Asthma")];
        assert_eq!(parse_topic_match("None", &topics), TopicMatch::NoMatch);
        assert_eq!(
            parse_topic_match(r#"{"topic":"None"}"#, &topics),
            TopicMatch::NoMatch
        );
        // Near misses are not matches
        assert_eq!(parse_topic_match("asthma", &topics), TopicMatch::NoMatch);
    }

    #[test]
    fn test_broken_json_is_parse_error() {
        let topics = vec![topic("Asthma")];
        assert!(matches!(
            parse_topic_match(r#"{"topic": "#, &topics),
            TopicMatch::ParseError(_)
        ));
        assert!(matches!(parse_topic_match("   ", &topics), TopicMatch::ParseError(_)));
    }

    #[test]
    fn test_topic_content_requires_every_section() {
        let ok = r#"{"definition":"d","causes":"c","symptoms":"s","diagnostic_tests":"t","treatment":"tx","video_embed":""}"#;
        let draft = parse_topic_content(ok).unwrap();
        assert_eq!(draft.clone().into_new_topic("Asthma").video_embed, None);

        let missing = r#"{"definition":"d","causes":"c","symptoms":"s","treatment":"tx"}"#;
        assert!(parse_topic_content(missing).is_err());

        let empty = r#"{"definition":"d","causes":" ","symptoms":"s","diagnostic_tests":"t","treatment":"tx"}"#;
        assert_eq!(parse_topic_content(empty).unwrap_err(), "field 'causes' is empty");
    }

    #[test]
    fn test_blog_draft() {
        let draft =
            parse_blog_draft(r##"{"title":"T","excerpt":"E","content":"# Body"}"##).unwrap();
        assert_eq!(draft.title, "T");
        assert!(parse_blog_draft(r#"{"title":"","excerpt":"","content":"x"}"#).is_err());
    }
}
