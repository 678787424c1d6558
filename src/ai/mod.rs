//! AI completion providers
//!
//! [`CompletionProvider`] is the seam between the pipelines and the hosted
//! models. OpenAI and Gemini speak their own wire formats; the mock is
//! scripted for tests.

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod parse;
pub mod traits;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use parse::{
    parse_blog_draft, parse_topic_content, parse_topic_match, BlogDraft, TopicContentDraft,
    TopicMatch,
};
pub use traits::{AiError, CompletionProvider, CompletionRequest};
