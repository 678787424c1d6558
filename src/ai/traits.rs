//! Core trait for AI text completion

use async_trait::async_trait;

/// Error types for completion calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    /// API key missing for the provider
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Single-turn completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON object response
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Return the model's text answer
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;
}
