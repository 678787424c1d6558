//! Scripted completion provider for tests and local runs

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::{AiError, CompletionProvider, CompletionRequest};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, AiError> + Send + Sync>;

/// Mock provider
///
/// Answers from a queue of scripted results first, then from the responder
/// (or a fixed default).
pub struct MockProvider {
    scripted: Mutex<VecDeque<Result<String, AiError>>>,
    responder: Option<Responder>,
    default_response: String,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            responder: None,
            default_response: "None".to_string(),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Fixed answer for every call
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = content.into();
        self
    }

    /// Queue results consumed one per call, in order
    pub fn with_script(self, results: Vec<Result<String, AiError>>) -> Self {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.extend(results);
        }
        self
    }

    /// Compute the answer from the request
    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, AiError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.scripted.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(result) = scripted {
            return result;
        }

        match &self.responder {
            Some(f) => f(&request),
            None => Ok(self.default_response.clone()),
        }
    }
}
