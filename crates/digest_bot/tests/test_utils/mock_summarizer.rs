//! Mock summarizer for testing.

use async_trait::async_trait;
use digest_core::{SummaryRequest, SummaryResponse, TokenUsage};
use digest_error::{DigestResult, GeminiError, GeminiErrorKind};
use digest_interface::Summarizer;
use std::sync::{Arc, Mutex};

/// Behavior configuration for mock responses.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always return success with the given text
    Success(String),
    /// Always return the specified error
    Error(GeminiErrorKind),
    /// Fail N times with the error, then succeed with the text
    FailThenSucceed {
        fail_count: usize,
        error: GeminiErrorKind,
        success_text: String,
    },
}

/// Mock summarizer for testing.
///
/// Lets tests script responses, reported usage and token counts, and
/// inspect what the service sent.
pub struct MockSummarizer {
    behavior: MockBehavior,
    usage: Option<TokenUsage>,
    token_count: Option<u64>,
    call_count: Arc<Mutex<usize>>,
    count_calls: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<SummaryRequest>>>,
}

impl MockSummarizer {
    /// Create a mock that always succeeds with the given text.
    pub fn new_success(text: impl Into<String>) -> Self {
        Self::new_with_behavior(MockBehavior::Success(text.into()))
    }

    /// Create a mock that always fails with the given error.
    #[allow(dead_code)]
    pub fn new_error(error: GeminiErrorKind) -> Self {
        Self::new_with_behavior(MockBehavior::Error(error))
    }

    /// Create a mock with custom behavior.
    pub fn new_with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            usage: None,
            token_count: None,
            call_count: Arc::new(Mutex::new(0)),
            count_calls: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report this usage with every successful summary.
    #[allow(dead_code)]
    pub fn with_usage(mut self, prompt_tokens: u64, completion_tokens: u64) -> Self {
        self.usage = Some(TokenUsage::new(prompt_tokens, completion_tokens));
        self
    }

    /// Answer `count_tokens` with this value. Without one, counting fails.
    #[allow(dead_code)]
    pub fn with_token_count(mut self, tokens: u64) -> Self {
        self.token_count = Some(tokens);
        self
    }

    /// Number of times summarize() was called.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Number of times count_tokens() was called.
    #[allow(dead_code)]
    pub fn count_calls(&self) -> usize {
        *self.count_calls.lock().unwrap()
    }

    /// Requests passed to summarize(), in order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> DigestResult<SummaryResponse> {
        let mut count = self.call_count.lock().unwrap();
        let current_count = *count;
        *count += 1;

        let text = match &self.behavior {
            MockBehavior::Success(text) => text.clone(),
            MockBehavior::Error(error_kind) => {
                return Err(GeminiError::new(error_kind.clone()).into());
            }
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success_text,
            } => {
                if current_count < *fail_count {
                    return Err(GeminiError::new(error.clone()).into());
                }
                success_text.clone()
            }
        };

        Ok(SummaryResponse {
            text,
            usage: self.usage,
        })
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, req: &SummaryRequest) -> DigestResult<SummaryResponse> {
        self.requests.lock().unwrap().push(req.clone());
        self.next_response()
    }

    async fn count_tokens(&self, _req: &SummaryRequest) -> DigestResult<u64> {
        *self.count_calls.lock().unwrap() += 1;
        match self.token_count {
            Some(tokens) => Ok(tokens),
            None => Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code: 503,
                message: "UNAVAILABLE: token counting offline".to_string(),
            })
            .into()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-summarizer"
    }
}
