//! Gemini REST client implementing [`Summarizer`].

use super::conversion::{from_generate_response, model_path, to_generate_request};
use super::dto::{
    ApiErrorBody, CountTokensRequest, CountTokensResponse, GenerateContentRequest,
    GenerateContentResponse,
};
use async_trait::async_trait;
use digest_core::{SummaryRequest, SummaryResponse};
use digest_error::{DigestResult, GeminiError, GeminiErrorKind};
use digest_interface::Summarizer;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

/// Production endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Summarizer backed by the Gemini REST API.
///
/// Transient failures (408, 429, 5xx, connection errors) are retried with
/// exponential backoff and jitter, using the per-status strategy from
/// [`GeminiErrorKind::retry_strategy_params`].
#[derive(Clone)]
pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    /// Retry configuration
    no_retry: bool,
    max_retries: Option<usize>,
    retry_backoff_ms: Option<u64>,
}

impl std::fmt::Debug for GeminiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSummarizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("no_retry", &self.no_retry)
            .finish_non_exhaustive()
    }
}

impl GeminiSummarizer {
    /// Create a summarizer for `model`.
    ///
    /// Reads the API key from the `GEMINI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or empty.
    #[instrument(name = "gemini_summarizer_new", skip_all)]
    pub fn new(model: impl Into<String>) -> Result<Self, GeminiError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GeminiError::new(GeminiErrorKind::MissingApiKey))?;
        Self::with_api_key(api_key, model)
    }

    /// Create a summarizer with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns `ClientCreation` if the HTTP client cannot be built.
    #[instrument(name = "gemini_summarizer_with_api_key", skip_all)]
    pub fn with_api_key(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            temperature: None,
            no_retry: false,
            max_retries: None,
            retry_backoff_ms: None,
        })
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Temperature used when a request does not set one.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the retry behaviour.
    ///
    /// * `no_retry` - Disable automatic retry
    /// * `max_retries` - Override maximum retry attempts
    /// * `retry_backoff_ms` - Override initial backoff delay
    pub fn with_retry(
        mut self,
        no_retry: bool,
        max_retries: Option<usize>,
        retry_backoff_ms: Option<u64>,
    ) -> Self {
        self.no_retry = no_retry;
        self.max_retries = max_retries;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model_path(model), method)
    }

    fn model_for<'a>(&'a self, req: &'a SummaryRequest) -> &'a str {
        req.model().as_deref().unwrap_or(&self.model)
    }

    /// POST a JSON body and decode the JSON answer, mapping failures to Gemini errors.
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeminiError::new(GeminiErrorKind::ApiRequest(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| match body.error.status {
                    Some(status) => format!("{}: {}", status, body.error.message),
                    None => body.error.message,
                })
                .unwrap_or(error_text);
            return Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GeminiError::new(GeminiErrorKind::ResponseParsing(e.to_string())))
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// The first failure picks the backoff strategy, so a 429 backs off
    /// longer than a 502.
    async fn with_retry_policy<T, F, Fut>(&self, operation: F) -> Result<T, GeminiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GeminiError>>,
    {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if self.no_retry || !err.kind.is_retryable() {
            warn!(error = %err, "Gemini request failed");
            return Err(err);
        }

        let (mut initial_ms, mut retries, max_delay_secs) = err.kind.retry_strategy_params();
        if let Some(override_backoff) = self.retry_backoff_ms {
            initial_ms = override_backoff;
        }
        if let Some(override_retries) = self.max_retries {
            retries = override_retries;
        }

        info!(
            error = %err,
            initial_backoff_ms = initial_ms,
            max_retries = retries,
            max_delay_secs,
            "Gemini request failed, will retry with configured strategy"
        );

        let mut retry_strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(retries);

        // The failed attempt above counts as the first try.
        let Some(first_delay) = retry_strategy.next() else {
            return Err(err);
        };
        tokio::time::sleep(first_delay).await;

        let operation = &operation;
        Retry::spawn(retry_strategy, move || async move {
            match operation().await {
                Ok(value) => Ok(value),
                Err(e) if e.kind.is_retryable() => {
                    warn!(error = %e, "Gemini request failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent Gemini error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    #[instrument(skip(self, req), fields(model = %self.model_for(req)))]
    async fn summarize(&self, req: &SummaryRequest) -> DigestResult<SummaryResponse> {
        let body = to_generate_request(req, self.temperature)?;
        let url = self.endpoint(self.model_for(req), "generateContent");
        debug!(url = %url, "Sending generateContent request");

        let response: GenerateContentResponse = self
            .with_retry_policy(|| self.post_json(&url, &body))
            .await?;
        let summary = from_generate_response(&response)?;

        if let Some(usage) = &summary.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens(),
                completion_tokens = usage.completion_tokens(),
                "Gemini usage"
            );
        }
        Ok(summary)
    }

    #[instrument(skip(self, req), fields(model = %self.model_for(req)))]
    async fn count_tokens(&self, req: &SummaryRequest) -> DigestResult<u64> {
        let model = self.model_for(req);
        let full = to_generate_request(req, self.temperature)?;
        // Only the input is counted; generation settings are left out.
        let inner = GenerateContentRequest::builder()
            .model(model_path(model))
            .system_instruction(full.system_instruction().clone())
            .contents(full.contents().clone())
            .build()
            .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;
        let body = CountTokensRequest::new(inner);
        let url = self.endpoint(model, "countTokens");

        let response: CountTokensResponse = self
            .with_retry_policy(|| self.post_json(&url, &body))
            .await?;
        debug!(total_tokens = response.total_tokens(), "Counted tokens");
        Ok(*response.total_tokens())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
