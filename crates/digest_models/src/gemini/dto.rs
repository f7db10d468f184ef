//! Wire types for the Gemini REST API.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Text part of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Part {
    /// Text payload
    #[serde(default)]
    #[getter(skip)]
    text: String,
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A content block: one turn of the conversation or the system instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Content {
    /// `user` or `model`; absent on system instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    /// Parts of the block
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// A system instruction holding a single text part.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// All text parts concatenated.
    pub fn joined_text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Controls the model's internal reasoning budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// Token budget for thinking; zero disables it
    thinking_budget: u32,
}

impl ThinkingConfig {
    /// Thinking switched off.
    pub fn disabled() -> Self {
        Self { thinking_budget: 0 }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct GenerationConfig {
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Thinking configuration
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    /// Creates a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }
}

/// Body of `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct GenerateContentRequest {
    /// Fully qualified model name, only used inside `countTokens`
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    /// System instruction
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    /// Conversation turns
    contents: Vec<Content>,
    /// Sampling parameters
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Creates a new builder for `GenerateContentRequest`.
    pub fn builder() -> GenerateContentRequestBuilder {
        GenerateContentRequestBuilder::default()
    }
}

/// Token accounting returned with a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt
    #[serde(default)]
    prompt_token_count: u64,
    /// Tokens across all candidates
    #[serde(default)]
    candidates_token_count: u64,
    /// Prompt, candidates and thinking tokens
    #[serde(default)]
    total_token_count: u64,
}

/// One generated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; missing when the candidate was blocked
    #[serde(default)]
    content: Option<Content>,
    /// Why generation stopped
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Response of `generateContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates
    #[serde(default)]
    candidates: Vec<Candidate>,
    /// Token accounting
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// Body of `models/{model}:countTokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensRequest {
    /// The request whose input should be counted
    generate_content_request: GenerateContentRequest,
}

impl CountTokensRequest {
    /// Wrap a generation request for counting.
    pub fn new(generate_content_request: GenerateContentRequest) -> Self {
        Self {
            generate_content_request,
        }
    }
}

/// Response of `countTokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    /// Input tokens of the counted request
    #[serde(default)]
    total_tokens: u64,
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) status: Option<String>,
}
