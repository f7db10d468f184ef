//! Gemini Generative Language API integration.

mod client;
mod conversion;
mod dto;

pub use client::{DEFAULT_BASE_URL, GeminiSummarizer};
pub use dto::{
    Candidate, Content, CountTokensRequest, CountTokensResponse, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part, ThinkingConfig, UsageMetadata,
};
