//! Test utilities for digest_models tests.

pub mod http_stub;

#[allow(unused_imports)]
pub use http_stub::{StubRequest, StubResponse, StubServer};

use digest_core::SummaryRequest;

/// Helper to create a summary request using the builder pattern.
pub fn create_test_request(transcript: &str) -> SummaryRequest {
    SummaryRequest::builder()
        .system_prompt("Summarize the conversation.")
        .transcript(transcript)
        .build()
        .expect("Failed to build test request")
}
