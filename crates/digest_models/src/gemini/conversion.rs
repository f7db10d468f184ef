//! Conversions between digest request types and the Gemini wire format.

use super::dto::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ThinkingConfig,
};
use digest_core::{SummaryRequest, SummaryResponse, TokenUsage};
use digest_error::{GeminiError, GeminiErrorKind};

/// Qualify a bare model id with the `models/` prefix the API expects.
pub(crate) fn model_path(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

/// Build the `generateContent` body for a summary request.
///
/// Thinking is disabled: summaries do not benefit from it and it inflates
/// token usage.
pub(crate) fn to_generate_request(
    req: &SummaryRequest,
    default_temperature: Option<f32>,
) -> Result<GenerateContentRequest, GeminiError> {
    let generation_config = GenerationConfig::builder()
        .temperature((*req.temperature()).or(default_temperature))
        .thinking_config(ThinkingConfig::disabled())
        .build()
        .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;

    let system_instruction = if req.system_prompt().is_empty() {
        None
    } else {
        Some(Content::system(req.system_prompt().as_str()))
    };

    GenerateContentRequest::builder()
        .system_instruction(system_instruction)
        .contents(vec![Content::user(req.transcript().as_str())])
        .generation_config(generation_config)
        .build()
        .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))
}

/// Extract the summary text and usage from a `generateContent` response.
pub(crate) fn from_generate_response(
    response: &GenerateContentResponse,
) -> Result<SummaryResponse, GeminiError> {
    let text = response
        .candidates()
        .first()
        .and_then(|candidate| candidate.content().as_ref())
        .map(|content| content.joined_text())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GeminiError::new(GeminiErrorKind::EmptyResponse));
    }

    // totalTokenCount includes thinking tokens, which are billed as output.
    let usage = response.usage_metadata().as_ref().map(|usage| {
        let prompt = *usage.prompt_token_count();
        let output = usage
            .total_token_count()
            .saturating_sub(prompt)
            .max(*usage.candidates_token_count());
        TokenUsage::new(prompt, output)
    });

    Ok(SummaryResponse { text, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SummaryRequest {
        SummaryRequest::builder()
            .system_prompt("Summarize.")
            .transcript("Message #1 | ada | hi | 2025-01-01 10:00:00 UTC")
            .build()
            .unwrap()
    }

    #[test]
    fn test_model_path_prefix() {
        assert_eq!(model_path("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(model_path("models/gemini-2.5-flash"), "models/gemini-2.5-flash");
    }

    #[test]
    fn test_request_body_shape() {
        let body = to_generate_request(&request(), Some(1.0)).unwrap();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Summarize.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["temperature"], 1.0);
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_request_temperature_overrides_default() {
        let req = SummaryRequest::builder()
            .system_prompt("")
            .transcript("x")
            .temperature(Some(0.5_f32))
            .build()
            .unwrap();
        let body = to_generate_request(&req, Some(1.0)).unwrap();
        assert_eq!(
            *body.generation_config().as_ref().unwrap().temperature(),
            Some(0.5)
        );
        assert!(body.system_instruction().is_none());
    }

    #[test]
    fn test_response_text_and_usage() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Ada said " }, { "text": "hi." }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 8, "totalTokenCount": 128 }
            }"#,
        )
        .unwrap();

        let summary = from_generate_response(&response).unwrap();
        assert_eq!(summary.text, "Ada said hi.");
        assert_eq!(summary.usage, Some(TokenUsage::new(120, 8)));
    }

    #[test]
    fn test_blocked_candidate_is_empty_response() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#,
        )
        .unwrap();
        let err = from_generate_response(&response).unwrap_err();
        assert_eq!(err.kind, GeminiErrorKind::EmptyResponse);
    }
}
