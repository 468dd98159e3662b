//! AI provider integration for structured text and image generation
//!
//! Every provider implements [`GenerationClient`]: it receives an immutable
//! [`GenerationRequest`] plus the [`ExpectedShape`] the caller will validate
//! against, and returns the decoded value (or `None` when the provider gave
//! back nothing usable).

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod openai;
pub mod retry;

pub use gemini::GeminiClient;
pub use mock::MockGenerationClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

use crate::shape::ExpectedShape;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Structured JSON decoded toward the expected shape.
    Text,
    /// A single image, returned as `{"mimeType": ..., "data": <base64>}`.
    Image,
}

/// Prompt plus generation parameters for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    system: Option<String>,
    modality: Modality,
    max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn text(prompt: String) -> Self {
        Self {
            prompt,
            system: None,
            modality: Modality::Text,
            max_output_tokens: None,
        }
    }

    pub fn image(prompt: String) -> Self {
        Self {
            modality: Modality::Image,
            ..Self::text(prompt)
        }
    }

    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        shape: &ExpectedShape,
    ) -> Result<Option<Value>>;
}

/// Decode a model's JSON text reply. Blank text counts as no result.
pub(crate) fn parse_structured_text(text: &str) -> Result<Option<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| crate::Error::AiProvider(format!("Model returned malformed JSON: {}", e)))
}

/// Wrap raw image bytes in the value shape image steps validate against.
pub(crate) fn image_value(mime_type: &str, bytes: &[u8]) -> Value {
    use base64::Engine as _;
    serde_json::json!({
        "mimeType": mime_type,
        "data": base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_keeps_prompt_and_switches_modality() {
        let request = GenerationRequest::image("a menu card".to_string()).with_max_output_tokens(10);
        assert_eq!(request.prompt(), "a menu card");
        assert_eq!(request.modality(), Modality::Image);
        assert_eq!(request.max_output_tokens(), Some(10));
        assert_eq!(request.system(), None);
    }

    #[test]
    fn test_parse_structured_text_treats_blank_as_empty() {
        assert!(parse_structured_text("  \n").unwrap().is_none());
    }

    #[test]
    fn test_parse_structured_text_rejects_malformed_json() {
        let err = parse_structured_text("{\"name\": ").unwrap_err();
        assert!(matches!(err, crate::Error::AiProvider(_)));
    }

    #[test]
    fn test_image_value_encodes_base64() {
        let value = image_value("image/png", &[0x89, 0x50]);
        assert_eq!(value["mimeType"], "image/png");
        assert_eq!(value["data"], "iVA=");
    }
}
