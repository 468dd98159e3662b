use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::ai::retry::RetryPolicy;
use crate::ai::{parse_structured_text, GenerationClient, GenerationRequest, Modality};
use crate::shape::ExpectedShape;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// [`GenerationClient`] backed by Gemini: structured JSON through
/// `responseSchema` for text steps, inline image data for image steps.
pub struct GeminiClient {
    text: GeminiHttpClient,
    image: GeminiHttpClient,
}

impl GeminiClient {
    pub fn new(api_key: String, text_model: String, image_model: String, retry: RetryPolicy) -> Self {
        Self::new_with_client(api_key, text_model, image_model, retry, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        text_model: String,
        image_model: String,
        retry: RetryPolicy,
        client: reqwest::Client,
    ) -> Self {
        Self {
            text: GeminiHttpClient::new_with_client(
                api_key.clone(),
                text_model,
                TEXT_TIMEOUT,
                retry,
                client.clone(),
            ),
            image: GeminiHttpClient::new_with_client(api_key, image_model, IMAGE_TIMEOUT, retry, client),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.text = self.text.with_base_url(base_url.clone());
        self.image = self.image.with_base_url(base_url);
        self
    }

    fn text_request(request: &GenerationRequest, shape: &ExpectedShape) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: request.system().map(Content::system),
            contents: vec![Content::user(request.prompt())],
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(shape.to_gemini_schema()),
                max_output_tokens: request.max_output_tokens(),
                ..GenerationConfig::default()
            },
        }
    }

    fn image_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user(request.prompt())],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                ..GenerationConfig::default()
            },
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        shape: &ExpectedShape,
    ) -> Result<Option<Value>> {
        match request.modality() {
            Modality::Text => {
                let body = Self::text_request(request, shape);
                let response: GenerateContentResponse = self.text.generate_content(&body).await?;
                if let Some(reason) = response.finish_reason() {
                    tracing::debug!("Gemini {} finished with {}", self.text.model(), reason);
                }
                parse_structured_text(&response.text())
            }
            Modality::Image => {
                let body = Self::image_request(request);
                let response: GenerateContentResponse = self.image.generate_content(&body).await?;
                Ok(response.inline_data().map(|inline| {
                    tracing::debug!(
                        "Gemini returned image with mime_type: {}",
                        inline.mime_type
                    );
                    json!({ "mimeType": inline.mime_type, "data": inline.data })
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

    fn make_client(server: &MockServer, retry: RetryPolicy) -> GeminiClient {
        GeminiClient::new(
            "test-key".to_string(),
            "models/gemini-2.0-flash".to_string(),
            "gemini-2.0-flash-preview-image-generation".to_string(),
            retry,
        )
        .with_base_url(server.uri())
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy::new(0)
    }

    fn text_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    fn shape() -> ExpectedShape {
        ExpectedShape::new("note").string("text")
    }

    #[tokio::test]
    async fn test_text_request_sends_schema_and_parses_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("\"responseMimeType\":\"application/json\""))
            .and(body_string_contains("\"responseSchema\""))
            .and(body_string_contains("\"system_instruction\""))
            .respond_with(text_reply("{\"text\": \"hello\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let request = GenerationRequest::text("say hello".to_string()).with_system("be brief");
        let value = make_client(&server, no_retry())
            .generate(&request, &shape())
            .await
            .unwrap();

        assert_eq!(value, Some(json!({ "text": "hello" })));
    }

    #[tokio::test]
    async fn test_blank_text_is_no_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let value = make_client(&server, no_retry())
            .generate(&GenerationRequest::text("x".to_string()), &shape())
            .await
            .unwrap();

        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_malformed_json_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(text_reply("{\"text\": "))
            .mount(&server)
            .await;

        let err = make_client(&server, no_retry())
            .generate(&GenerationRequest::text("x".to_string()), &shape())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_provider_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let err = make_client(&server, RetryPolicy::new(3).with_interval(Duration::from_millis(1)))
            .generate(&GenerationRequest::text("x".to_string()), &shape())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ProviderStatus { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_unavailable_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(text_reply("{\"text\": \"second try\"}"))
            .mount(&server)
            .await;

        let value = make_client(&server, RetryPolicy::new(2).with_interval(Duration::from_millis(1)))
            .generate(&GenerationRequest::text("x".to_string()), &shape())
            .await
            .unwrap();

        assert_eq!(value, Some(json!({ "text": "second try" })));
    }

    #[tokio::test]
    async fn test_image_request_returns_inline_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(
                "/v1beta/models/gemini-2.0-flash-preview-image-generation:generateContent",
            ))
            .and(body_string_contains("\"responseModalities\":[\"TEXT\",\"IMAGE\"]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "Here is your menu card" },
                            { "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } }
                        ]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = make_client(&server, no_retry())
            .generate(
                &GenerationRequest::image("a menu card".to_string()),
                &ExpectedShape::new("menuCard"),
            )
            .await
            .unwrap();

        assert_eq!(
            value,
            Some(json!({ "mimeType": "image/png", "data": "iVBORw==" }))
        );
    }

    #[tokio::test]
    async fn test_image_reply_without_inline_data_is_no_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(text_reply("I cannot draw that"))
            .mount(&server)
            .await;

        let value = make_client(&server, no_retry())
            .generate(
                &GenerationRequest::image("a menu card".to_string()),
                &ExpectedShape::new("menuCard"),
            )
            .await
            .unwrap();

        assert_eq!(value, None);
    }
}
