use super::client::OpenAiHttpClient;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ImageGenerationRequest,
    ImageGenerationResponse, JsonSchema, ResponseFormat,
};
use crate::ai::mime::detect_image_mime;
use crate::ai::retry::RetryPolicy;
use crate::ai::{image_value, parse_structured_text, GenerationClient, GenerationRequest, Modality};
use crate::shape::ExpectedShape;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const IMAGE_SIZE: &str = "1024x1024";

/// [`GenerationClient`] backed by OpenAI chat completions (strict JSON schema
/// output) and the images API.
pub struct OpenAiClient {
    http: OpenAiHttpClient,
    text_model: String,
    image_model: String,
}

impl OpenAiClient {
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
            http: OpenAiHttpClient::new_with_client(api_key, REQUEST_TIMEOUT, retry, client),
            text_model,
            image_model,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn chat_request(&self, request: &GenerationRequest, shape: &ExpectedShape) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system() {
            messages.push(ChatMessage::new("system", system));
        }
        messages.push(ChatMessage::new("user", request.prompt()));

        ChatCompletionRequest {
            model: self.text_model.clone(),
            messages,
            max_completion_tokens: request.max_output_tokens(),
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: shape.name().to_string(),
                    schema: shape.to_json_schema(),
                    strict: true,
                },
            }),
        }
    }

    async fn generate_text(
        &self,
        request: &GenerationRequest,
        shape: &ExpectedShape,
    ) -> Result<Option<Value>> {
        let body = self.chat_request(request, shape);
        let response: ChatCompletionResponse = self.http.post("/v1/chat/completions", &body).await?;

        let Some(choice) = response.choices.first() else {
            return Ok(None);
        };
        if let Some(refusal) = &choice.message.refusal {
            return Err(Error::AiProvider(format!("Model refused: {}", refusal)));
        }

        match &choice.message.content {
            Some(text) => parse_structured_text(text),
            None => Ok(None),
        }
    }

    async fn generate_image(&self, request: &GenerationRequest) -> Result<Option<Value>> {
        let body = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: request.prompt().to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
        };
        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &body).await?;

        let Some(image) = response.data.first() else {
            return Ok(None);
        };

        let bytes = if let Some(b64_json) = &image.b64_json {
            use base64::Engine as _;
            base64::engine::general_purpose::STANDARD
                .decode(b64_json)
                .map_err(|e| Error::AiProvider(format!("Failed to decode base64 image: {}", e)))?
        } else if let Some(url) = &image.url {
            self.http.download(url).await?
        } else {
            return Ok(None);
        };

        Ok(Some(image_value(detect_image_mime(&bytes), &bytes)))
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        shape: &ExpectedShape,
    ) -> Result<Option<Value>> {
        match request.modality() {
            Modality::Text => self.generate_text(request, shape).await,
            Modality::Image => self.generate_image(request).await,
        }
    }
}
