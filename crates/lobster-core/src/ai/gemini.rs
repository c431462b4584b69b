use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::AiError;
use super::types::{GenerateRequest, GenerateResponse, WireRequest};
use super::ContentGenerator;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model.trim_start_matches("models/")
        )
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, AiError> {
        let url = self.endpoint(&request.model);
        debug!(
            model = %request.model,
            contents = request.contents.len(),
            tools = request.config.tools.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&WireRequest::from_request(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let parsed = GenerateResponse::from_body(&body);
        debug!(
            text_len = parsed.text.len(),
            function_calls = parsed.function_calls.len(),
            "received generateContent response"
        );
        Ok(parsed)
    }
}
