/// OpenAI-compatible chat completions client
///
/// Serves as both the reasoning capability (plain text prompt) and the vision
/// capability (prompt plus an `image_url` content part). Any server that speaks the
/// `/chat/completions` protocol works; the base URL and models come from config.
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::services::providers::{
    CapabilityError, CapabilityResult, ReasoningCapability, VisionCapability,
};

const VISION_PROMPT: &str = "List every book whose spine or cover is readable in this photo of a bookshelf. \
Reply with only a JSON array of objects with keys \"title_candidate\" (string), \
\"author_candidate\" (string, omit if unreadable) and \"confidence\" (number between 0 and 1). \
Reply with [] if no books are visible.";

#[derive(Clone)]
pub struct ChatCompletionsClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    vision_model: String,
}

impl ChatCompletionsClient {
    pub fn new(
        http_client: HttpClient,
        base_url: String,
        api_key: String,
        model: String,
        vision_model: String,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
            model,
            vision_model,
        }
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    async fn complete(&self, body: Value) -> CapabilityResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Status { status, body });
        }

        let json: Value = response.json().await?;
        Self::extract_content(&json)
    }

    /// Pulls `choices[0].message.content` out of a completion
    fn extract_content(json: &Value) -> CapabilityResult<String> {
        json["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(str::to_string)
            .ok_or_else(|| CapabilityError::Malformed("completion has no message content".to_string()))
    }
}

#[async_trait::async_trait]
impl ReasoningCapability for ChatCompletionsClient {
    async fn reason(&self, prompt: &str) -> CapabilityResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
        });

        let content = self.complete(body).await?;
        tracing::debug!(chars = content.len(), model = %self.model, "Reasoning reply received");
        Ok(content)
    }
}

#[async_trait::async_trait]
impl VisionCapability for ChatCompletionsClient {
    async fn detect_books(&self, image_url: &str) -> CapabilityResult<String> {
        let body = json!({
            "model": self.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": VISION_PROMPT },
                    { "type": "image_url", "image_url": { "url": image_url } }
                ]
            }],
            "temperature": 0.0,
        });

        let content = self.complete(body).await?;
        tracing::debug!(chars = content.len(), model = %self.vision_model, "Vision reply received");
        Ok(content)
    }
}
