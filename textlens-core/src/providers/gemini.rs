//! Google Gemini API provider implementation.
//!
//! Implements the `LlmProvider` trait for the native Google Gemini
//! `generateContent` endpoint with structured (JSON schema) output.
//!
//! Differences from OpenAI-style APIs that matter here:
//! - Auth via `?key=API_KEY` query parameter (not header-based)
//! - Output shape is requested via `generationConfig.responseSchema`
//! - The answer text is spread over `candidates[0].content.parts[].text`

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    connect_timeout_secs: u64,
    request_timeout_secs: Option<u64>,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an already resolved API key.
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder =
            Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| LlmError::Connection {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    /// Build the JSON request body for the Gemini API.
    fn build_request_body(request: &CompletionRequest) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}],
            }],
            "generationConfig": {
                "temperature": request.temperature,
            },
        });

        if let Some(max_tokens) = request.max_tokens {
            body["generationConfig"]["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if let Some(mime) = &request.response_mime_type {
            body["generationConfig"]["responseMimeType"] = serde_json::json!(mime);
        }
        if let Some(schema) = &request.response_schema {
            body["generationConfig"]["responseSchema"] = schema.clone();
        }

        body
    }

    /// Parse a Gemini API response JSON into a `CompletionResponse`.
    ///
    /// A response without candidates or parts yields empty text. The finish
    /// reason falls back to `promptFeedback.blockReason` when the prompt
    /// itself was blocked.
    fn parse_response(body: &Value) -> CompletionResponse {
        let candidate = body["candidates"].as_array().and_then(|c| c.first());

        let finish_reason = candidate
            .and_then(|c| c["finishReason"].as_str())
            .or_else(|| body["promptFeedback"]["blockReason"].as_str())
            .map(|s| s.to_string());

        let text: String = candidate
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        if text.is_empty() {
            debug!(
                finish_reason = finish_reason.as_deref().unwrap_or("none"),
                "Gemini returned no answer text"
            );
        }

        let usage_metadata = &body["usageMetadata"];
        let usage = TokenUsage {
            input_tokens: usage_metadata["promptTokenCount"].as_u64().unwrap_or(0) as usize,
            output_tokens: usage_metadata["candidatesTokenCount"].as_u64().unwrap_or(0) as usize,
        };

        let model = body["modelVersion"]
            .as_str()
            .unwrap_or("gemini")
            .to_string();

        CompletionResponse {
            text,
            usage,
            model,
            finish_reason,
        }
    }

    /// Map an HTTP status code to the appropriate `LlmError`.
    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::AuthFailed {
                provider: "Gemini".to_string(),
            },
            429 => LlmError::RateLimited {
                retry_after_secs: 30,
            },
            _ => LlmError::ApiRequest {
                message: format!("HTTP {} from Gemini API: {}", status, body_text),
            },
        }
    }

    /// Build the endpoint URL for a Gemini API call.
    fn endpoint_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, method, self.api_key
        )
    }

    /// The timeout that fired: the connect limit while connecting, otherwise
    /// the whole-request limit.
    fn timeout_error(&self, during_connect: bool) -> LlmError {
        let timeout_secs = if during_connect {
            self.connect_timeout_secs
        } else {
            self.request_timeout_secs.unwrap_or(self.connect_timeout_secs)
        };
        LlmError::Timeout { timeout_secs }
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            self.timeout_error(e.is_connect())
        } else if e.is_connect() {
            LlmError::Connection {
                message: format!("Could not reach Gemini API: {}", e.without_url()),
            }
        } else {
            LlmError::ApiRequest {
                message: format!("Request to Gemini API failed: {}", e.without_url()),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    /// Perform a full (non-streaming) completion via the Gemini API.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = Self::build_request_body(&request);
        let url = self.endpoint_url(model, "generateContent");

        debug!(
            model,
            prompt_chars = request.prompt.len(),
            structured = request.response_schema.is_some(),
            "Sending Gemini completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| LlmError::ResponseParse {
            message: format!("Failed to read response body: {}", e.without_url()),
        })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        Ok(Self::parse_response(&response_json))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
