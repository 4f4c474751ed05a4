//! Google Gemini client implementation

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use async_trait::async_trait;
use pharmos_protocol::{Message, ModelResponse, Role, StopReason, TokenUsage};

use crate::{
    config::DEFAULT_GEMINI_BASE_URL, traits::ModelResult, ModelClient, ProviderConfig,
    ProviderError,
};

const DEFAULT_MAX_TOKENS: usize = 8192;

/// Google Gemini API client
pub struct GeminiClient {
    client: Client,
    config: ProviderConfig,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::Configuration(
                "API key required for Gemini".into(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(120));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, config })
    }

    fn build_request(&self, messages: &[Message]) -> GeminiRequest {
        let (system_instruction, contents) = Self::convert_messages(messages);

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: self.config.temperature,
            }),
        }
    }

    fn convert_messages(messages: &[Message]) -> (Option<GeminiSystemInstruction>, Vec<GeminiContent>) {
        let mut system_instruction = None;
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => {
                    system_instruction = Some(GeminiSystemInstruction {
                        parts: vec![GeminiPart {
                            text: msg.content.clone(),
                        }],
                    });
                }
                Role::User => contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
                Role::Assistant => contents.push(GeminiContent {
                    role: "model".to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        (system_instruction, contents)
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }

    fn convert_response(&self, response: GeminiResponse) -> ModelResult<ModelResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let content = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let stop_reason = candidate.finish_reason.map(|r| match r.as_str() {
            "STOP" => StopReason::EndTurn,
            "MAX_TOKENS" => StopReason::MaxTokens,
            "SAFETY" | "RECITATION" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        });

        Ok(ModelResponse {
            id: format!("gemini_{}", uuid::Uuid::new_v4()),
            model: self.config.model.clone(),
            content,
            stop_reason,
            usage: response
                .usage_metadata
                .map(|u| TokenUsage {
                    input_tokens: u.prompt_token_count as u64,
                    output_tokens: u.candidates_token_count as u64,
                })
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn chat(&self, messages: &[Message]) -> ModelResult<ModelResponse> {
        let request = self.build_request(messages);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url(),
            self.config.model,
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();

            if status.as_u16() == 429 {
                let retry_after_ms = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(|secs| secs * 1000)
                    .unwrap_or(60000);
                return Err(ProviderError::RateLimited { retry_after_ms });
            }

            if status.as_u16() == 401 || status.as_u16() == 403 {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::AuthenticationFailed(body));
            }

            if status.as_u16() == 404 {
                return Err(ProviderError::ModelNotFound {
                    model: self.config.model.clone(),
                });
            }

            if status.is_server_error() {
                return Err(ProviderError::Unavailable {
                    provider: "gemini".to_string(),
                });
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidResponse(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let api_response: GeminiResponse = response.json().await?;
        self.convert_response(api_response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn provider(&self) -> &str {
        "gemini"
    }
}

// API request/response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContentResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: usize,
    candidates_token_count: usize,
}
