//! Cohere chat API (v2) backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::EnrichmentConfig;
use crate::enrichment::error::{EnrichmentError, Result};
use crate::enrichment::provider::TextGenerator;
use crate::secrets::resolve_api_key;

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    /// Older response shape.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ChatResponse {
    fn into_text(self) -> String {
        let from_blocks: String = self
            .message
            .map(|m| m.content.into_iter().filter_map(|b| b.text).collect())
            .unwrap_or_default();

        if from_blocks.is_empty() {
            self.text.unwrap_or_default()
        } else {
            from_blocks
        }
    }
}

pub struct CohereGenerator {
    client: Client,
    config: EnrichmentConfig,
    api_key: OnceCell<SecretString>,
}

impl CohereGenerator {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnrichmentError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing Cohere backend"
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key: OnceCell::new(),
        })
    }

    /// Resolved on first use and reused afterwards. Failures are not cached,
    /// so a credential provided later is picked up.
    async fn api_key(&self) -> Result<&SecretString> {
        self.api_key
            .get_or_try_init(|| async {
                resolve_api_key(&self.config).map_err(|e| {
                    tracing::error!(error = %e, "Model credential could not be resolved");
                    EnrichmentError::MissingCredential(e.to_string())
                })
            })
            .await
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/chat", self.config.base_url.trim_end_matches('/'))
    }
}

fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    message.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

fn classify_status(status: StatusCode, body: &str) -> EnrichmentError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EnrichmentError::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => EnrichmentError::RateLimited(message),
        _ => EnrichmentError::Provider {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl TextGenerator for CohereGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key().await?;

        tracing::debug!(
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "Sending chat request"
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout(self.config.timeout_secs)
                } else {
                    EnrichmentError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, &body);
            tracing::warn!(status = status.as_u16(), error = %err, "Model provider returned an error");
            return Err(err);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Transport(format!("Failed to parse response: {}", e)))?;

        let text = body.into_text();
        if text.trim().is_empty() {
            return Err(EnrichmentError::EmptyResponse);
        }

        tracing::debug!(reply_chars = text.chars().count(), "Chat request complete");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
