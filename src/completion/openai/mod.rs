
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::CompletionModel;
use crate::chat::Message;
use crate::config::CompletionConfig;
use crate::upstream::{self, UpstreamError};

/// Client for any OpenAI-compatible `chat/completions` endpoint
/// (OpenRouter by default)
#[derive(Clone)]
pub struct OpenAiCompatClient {
    base_url: Url,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    /// Some gateways report failures in-band with a 200 status
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

impl OpenAiCompatClient {
    #[inline]
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key: api_key.into(),
            agent: upstream::build_agent(timeout),
        }
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a completion on the calling thread and return the text of
    /// the first choice
    #[inline]
    pub fn complete_blocking(&self, messages: &[Message]) -> Result<String, UpstreamError> {
        if messages.is_empty() {
            return Err(UpstreamError::InvalidInput(
                "cannot complete an empty conversation".to_string(),
            ));
        }

        debug!(
            "Requesting completion from {} with {} messages",
            self.model,
            messages.len()
        );

        let url = upstream::endpoint(&self.base_url, "chat/completions")?;
        let authorization = format!("Bearer {}", self.api_key);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response: ChatCompletionResponse = upstream::post_json(
            &self.agent,
            &url,
            &[("Authorization", authorization.as_str())],
            &request,
        )?;

        if let Some(error) = response.error {
            warn!("Completion API reported an in-band error: {}", error.message);
            let status = error
                .code
                .as_ref()
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(502);
            return Err(UpstreamError::Status {
                status,
                body: error.message,
            });
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                UpstreamError::Decode("completion response had no message content".to_string())
            })?;

        debug!("Received completion ({} chars)", content.len());
        Ok(content)
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompatClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, UpstreamError> {
        let client = self.clone();
        let messages = messages.to_vec();
        upstream::run_blocking(move || client.complete_blocking(&messages)).await
    }
}

impl fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}
