
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::upstream::{self, UpstreamError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Generative Language `embedContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    base_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>, timeout: Duration) -> Self {
        let model = config
            .model
            .strip_prefix("models/")
            .unwrap_or(&config.model)
            .to_string();

        Self {
            base_url: config.base_url.clone(),
            model,
            api_key: api_key.into(),
            agent: upstream::build_agent(timeout),
        }
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed one text on the calling thread
    #[inline]
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        if text.trim().is_empty() {
            return Err(UpstreamError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        debug!("Generating embedding for text (length: {})", text.len());

        let url = upstream::endpoint(
            &self.base_url,
            &format!("v1beta/models/{}:embedContent", self.model),
        )?;

        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
        };

        let response: EmbedContentResponse = upstream::post_json(
            &self.agent,
            &url,
            &[(API_KEY_HEADER, self.api_key.as_str())],
            &request,
        )?;

        let values = response.embedding.values;
        if values.is_empty() {
            return Err(UpstreamError::Decode(
                "embedding response contained no values".to_string(),
            ));
        }

        debug!("Generated embedding with {} dimensions", values.len());
        Ok(values)
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let client = self.clone();
        let text = text.to_string();
        upstream::run_blocking(move || client.embed_blocking(&text)).await
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
