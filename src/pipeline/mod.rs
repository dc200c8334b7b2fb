//! Retrieval-augmented generation pipeline.
//!
//! One request runs embedding, retrieval, prompt composition and completion
//! strictly in sequence. A failure at any step ends the request; nothing is
//! retried and no partial answer is produced.

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use anyhow::Context;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::RagError;
use crate::chat::{ChatHistory, HistoryError};
use crate::completion::{CompletionModel, OpenAiCompatClient};
use crate::config::settings::DEFAULT_TOP_K;
use crate::config::{Config, Credentials};
use crate::embeddings::{Embedder, GeminiClient};
use crate::prompt::compose_messages;
use crate::retrieval::{PineconeClient, VectorRetriever};
use crate::upstream::UpstreamError;

/// Where a request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Augmenting,
    Completing,
    Responded,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Augmenting => "augmenting",
            Self::Completing => "completing",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Why a request failed. The three upstream variants are the external
/// service failures; callers outside the crate see them as one generic error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] HistoryError),

    #[error("embedding failed: {0}")]
    Embedding(#[source] UpstreamError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] UpstreamError),

    #[error("completion failed: {0}")]
    Completion(#[source] UpstreamError),
}

impl PipelineError {
    /// The stage the request was in when it failed
    #[inline]
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::MalformedRequest(_) => PipelineStage::Received,
            Self::Embedding(_) | Self::Retrieval(_) => PipelineStage::Augmenting,
            Self::Completion(_) => PipelineStage::Completing,
        }
    }

    /// The failed upstream call, if any
    #[inline]
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            Self::MalformedRequest(_) => None,
            Self::Embedding(e) | Self::Retrieval(e) | Self::Completion(e) => Some(e),
        }
    }

    /// True when an upstream service caused the failure
    #[inline]
    pub fn is_external(&self) -> bool {
        !matches!(self, Self::MalformedRequest(_))
    }
}

pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn VectorRetriever>,
    completer: Arc<dyn CompletionModel>,
    system_prompt: String,
    top_k: usize,
}

impl RagPipeline {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn VectorRetriever>,
        completer: Arc<dyn CompletionModel>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            retriever,
            completer,
            system_prompt: system_prompt.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Wire the pipeline to the configured upstream services.
    ///
    /// Blocks while the vector index host is resolved, so call it before
    /// the server starts accepting requests.
    #[inline]
    pub fn from_config(config: &Config, credentials: &Credentials) -> crate::Result<Self> {
        config.validate()?;
        let timeout = config.upstream.timeout();

        let embedder = GeminiClient::new(&config.embedding, &credentials.gemini_api_key, timeout);
        let retriever = PineconeClient::connect(
            &config.retrieval,
            &credentials.pinecone_api_key,
            timeout,
        )
        .map_err(|e| {
            RagError::Retrieval(format!(
                "failed to open index '{}': {}",
                config.retrieval.index_name, e
            ))
        })?;
        let completer =
            OpenAiCompatClient::new(&config.completion, &credentials.openrouter_api_key, timeout);
        let system_prompt = config
            .prompt
            .load_system_prompt(config.get_base_dir())
            .context("Failed to load system prompt")?;

        info!(
            "Pipeline ready: embedding model {}, index host {}, completion model {}, top_k {}",
            embedder.model(),
            retriever.index_host(),
            completer.model(),
            config.retrieval.top_k
        );

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(retriever),
            Arc::new(completer),
            system_prompt,
        )
        .with_top_k(config.retrieval.top_k))
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer the latest user message in `history`
    #[inline]
    pub async fn respond(&self, history: &ChatHistory) -> Result<String, PipelineError> {
        let (prior, latest) = history.split_latest();
        debug!(
            stage = %PipelineStage::Received,
            turns = history.turn_count(),
            "Handling chat request"
        );

        debug!(stage = %PipelineStage::Augmenting, "Embedding latest message");
        let vector = self
            .embedder
            .embed(&latest.content)
            .await
            .map_err(PipelineError::Embedding)?;

        let matches = self
            .retriever
            .query(&vector, self.top_k)
            .await
            .map_err(PipelineError::Retrieval)?;
        debug!(
            stage = %PipelineStage::Augmenting,
            matches = matches.len(),
            "Retrieved context"
        );

        let messages = compose_messages(&self.system_prompt, prior, latest, &matches);

        debug!(
            stage = %PipelineStage::Completing,
            messages = messages.len(),
            "Requesting completion"
        );
        let response = self
            .completer
            .complete(&messages)
            .await
            .map_err(PipelineError::Completion)?;

        debug!(stage = %PipelineStage::Responded, chars = response.len(), "Completed");
        Ok(response)
    }
}

impl fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagPipeline")
            .field("top_k", &self.top_k)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish_non_exhaustive()
    }
}
