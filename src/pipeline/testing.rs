//! In-memory collaborators for exercising the pipeline without a network.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::RagPipeline;
use crate::chat::Message;
use crate::completion::CompletionModel;
use crate::embeddings::Embedder;
use crate::retrieval::{RetrievedMatch, VectorRetriever};
use crate::upstream::UpstreamError;

#[derive(Default)]
pub struct FakeEmbedder {
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        self.calls.lock().expect("lock poisoned").push(text.to_string());
        if self.fail {
            return Err(UpstreamError::Status {
                status: 401,
                body: "bad key".to_string(),
            });
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
pub struct FakeRetriever {
    pub fail: bool,
    pub matches: Vec<RetrievedMatch>,
    pub calls: Mutex<Vec<(Vec<f32>, usize)>>,
}

#[async_trait]
impl VectorRetriever for FakeRetriever {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, UpstreamError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((vector.to_vec(), top_k));
        if self.fail {
            return Err(UpstreamError::Transport("connection refused".to_string()));
        }
        Ok(self.matches.clone())
    }
}

#[derive(Default)]
pub struct FakeCompleter {
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<Message>>>,
}

#[async_trait]
impl CompletionModel for FakeCompleter {
    async fn complete(&self, messages: &[Message]) -> Result<String, UpstreamError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(messages.to_vec());
        if self.fail {
            return Err(UpstreamError::Status {
                status: 429,
                body: "rate limited".to_string(),
            });
        }
        Ok("Professor Ada is a great pick.".to_string())
    }
}

pub struct Fakes {
    pub embedder: Arc<FakeEmbedder>,
    pub retriever: Arc<FakeRetriever>,
    pub completer: Arc<FakeCompleter>,
}

impl Fakes {
    pub fn healthy() -> Self {
        Self {
            embedder: Arc::new(FakeEmbedder::default()),
            retriever: Arc::new(FakeRetriever::default()),
            completer: Arc::new(FakeCompleter::default()),
        }
    }

    pub fn with_matches(matches: Vec<RetrievedMatch>) -> Self {
        Self {
            retriever: Arc::new(FakeRetriever {
                matches,
                ..FakeRetriever::default()
            }),
            ..Self::healthy()
        }
    }

    /// Fakes where only the named collaborator fails
    pub fn failing(component: &str) -> Self {
        Self {
            embedder: Arc::new(FakeEmbedder {
                fail: component == "embedding",
                ..FakeEmbedder::default()
            }),
            retriever: Arc::new(FakeRetriever {
                fail: component == "retrieval",
                ..FakeRetriever::default()
            }),
            completer: Arc::new(FakeCompleter {
                fail: component == "completion",
                ..FakeCompleter::default()
            }),
        }
    }

    pub fn pipeline(&self) -> RagPipeline {
        RagPipeline::new(
            Arc::clone(&self.embedder) as Arc<dyn Embedder>,
            Arc::clone(&self.retriever) as Arc<dyn VectorRetriever>,
            Arc::clone(&self.completer) as Arc<dyn CompletionModel>,
            "You recommend professors.",
        )
    }

    pub fn embed_calls(&self) -> Vec<String> {
        self.embedder.calls.lock().expect("lock poisoned").clone()
    }

    pub fn query_calls(&self) -> Vec<(Vec<f32>, usize)> {
        self.retriever.calls.lock().expect("lock poisoned").clone()
    }

    pub fn completion_calls(&self) -> Vec<Vec<Message>> {
        self.completer.calls.lock().expect("lock poisoned").clone()
    }
}
