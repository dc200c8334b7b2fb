// Embeddings module
// Turns the latest user message into a query vector

pub mod gemini;

use async_trait::async_trait;

use crate::upstream::UpstreamError;

pub use gemini::GeminiClient;

/// Converts text into a fixed-length vector for similarity search.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError>;
}
