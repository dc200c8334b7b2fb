// Completion module
// Sends the composed conversation to a hosted language model

pub mod openai;

use async_trait::async_trait;

use crate::chat::Message;
use crate::upstream::UpstreamError;

pub use openai::OpenAiCompatClient;

/// Generates the assistant reply for a full message list.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, UpstreamError>;
}
