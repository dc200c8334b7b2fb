//! Terminal chat client for a running server.

pub mod render;
pub mod repl;
pub mod transcript;
#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::chat::Message;
use crate::server::{ChatResponse, ErrorBody};
use crate::upstream::{self, UpstreamError};

pub use render::render_markdown;
pub use repl::run_chat;
pub use transcript::{FALLBACK_REPLY, GREETING, Transcript, TranscriptEvent, reduce};

/// The server makes three sequential upstream calls per request
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach server: {0}")]
    Transport(String),

    #[error("server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response from server: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct ChatClient {
    agent: ureq::Agent,
    chat_url: Url,
}

impl ChatClient {
    #[inline]
    pub fn new(server: &Url, timeout: Duration) -> Result<Self, ClientError> {
        let chat_url =
            upstream::endpoint(server, "api/chat").map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            agent: upstream::build_agent(timeout),
            chat_url,
        })
    }

    #[inline]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// Send the whole conversation and return the assistant's reply
    #[inline]
    pub fn send(&self, messages: &[Message]) -> Result<String, ClientError> {
        match upstream::post_json::<_, ChatResponse>(&self.agent, &self.chat_url, &[], messages) {
            Ok(reply) => Ok(reply.response),
            Err(UpstreamError::Status { status, body }) => Err(ClientError::Server {
                status,
                message: server_message(&body),
            }),
            Err(UpstreamError::Decode(e)) => Err(ClientError::Decode(e)),
            Err(e) => Err(ClientError::Transport(e.to_string())),
        }
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("chat_url", &self.chat_url.as_str())
            .finish_non_exhaustive()
    }
}

fn server_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(|_| body.trim().to_string(), |b| b.error)
}
