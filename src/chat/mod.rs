//! Conversation types shared by the server, the pipeline and the client.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[inline]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("conversation is empty")]
    Empty,
    #[error("last message must come from the user, found {0}")]
    LastNotUser(Role),
    #[error("last message has no content")]
    BlankLatest,
}

/// A conversation that ends in a non-blank user message.
///
/// Oldest message first. Construction is the only validation point, so a
/// `ChatHistory` can always be split into prior turns and the latest question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistory {
    prior: Vec<Message>,
    latest: Message,
}

impl ChatHistory {
    #[inline]
    pub fn new(mut messages: Vec<Message>) -> Result<Self, HistoryError> {
        let latest = messages.pop().ok_or(HistoryError::Empty)?;
        if latest.role != Role::User {
            return Err(HistoryError::LastNotUser(latest.role));
        }
        if latest.content.trim().is_empty() {
            return Err(HistoryError::BlankLatest);
        }
        Ok(Self {
            prior: messages,
            latest,
        })
    }

    #[inline]
    pub fn latest(&self) -> &Message {
        &self.latest
    }

    #[inline]
    pub fn prior(&self) -> &[Message] {
        &self.prior
    }

    /// Everything before the latest message, and the latest message
    #[inline]
    pub fn split_latest(&self) -> (&[Message], &Message) {
        (&self.prior, &self.latest)
    }

    /// Number of messages including the latest
    #[inline]
    pub fn turn_count(&self) -> usize {
        self.prior.len() + 1
    }
}

impl TryFrom<Vec<Message>> for ChatHistory {
    type Error = HistoryError;

    #[inline]
    fn try_from(messages: Vec<Message>) -> Result<Self, Self::Error> {
        Self::new(messages)
    }
}
