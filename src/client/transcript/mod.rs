//! Chat transcript state.
//!
//! A [`Transcript`] is never mutated in place. [`reduce`] takes the current
//! value and an event and returns the next one, which keeps the terminal loop
//! a thin shell around a pure state machine.


use crate::chat::{Message, Role};

pub const GREETING: &str =
    "Hello, I am Rate My Professor Support Assistant. How can I help you today?";

/// Shown in place of a reply when the request fails for any reason
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    pending: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
            pending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    UserSubmitted(String),
    ResponseReceived(String),
    RequestFailed,
}

impl Transcript {
    /// Every message shown so far, greeting included. This is also the
    /// request payload.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a request is in flight
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last message if it came from the assistant
    #[inline]
    pub fn last_reply(&self) -> Option<&str> {
        self.last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// Compute the transcript that follows `event`.
///
/// Blank input and input sent while a request is pending leave the
/// transcript unchanged, as do replies that arrive with nothing pending.
#[inline]
pub fn reduce(state: &Transcript, event: TranscriptEvent) -> Transcript {
    match event {
        TranscriptEvent::UserSubmitted(text) => {
            if state.pending || text.trim().is_empty() {
                return state.clone();
            }
            append(state, Message::user(text), true)
        }
        TranscriptEvent::ResponseReceived(reply) if state.pending => {
            append(state, Message::assistant(reply), false)
        }
        TranscriptEvent::RequestFailed if state.pending => {
            append(state, Message::assistant(FALLBACK_REPLY), false)
        }
        TranscriptEvent::ResponseReceived(_) | TranscriptEvent::RequestFailed => state.clone(),
    }
}

fn append(state: &Transcript, message: Message, pending: bool) -> Transcript {
    let mut messages = Vec::with_capacity(state.messages.len() + 1);
    messages.extend_from_slice(&state.messages);
    messages.push(message);
    Transcript { messages, pending }
}
