//! Prompt composition.
//!
//! Merges retrieved matches into the latest user message and frames the
//! conversation with the system prompt. Everything here is pure: the same
//! inputs always give the same message list.


use serde::Serialize;

use crate::chat::Message;
use crate::retrieval::RetrievedMatch;

/// Bundled professor-recommendation prompt
pub const SYSTEM_PROMPT: &str = include_str!("system_prompt.md");

/// Heading placed between the user's text and the serialized matches
pub const CONTEXT_HEADER: &str = "Context from vector DB:";

#[derive(Debug, Serialize)]
struct ContextEntry<'a> {
    id: &'a str,
    source: &'a str,
    author: &'a str,
    text: &'a str,
}

/// Serialize matches as a two-space indented JSON array. Scores are left
/// out; only their ranking (the array order) reaches the model.
#[inline]
pub fn serialize_context(matches: &[RetrievedMatch]) -> String {
    let entries: Vec<ContextEntry<'_>> = matches
        .iter()
        .map(|hit| ContextEntry {
            id: &hit.id,
            source: &hit.source,
            author: &hit.author,
            text: &hit.text,
        })
        .collect();

    // Serializing plain string fields cannot fail.
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

/// The latest user message with the retrieved context appended
#[inline]
pub fn augment(latest: &Message, matches: &[RetrievedMatch]) -> Message {
    let content = format!(
        "{}\n\n{}\n{}",
        latest.content,
        CONTEXT_HEADER,
        serialize_context(matches)
    );
    Message::new(latest.role, content)
}

/// Build the message list sent to the completion model:
/// `[system, ...prior, augmented latest]`
#[inline]
pub fn compose_messages(
    system_prompt: &str,
    prior: &[Message],
    latest: &Message,
    matches: &[RetrievedMatch],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(prior.iter().cloned());
    messages.push(augment(latest, matches));
    messages
}
