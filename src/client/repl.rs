use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::warn;

use super::ChatClient;
use super::render::render_markdown;
use super::transcript::{Transcript, TranscriptEvent, reduce};
use crate::chat::Message;

const EXIT_COMMANDS: [&str; 3] = ["/exit", "/quit", "/q"];

/// Interactive chat loop. Returns when the user types an exit command.
#[inline]
pub fn run_chat(client: &ChatClient) -> Result<()> {
    let term = Term::stdout();
    let mut transcript = Transcript::default();

    eprintln!(
        "{} {}",
        style("Connected to").dim(),
        style(client.chat_url()).cyan()
    );
    eprintln!("{}", style("Type /exit to leave.").dim());
    eprintln!();
    print_reply(&term, &transcript)?;

    loop {
        let input: String = Input::new()
            .with_prompt(style("You").bold().green().to_string())
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;

        if EXIT_COMMANDS.contains(&input.trim()) {
            break;
        }

        let waiting = reduce(&transcript, TranscriptEvent::UserSubmitted(input));
        if !waiting.is_pending() {
            continue;
        }
        transcript = waiting;

        let event = exchange(client, transcript.messages());
        transcript = reduce(&transcript, event);
        print_reply(&term, &transcript)?;
    }

    Ok(())
}

/// Send `messages` with a spinner and turn the outcome into a transcript event
#[inline]
pub fn exchange(client: &ChatClient, messages: &[Message]) -> TranscriptEvent {
    let spinner = thinking_spinner();
    let result = client.send(messages);
    spinner.finish_and_clear();

    match result {
        Ok(reply) => TranscriptEvent::ResponseReceived(reply),
        Err(e) => {
            warn!("Chat request failed: {}", e);
            TranscriptEvent::RequestFailed
        }
    }
}

fn thinking_spinner() -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(template);
    }
    bar.set_message("Thinking...");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn print_reply(term: &Term, transcript: &Transcript) -> Result<()> {
    if let Some(reply) = transcript.last_reply() {
        term.write_line(&format!("{}", style("Assistant").bold().magenta()))?;
        term.write_line(&render_markdown(reply))?;
        term.write_line("")?;
    }
    Ok(())
}
