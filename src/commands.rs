use anyhow::{Context, Result, bail};
use console::style;
use tracing::{debug, info};
use url::Url;

use crate::client::{
    ChatClient, DEFAULT_CLIENT_TIMEOUT, Transcript, TranscriptEvent, reduce, render_markdown,
    run_chat,
};
use crate::config::{Config, Credentials};
use crate::pipeline::RagPipeline;
use crate::server;

/// Load `.env` from the working directory if present
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Start the HTTP server
#[inline]
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    load_dotenv();

    let mut config = Config::load_default().context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.set_host(host)?;
    }
    if let Some(port) = port {
        config.server.set_port(port)?;
    }
    config.validate()?;

    let credentials = Credentials::from_env()?;

    info!(
        "Connecting to index '{}' in namespace '{}'",
        config.retrieval.index_name, config.retrieval.namespace
    );
    let pipeline_config = config.clone();
    let pipeline = tokio::task::spawn_blocking(move || {
        RagPipeline::from_config(&pipeline_config, &credentials)
    })
    .await
    .context("Pipeline setup task failed")??;

    eprintln!(
        "{} {}",
        style("✓ Serving chat API on").green(),
        style(format!("http://{}/api/chat", config.server.bind_address())).cyan()
    );

    server::serve(&config.server, pipeline).await
}

/// Interactive terminal chat
#[inline]
pub async fn chat(server: Option<Url>) -> Result<()> {
    let client = ChatClient::new(&resolve_server_url(server)?, DEFAULT_CLIENT_TIMEOUT)?;
    tokio::task::spawn_blocking(move || run_chat(&client))
        .await
        .context("Chat session task failed")?
}

/// Ask a single question and print the answer
#[inline]
pub async fn ask(question: String, server: Option<Url>) -> Result<()> {
    let transcript = reduce(
        &Transcript::default(),
        TranscriptEvent::UserSubmitted(question),
    );
    if !transcript.is_pending() {
        bail!("Question must not be empty");
    }

    let client = ChatClient::new(&resolve_server_url(server)?, DEFAULT_CLIENT_TIMEOUT)?;
    let messages = transcript.messages().to_vec();
    let reply = tokio::task::spawn_blocking(move || client.send(&messages))
        .await
        .context("Chat request task failed")?
        .context("Chat request failed")?;

    println!("{}", render_markdown(&reply));
    Ok(())
}

/// Explicit URL, else the configured server address
fn resolve_server_url(server: Option<Url>) -> Result<Url> {
    if let Some(url) = server {
        return Ok(url);
    }
    let config = Config::load_default().context("Failed to load configuration")?;
    Ok(config.server.client_url()?)
}
