
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, ConfigError};
use super::credentials::{GEMINI_API_KEY_ENV, OPENROUTER_API_KEY_ENV, PINECONE_API_KEY_ENV};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 RAG Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Server").bold().yellow());
    configure_server(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Embedding, retrieval and completion").bold().yellow());
    eprintln!("API keys are read from the environment and are not stored here.");
    eprintln!();
    configure_upstreams(&mut config)?;

    eprintln!();
    report_credentials();

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server:").bold().yellow());
    eprintln!("  Bind: {}", style(config.server.bind_address()).cyan());
    if !config.server.allowed_origins.is_empty() {
        eprintln!(
            "  Allowed origins: {}",
            style(config.server.allowed_origins.join(", ")).cyan()
        );
    }

    eprintln!();
    eprintln!("{}", style("Embedding:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.embedding.base_url).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!("  Index: {}", style(&config.retrieval.index_name).cyan());
    match &config.retrieval.index_host {
        Some(host) => eprintln!("  Index host: {}", style(host).cyan()),
        None => eprintln!(
            "  Index host: {} via {}",
            style("resolved at startup").dim(),
            style(&config.retrieval.controller_url).cyan()
        ),
    }
    eprintln!("  Namespace: {}", style(&config.retrieval.namespace).cyan());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Completion:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.completion.base_url).cyan());
    eprintln!("  Model: {}", style(&config.completion.model).cyan());

    eprintln!();
    eprintln!(
        "Upstream timeout: {}s",
        style(config.upstream.timeout_seconds).cyan()
    );
    if let Some(path) = &config.prompt.system_prompt_path {
        eprintln!("System prompt: {}", style(path.display()).cyan());
    }

    eprintln!();
    report_credentials();

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = Config::config_dir().context("Failed to resolve config directory")?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_server(config: &mut Config) -> Result<()> {
    let host: String = Input::new()
        .with_prompt("Listen host")
        .default(config.server.host.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Host cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Listen port")
        .default(config.server.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.server.set_host(host)?;
    config.server.set_port(port)?;
    Ok(())
}

fn configure_upstreams(config: &mut Config) -> Result<()> {
    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(config.embedding.model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let index_name: String = Input::new()
        .with_prompt("Vector index name")
        .default(config.retrieval.index_name.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let namespace: String = Input::new()
        .with_prompt("Vector index namespace")
        .default(config.retrieval.namespace.clone())
        .allow_empty(true)
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Matches retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), ConfigError> {
            let mut probe = config.retrieval.clone();
            probe.set_top_k(*input)
        })
        .interact_text()?;

    let completion_model: String = Input::new()
        .with_prompt("Completion model")
        .default(config.completion.model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    config.embedding.set_model(embedding_model)?;
    config.retrieval.set_index_name(index_name)?;
    config.retrieval.namespace = namespace;
    config.retrieval.set_top_k(top_k)?;
    config.completion.set_model(completion_model)?;
    Ok(())
}

fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}

/// Names of the API key variables that are currently unset
fn missing_credentials() -> Vec<&'static str> {
    [GEMINI_API_KEY_ENV, PINECONE_API_KEY_ENV, OPENROUTER_API_KEY_ENV]
        .into_iter()
        .filter(|name| std::env::var(name).map_or(true, |value| value.trim().is_empty()))
        .collect()
}

fn report_credentials() {
    let missing = missing_credentials();
    if missing.is_empty() {
        eprintln!("{}", style("✓ All API keys found in environment").green());
    } else {
        for name in missing {
            eprintln!(
                "{} {} is not set",
                style("⚠ Warning:").yellow(),
                style(name).bold()
            );
        }
    }
}
