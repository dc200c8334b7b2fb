
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::prompt::SYSTEM_PROMPT;

/// Overrides the directory `config.toml` is read from
pub const CONFIG_DIR_ENV: &str = "RAG_CHAT_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "rag-chat";

pub const DEFAULT_TOP_K: usize = 3;
const MAX_TOP_K: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API. Empty disables CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: Url,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: parse_default_url("https://generativelanguage.googleapis.com"),
            model: "text-embedding-004".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Control plane used to look up the index host when `index_host` is unset
    pub controller_url: Url,
    pub index_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_host: Option<Url>,
    pub namespace: String,
    pub top_k: usize,
    pub metadata: MetadataKeys,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            controller_url: parse_default_url("https://api.pinecone.io"),
            index_name: "mainrag1".to_string(),
            index_host: None,
            namespace: "ns1".to_string(),
            top_k: DEFAULT_TOP_K,
            metadata: MetadataKeys::default(),
        }
    }
}

/// Metadata keys read from each match. PDF loaders nest document info
/// under dotted keys, hence the author default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetadataKeys {
    pub source: String,
    pub author: String,
    pub text: String,
}

impl Default for MetadataKeys {
    fn default() -> Self {
        Self {
            source: "source".to_string(),
            author: "pdf.info.Author".to_string(),
            text: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: Url,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: parse_default_url("https://openrouter.ai/api/v1"),
            model: "meta-llama/llama-3.1-8b-instruct:free".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Replaces the bundled system prompt when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid host: '{0}' (cannot be empty)")]
    InvalidHost(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid allowed origin: {0}")]
    InvalidOrigin(String),
    #[error("Invalid URL scheme for {0} (must be 'http' or 'https')")]
    InvalidUrlScheme(String),
    #[error("Invalid model name: '{0}' (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid index name: '{0}' (cannot be empty)")]
    InvalidIndexName(String),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid metadata key for {0} (cannot be empty)")]
    InvalidMetadataKey(&'static str),
    #[error("Invalid max_tokens: {0} (must be greater than 0)")]
    InvalidMaxTokens(u32),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid upstream timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidTimeout(u64),
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[expect(clippy::unwrap_used, reason = "only called with constant URLs")]
fn parse_default_url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn validate_http_url(url: &Url, field: &str) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::InvalidUrlScheme(field.to_string())),
    }
}

impl Config {
    /// Resolve the configuration directory, honouring `RAG_CHAT_CONFIG_DIR`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load from the default configuration directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = Self::config_dir().context("Failed to resolve config directory")?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.embedding.validate()?;
        self.retrieval.validate()?;
        self.completion.validate()?;
        self.upstream.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        for origin in &self.allowed_origins {
            let parsed =
                Url::parse(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))?;
            if parsed.host_str().is_none() {
                return Err(ConfigError::InvalidOrigin(origin.clone()));
            }
        }

        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL a local client should use to reach this server. Wildcard binds
    /// are rewritten to loopback.
    pub fn client_url(&self) -> Result<Url, ConfigError> {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
            other => other,
        };
        let raw = format!("http://{}:{}", host, self.port);
        Url::parse(&raw).map_err(|_| ConfigError::InvalidHost(self.host.clone()))
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(host));
        }
        self.host = host;
        Ok(())
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url(&self.base_url, "embedding.base_url")?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url(&self.controller_url, "retrieval.controller_url")?;
        if let Some(host) = &self.index_host {
            validate_http_url(host, "retrieval.index_host")?;
        }

        if self.index_name.trim().is_empty() {
            return Err(ConfigError::InvalidIndexName(self.index_name.clone()));
        }

        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if self.metadata.source.trim().is_empty() {
            return Err(ConfigError::InvalidMetadataKey("source"));
        }
        if self.metadata.author.trim().is_empty() {
            return Err(ConfigError::InvalidMetadataKey("author"));
        }
        if self.metadata.text.trim().is_empty() {
            return Err(ConfigError::InvalidMetadataKey("text"));
        }

        Ok(())
    }

    pub fn set_index_name(&mut self, index_name: String) -> Result<(), ConfigError> {
        if index_name.trim().is_empty() {
            return Err(ConfigError::InvalidIndexName(index_name));
        }
        self.index_name = index_name;
        Ok(())
    }

    pub fn set_top_k(&mut self, top_k: usize) -> Result<(), ConfigError> {
        if !(1..=MAX_TOP_K).contains(&top_k) {
            return Err(ConfigError::InvalidTopK(top_k));
        }
        self.top_k = top_k;
        Ok(())
    }
}

impl CompletionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url(&self.base_url, "completion.base_url")?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 {
                return Err(ConfigError::InvalidMaxTokens(max_tokens));
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=300).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

impl PromptConfig {
    /// The system prompt sent ahead of every conversation. A relative
    /// `system_prompt_path` is resolved against `base_dir`.
    #[inline]
    pub fn load_system_prompt(&self, base_dir: &Path) -> Result<String> {
        match &self.system_prompt_path {
            Some(path) => {
                let path = base_dir.join(path);
                fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read system prompt: {}", path.display()))
            }
            None => Ok(SYSTEM_PROMPT.to_string()),
        }
    }
}
