// Configuration management module
// TOML settings on disk, API keys from the environment

pub mod credentials;
pub mod interactive;
pub mod settings;


pub use credentials::Credentials;
pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CompletionConfig, Config, ConfigError, EmbeddingConfig, MetadataKeys, PromptConfig,
    RetrievalConfig, ServerConfig, UpstreamConfig,
};
