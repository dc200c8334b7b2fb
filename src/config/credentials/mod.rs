
use std::fmt;

use super::ConfigError;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// API keys for the three upstream services. Never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub gemini_api_key: String,
    pub pinecone_api_key: String,
    pub openrouter_api_key: String,
}

impl Credentials {
    /// Read all keys from the process environment
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read all keys through `lookup`. Blank values count as missing.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };

        Ok(Self {
            gemini_api_key: require(GEMINI_API_KEY_ENV)?,
            pinecone_api_key: require(PINECONE_API_KEY_ENV)?,
            openrouter_api_key: require(OPENROUTER_API_KEY_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .field("openrouter_api_key", &"<redacted>")
            .finish()
    }
}
