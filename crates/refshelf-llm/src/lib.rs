//! Paper summaries and reference lists from an OpenAI-compatible
//! chat-completions endpoint.
//!
//! The reference list returned by the model is an alternate source for the
//! heuristic extractor in `refshelf_parsing`. It is only usable when the
//! model's JSON block parses; [`parse_reference_block`] returns an error
//! otherwise so the caller can keep the heuristic output. Each record is
//! held to the extractor's own length and year rules.

use std::time::Duration;

use refshelf_core::config_file::LlmFileConfig;
use thiserror::Error;

mod block;
mod client;
mod prompt;

pub use block::{parse_reference_block, parse_reference_block_with_config};
pub use client::LlmClient;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("rate limited (429)")]
    RateLimited,
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("malformed reference block: {0}")]
    MalformedBlock(String),
    #[error("no API key configured")]
    MissingApiKey,
}

/// Connection and request settings for [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Paper text beyond this many characters is not sent.
    pub max_input_chars: usize,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_input_chars: 100_000,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LlmConfig {
    /// Defaults overlaid with the `[llm]` table of a config file.
    pub fn from_file(file: Option<&LlmFileConfig>) -> Self {
        let defaults = Self::default();
        let Some(f) = file else {
            return defaults;
        };
        Self {
            endpoint: f.endpoint.clone().unwrap_or(defaults.endpoint),
            model: f.model.clone().unwrap_or(defaults.model),
            api_key: f.api_key.clone().filter(|k| !k.is_empty()),
            max_input_chars: f.max_input_chars.unwrap_or(defaults.max_input_chars),
            timeout: f
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_none_is_default() {
        let config = LlmConfig::from_file(None);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_from_file_overlays() {
        let file = LlmFileConfig {
            model: Some("local-model".to_string()),
            api_key: Some(String::new()),
            timeout_secs: Some(5),
            ..Default::default()
        };
        let config = LlmConfig::from_file(Some(&file));
        assert_eq!(config.model, "local-model");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
