//! Application configuration.
//!
//! Settings come from an optional YAML file (`--config`). Every key has a
//! default, so an empty or partial file is valid:
//!
//! ```yaml
//! scraper:
//!   max_pages: 5
//!   retry:
//!     max_attempts: 3
//! llm:
//!   base_url: http://localhost:1234/v1
//!   model: qwen2.5-7b-instruct
//! ```

use crate::scrapers::fetch::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Chrome on Windows; plain library user agents get served a consent or
/// captcha page.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/101.0.4951.54 Safari/537.36";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub llm: LlmConfig,
}

/// Search endpoint and request pacing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Search endpoint; overridden in tests to point at a mock server.
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Optional hard cap on result pages per scrape.
    pub max_pages: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/search".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            max_pages: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for the analyst report.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Bearer token. Usually supplied through `OPENAI_API_KEY` instead.
    pub api_key: Option<String>,
    pub max_retries: usize,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            api_key: None,
            max_retries: 5,
            request_timeout_secs: 120,
        }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Parse YAML configuration text. Blank text yields the defaults.
///
/// The retry policy is validated here so that bad timings surface as a
/// config error instead of a failure mid-scrape.
pub fn parse_config(yaml: &str) -> Result<AppConfig, Box<dyn Error>> {
    if yaml.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(yaml)?;
    config.scraper.retry.validate()?;
    Ok(config)
}
