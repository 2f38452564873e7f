//! Configuration loader

use std::path::Path;

use coinscope_utils::{CoinscopeError, Result};
use url::Url;

use super::defaults::{MENTIONS_KEY_ENV, MENTIONS_URL_ENV, PRICE_URL_ENV};
use super::{ApiKey, AppConfig};
use crate::mcp::ToolKind;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => AppConfig::default(),
        };
        Self::apply_env(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| CoinscopeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| CoinscopeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay upstream settings from the environment
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// clobber the file.
    pub fn apply_env<F>(config: &mut AppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(PRICE_URL_ENV) {
            config.upstream.price_base_url = url;
        }
        if let Some(url) = lookup(MENTIONS_URL_ENV) {
            config.upstream.mentions_base_url = url;
        }
        if let Some(key) = lookup(MENTIONS_KEY_ENV) {
            config.upstream.mentions_api_key = Some(ApiKey::new(key));
        }
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        let tools = config.enabled_tools();
        if tools.is_empty() {
            return Err(CoinscopeError::config("at least one tool must be enabled"));
        }

        if config.server.keepalive_secs == 0 {
            return Err(CoinscopeError::config("keepalive_secs must be greater than 0"));
        }

        if config.upstream.timeout_secs == 0 || config.upstream.connect_timeout_secs == 0 {
            return Err(CoinscopeError::config(
                "upstream timeouts must be greater than 0",
            ));
        }

        if tools.contains(&ToolKind::GetCoinPrice) {
            validate_base_url("price_base_url", &config.upstream.price_base_url)?;
        }

        if tools.contains(&ToolKind::SearchTwitterMentions) {
            validate_base_url("mentions_base_url", &config.upstream.mentions_base_url)?;

            let has_key = config
                .upstream
                .mentions_api_key
                .as_ref()
                .is_some_and(|key| !key.is_blank());
            if !has_key {
                return Err(CoinscopeError::config(format!(
                    "search_twitter_mentions requires an API key (set {} or upstream.mentions_api_key)",
                    MENTIONS_KEY_ENV
                )));
            }
        }

        Ok(())
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| CoinscopeError::config(format!("{} is not a valid URL: {}", field, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CoinscopeError::config(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}
