//! Configuration schema structs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use coinscope_utils::LogConfig;
use serde::{Deserialize, Serialize};

use super::defaults;
use crate::mcp::ToolKind;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tools: ToolsConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Tools to serve: the explicit list if given, otherwise the profile's
    pub fn enabled_tools(&self) -> Vec<ToolKind> {
        self.tools
            .enabled
            .clone()
            .unwrap_or_else(|| self.server.profile.tools())
    }
}

/// Named deployment preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Price lookup only
    #[default]
    Single,
    /// Price lookup and mention search
    Multi,
}

impl Profile {
    pub fn default_port(self) -> u16 {
        match self {
            Profile::Single => defaults::SINGLE_PROFILE_PORT,
            Profile::Multi => defaults::MULTI_PROFILE_PORT,
        }
    }

    pub fn tools(self) -> Vec<ToolKind> {
        match self {
            Profile::Single => vec![ToolKind::GetCoinPrice],
            Profile::Multi => vec![ToolKind::GetCoinPrice, ToolKind::SearchTwitterMentions],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Single => write!(f, "single"),
            Profile::Multi => write!(f, "multi"),
        }
    }
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub profile: Profile,
    pub host: String,
    /// Falls back to the profile's port when unset
    pub port: Option<u16>,
    pub keepalive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            host: defaults::DEFAULT_HOST.into(),
            port: None,
            keepalive_secs: defaults::DEFAULT_KEEPALIVE_SECS,
        }
    }
}

impl ServerConfig {
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.profile.default_port())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.effective_port())
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

/// Explicit tool selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub enabled: Option<Vec<ToolKind>>,
}

/// Upstream provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub price_base_url: String,
    pub mentions_base_url: String,
    /// Never has a compiled-in default
    pub mentions_api_key: Option<ApiKey>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            price_base_url: defaults::DEFAULT_PRICE_BASE_URL.into(),
            mentions_base_url: defaults::DEFAULT_MENTIONS_BASE_URL.into(),
            mentions_api_key: None,
            timeout_secs: defaults::DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: defaults::DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: defaults::default_user_agent(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub file: Option<PathBuf>,
    /// Log span open/close (shows each tool call's lifetime)
    pub span_events: bool,
    pub file_line: bool,
}

impl LoggingConfig {
    /// Subscriber settings for the gateway process
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::server(self.filter.as_deref());
        if let Some(file) = &self.file {
            config = config.with_file(file);
        }
        config.span_events = self.span_events;
        config.file_line = self.file_line;
        config
    }
}

/// API credential; redacted in Debug output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
