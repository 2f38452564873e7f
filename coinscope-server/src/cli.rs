//! Command-line argument parsing for the coinscope gateway
//!
//! Uses clap for argument parsing with derive macros. Flags win over the
//! environment, which wins over the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, Profile};

/// coinscope - MCP gateway for coin prices and Twitter mentions
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "COINSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tool preset: "single" (price only) or "multi" (price and mentions)
    #[arg(long, value_enum, env = "COINSCOPE_PROFILE")]
    pub profile: Option<Profile>,

    /// Listen host
    #[arg(long, env = "COINSCOPE_HOST")]
    pub host: Option<String>,

    /// Listen port (defaults to the profile's port)
    #[arg(long, short = 'p', env = "PORT")]
    pub port: Option<u16>,

    /// Serve a single session on stdin/stdout instead of HTTP
    #[arg(long, default_value_t = false)]
    pub stdio: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overlay flags onto a loaded config
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(profile) = self.profile {
            config.server.profile = profile;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
    }
}
