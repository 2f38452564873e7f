//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Listen host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port of the price-only deployment
pub const SINGLE_PROFILE_PORT: u16 = 8001;

/// Port of the price + mentions deployment
pub const MULTI_PROFILE_PORT: u16 = 8003;

/// Seconds of stream silence before a keep-alive comment
pub const DEFAULT_KEEPALIVE_SECS: u64 = 15;

/// CoinGecko public API
pub const DEFAULT_PRICE_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// ELFA AI API
pub const DEFAULT_MENTIONS_BASE_URL: &str = "https://api.elfa.ai";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Environment overrides for the upstream section
pub const PRICE_URL_ENV: &str = "COINGECKO_API_URL";
pub const MENTIONS_URL_ENV: &str = "ELFA_API_URL";
pub const MENTIONS_KEY_ENV: &str = "ELFA_API_KEY";

/// User agent sent upstream
pub fn default_user_agent() -> String {
    format!("coinscope/{}", env!("CARGO_PKG_VERSION"))
}

/// Default configuration as TOML (for reference/documentation)
pub const DEFAULT_CONFIG_TOML: &str = r##"
# coinscope configuration

[server]
# "single" serves get_coin_price, "multi" adds search_twitter_mentions
profile = "single"
host = "0.0.0.0"
# port = 8001            # defaults to 8001 (single) or 8003 (multi)
keepalive_secs = 15

[tools]
# enabled = ["get_coin_price", "search_twitter_mentions"]

[upstream]
price_base_url = "https://api.coingecko.com/api/v3"
mentions_base_url = "https://api.elfa.ai"
# mentions_api_key = ""  # prefer the ELFA_API_KEY environment variable
timeout_secs = 10
connect_timeout_secs = 5

[logging]
filter = "info"
# file = "/var/log/coinscope/coinscope.log"
span_events = false
file_line = false
"##;
