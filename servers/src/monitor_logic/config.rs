use clap::Parser;
use clap::builder::FalseyValueParser;
use lib_spectrum::{FeedConfig, ReconnectPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Config file read when `--config-path` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "spectrum_monitor.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Terminal dashboard for the Spectrum launch vehicle", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "SPECTRUM_API_BASE_URL", help = "HTTP base URL of the vehicle backend.")]
    pub api_base_url: Option<String>,

    #[clap(long, env = "SPECTRUM_WS_BASE_URL", help = "WebSocket base URL, derived from the API URL when unset.")]
    pub ws_base_url: Option<String>,

    #[serde(skip)]
    #[clap(long, env = "SPECTRUM_MONITOR_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "SPECTRUM_MONITOR_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "SPECTRUM_MONITOR_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "SPECTRUM_MONITOR_LOG_CONSOLE", value_parser = FalseyValueParser::new(), help = "Mirror log events to stderr.")]
    pub log_console: Option<bool>,

    #[clap(long, env = "SPECTRUM_RECONNECT", value_parser = FalseyValueParser::new(), help = "Reconnect to the feed after a connection error.")]
    pub reconnect: Option<bool>,

    #[clap(long, env = "SPECTRUM_RECONNECT_BASE_DELAY_MS", help = "Base delay in milliseconds for feed reconnect attempts.")]
    pub reconnect_base_delay_ms: Option<u64>,

    #[clap(long, env = "SPECTRUM_RECONNECT_MAX_DELAY_MS", help = "Maximum delay in milliseconds for feed reconnect attempts.")]
    pub reconnect_max_delay_ms: Option<u64>,

    #[clap(long, env = "SPECTRUM_RECONNECT_MAX_RETRIES", help = "Consecutive failed reconnects before giving up.")]
    pub reconnect_max_retries: Option<u32>,

    #[clap(long, env = "NO_COLOR", value_parser = FalseyValueParser::new(), help = "Disable colored output.")]
    pub no_color: Option<bool>,
}

/// Fully resolved monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub api_base_url: String,
    pub feed: FeedConfig,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub log_console: bool,
    pub no_color: bool,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            api_base_url: other.api_base_url.or(self.api_base_url),
            ws_base_url: other.ws_base_url.or(self.ws_base_url),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            log_console: other.log_console.or(self.log_console),
            reconnect: other.reconnect.or(self.reconnect),
            reconnect_base_delay_ms: other.reconnect_base_delay_ms.or(self.reconnect_base_delay_ms),
            reconnect_max_delay_ms: other.reconnect_max_delay_ms.or(self.reconnect_max_delay_ms),
            reconnect_max_retries: other.reconnect_max_retries.or(self.reconnect_max_retries),
            no_color: other.no_color.or(self.no_color),
        }
    }

    fn defaults() -> Config {
        Config {
            api_base_url: Some("http://127.0.0.1:9003".to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            log_console: Some(false),
            reconnect: Some(false),
            reconnect_base_delay_ms: Some(1000),
            reconnect_max_delay_ms: Some(60000),
            reconnect_max_retries: Some(10),
            no_color: Some(false),
            ..Default::default()
        }
    }

    fn resolve(self) -> Result<MonitorSettings, ConfigError> {
        let api_base_url = self.api_base_url.unwrap_or_else(|| "http://127.0.0.1:9003".to_string());
        let ws_base_url = match self.ws_base_url {
            Some(url) => url,
            None => derive_ws_url(&api_base_url)?,
        };

        let reconnect = if self.reconnect.unwrap_or(false) {
            ReconnectPolicy::ExponentialBackoff {
                base_delay: Duration::from_millis(self.reconnect_base_delay_ms.unwrap_or(1000)),
                max_delay: Duration::from_millis(self.reconnect_max_delay_ms.unwrap_or(60000)),
                max_retries: self.reconnect_max_retries.unwrap_or(10),
                jitter: true,
            }
        } else {
            ReconnectPolicy::Disabled
        };

        Ok(MonitorSettings {
            api_base_url,
            feed: FeedConfig::new(ws_base_url).with_reconnect(reconnect),
            log_dir: self.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            log_console: self.log_console.unwrap_or(false),
            no_color: self.no_color.unwrap_or(false),
        })
    }
}

/// `http://host:port/x` becomes `ws://host:port/x`, `https` becomes `wss`.
pub fn derive_ws_url(api_base_url: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: api_base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(api_base_url).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid(format!("cannot switch scheme to {scheme}")))?;

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Layers defaults, the JSON config file and CLI/env arguments, in that order.
pub fn load_config(cli: Config) -> Result<MonitorSettings, ConfigError> {
    let mut current_config = Config::defaults();

    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_file_path.exists() {
        let config_str = fs::read_to_string(&config_file_path).map_err(|source| ConfigError::Read {
            path: config_file_path.clone(),
            source,
        })?;
        let file_config = serde_json::from_str::<Config>(&config_str).map_err(|source| ConfigError::Parse {
            path: config_file_path.clone(),
            source,
        })?;
        current_config = current_config.merge(file_config);
    }

    current_config.merge(cli).resolve()
}
