use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Config file read when `--config-path` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "server_spectrum.conf";

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

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Simulated Spectrum vehicle backend", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "SPECTRUM_PORT", help = "Port to listen on for dashboard connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "SPECTRUM_BIND_ADDRESS", help = "Address to bind to.")]
    pub bind_address: Option<String>,

    #[serde(skip)]
    #[clap(long, env = "SPECTRUM_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "SPECTRUM_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "SPECTRUM_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "SPECTRUM_TICK_MS", help = "Milliseconds between two vehicle state updates.")]
    pub tick_ms: Option<u64>,

    #[clap(long, env = "SPECTRUM_ANOMALY_EVERY", help = "Raise an operator action request every N ticks (0 disables).")]
    pub anomaly_every: Option<u64>,

    #[clap(long, env = "SPECTRUM_MALFORMED_EVERY", help = "Send a malformed frame every N ticks (0 disables).")]
    pub malformed_every: Option<u64>,

    #[clap(long, env = "SPECTRUM_SEED", help = "Seed for the simulator noise, random when unset.")]
    pub seed: Option<u64>,
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub tick: Duration,
    pub anomaly_every: u64,
    pub malformed_every: u64,
    pub seed: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            bind_address: other.bind_address.or(self.bind_address),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            tick_ms: other.tick_ms.or(self.tick_ms),
            anomaly_every: other.anomaly_every.or(self.anomaly_every),
            malformed_every: other.malformed_every.or(self.malformed_every),
            seed: other.seed.or(self.seed),
        }
    }

    fn defaults() -> Config {
        Config {
            port: Some(9003),
            bind_address: Some("0.0.0.0".to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            tick_ms: Some(500),
            anomaly_every: Some(40),
            malformed_every: Some(0),
            ..Default::default()
        }
    }

    fn resolve(self) -> Result<ServerSettings, ConfigError> {
        let tick_ms = self.tick_ms.unwrap_or(500);
        if tick_ms == 0 {
            return Err(ConfigError::Invalid("tickMs must be greater than zero".to_string()));
        }

        Ok(ServerSettings {
            port: self.port.unwrap_or(9003),
            bind_address: self.bind_address.unwrap_or_else(|| "0.0.0.0".to_string()),
            log_dir: self.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            tick: Duration::from_millis(tick_ms),
            anomaly_every: self.anomaly_every.unwrap_or(0),
            malformed_every: self.malformed_every.unwrap_or(0),
            seed: self.seed,
        })
    }
}

/// Layers defaults, the JSON config file and CLI/env arguments, in that order.
///
/// A missing config file is fine; an unreadable or malformed one is an error.
pub fn load_config(cli: Config) -> Result<ServerSettings, ConfigError> {
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
