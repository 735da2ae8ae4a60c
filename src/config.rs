use anyhow::{Context, ensure};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 15 players would leave only seven cards after the deal, possibly all
/// wild, so the opening card could never be found.
pub const MAX_PLAYERS_LIMIT: usize = 14;

#[derive(Debug, Parser)]
#[command(name = "uno_server", about = "Line-protocol UNO session server")]
pub struct Cli {
    /// JSON file with server settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(long)]
    pub bind: Option<String>,

    /// Seconds between sweeps of finished rooms
    #[arg(long)]
    pub cleanup_interval: Option<u64>,

    #[arg(long)]
    pub max_players: Option<usize>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    pub log_level: Option<String>,

    /// PEM certificate chain served to clients
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// PEM private key for the certificate
    #[arg(long)]
    pub key: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cleanup_interval_secs: u64,
    pub max_players_per_room: usize,
    pub keepalive_secs: u64,
    pub log_level: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: String::from("0.0.0.0:5000"),
            cleanup_interval_secs: 10,
            max_players_per_room: 10,
            keepalive_secs: 10,
            log_level: String::from("debug"),
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the config file if given, then command-line flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(bind) = &cli.bind {
            config.bind_addr = bind.clone();
        }
        if let Some(secs) = cli.cleanup_interval {
            config.cleanup_interval_secs = secs;
        }
        if let Some(max) = cli.max_players {
            config.max_players_per_room = max;
        }
        if let Some(level) = &cli.log_level {
            config.log_level = level.clone();
        }
        if let Some(cert) = &cli.cert {
            config.cert_path = cert.clone();
        }
        if let Some(key) = &cli.key {
            config.key_path = key.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (2..=MAX_PLAYERS_LIMIT).contains(&self.max_players_per_room),
            "max_players_per_room must be between 2 and {}, got {}",
            MAX_PLAYERS_LIMIT,
            self.max_players_per_room
        );
        ensure!(
            self.cleanup_interval_secs > 0,
            "cleanup_interval_secs must be positive"
        );
        self.tracing_level()?;
        Ok(())
    }

    pub fn tracing_level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .with_context(|| format!("invalid log level {:?}", self.log_level))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}
