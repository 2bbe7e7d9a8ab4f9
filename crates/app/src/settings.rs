//! Handles settings for the application.
//!
//! Sources, later ones winning: the TOML file (`config/finance.toml` unless
//! `--config` says otherwise, optional), `FINANCE_*` environment variables
//! (`FINANCE_SERVER__PORT=4000`), then command line flags.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/finance.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cache {
    #[default]
    Memory,
    Redis {
        url: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ledger {
    /// Lifetime of a cached balance.
    pub ttl_seconds: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            ttl_seconds: engine::DEFAULT_BALANCE_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub server: Option<Server>,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub ledger: Ledger,
}

#[derive(Debug, Parser)]
#[command(name = "budgeting", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long)]
    level: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();

        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("FINANCE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if let Some(level) = args.level {
            settings.app.level = level;
        }

        Ok(settings)
    }
}
