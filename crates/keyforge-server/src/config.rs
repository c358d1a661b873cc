//! Process configuration.
//!
//! Command-line flags (with environment fallbacks) are parsed once into
//! [`Args`] and validated into a [`Config`] that is handed to the service and
//! both surfaces at startup.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Text shown by `/start` to callers who are not operators.
pub const DEFAULT_PUBLIC_GREETING: &str =
    "This bot manages license keys for operators. Contact the seller to purchase a license.";

#[derive(Parser, Debug)]
#[command(name = "keyforge-server")]
#[command(
    version,
    about = "keyforge license server - HTTP API and Telegram operator bot"
)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8000", env = "LISTEN_ADDR")]
    pub addr: SocketAddr,

    /// `SQLite` connection string, e.g. `sqlite:/var/lib/keyforge/licenses.db`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Telegram bot token.
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Telegram user ids allowed to run administrative commands.
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    pub operators: Vec<i64>,

    /// Timeout for a single database call, in seconds.
    #[arg(long, env = "STORE_TIMEOUT_SECS", default_value_t = 5)]
    pub store_timeout: u64,

    /// Long-poll timeout for Telegram `getUpdates`, in seconds.
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = 30)]
    pub poll_timeout: u64,

    /// Telegram Bot API base URL.
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// `/start` reply for callers who are not operators.
    #[arg(long, env = "PUBLIC_GREETING")]
    pub public_greeting: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("TELEGRAM_TOKEN is not set")]
    MissingBotToken,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Telegram user ids permitted to run administrative commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operators(HashSet<i64>);

impl Operators {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Settings for the Telegram bot surface.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    pub poll_timeout: Duration,
    pub operators: Operators,
    pub public_greeting: String,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("operators", &self.operators)
            .field("public_greeting", &self.public_greeting)
            .finish()
    }
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub store_timeout: Duration,
    pub log_json: bool,
    pub bot: BotConfig,
}

impl Config {
    /// Validate parsed arguments. A missing or blank database URL or bot
    /// token is fatal.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let database_url = non_blank(args.database_url).ok_or(ConfigError::MissingDatabaseUrl)?;
        let token = non_blank(args.telegram_token).ok_or(ConfigError::MissingBotToken)?;

        if args.store_timeout == 0 {
            return Err(ConfigError::Invalid(
                "store timeout must be at least one second".into(),
            ));
        }
        if args.telegram_api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("Telegram API URL is empty".into()));
        }

        Ok(Self {
            addr: args.addr,
            database_url,
            store_timeout: Duration::from_secs(args.store_timeout),
            log_json: args.log_json,
            bot: BotConfig {
                token,
                api_url: args.telegram_api_url.trim_end_matches('/').to_string(),
                poll_timeout: Duration::from_secs(args.poll_timeout),
                operators: Operators::new(args.operators),
                public_greeting: non_blank(args.public_greeting)
                    .unwrap_or_else(|| DEFAULT_PUBLIC_GREETING.to_string()),
            },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
