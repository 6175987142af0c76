//! Configuration types for linkgrab

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Delivery settings (download directory and size gate)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Directory extractors write artifacts into (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Largest video in bytes that is uploaded instead of linked (default: 50,000,000)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// External tool paths
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
        }
    }
}

/// Telegram transport settings
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    #[serde(default)]
    pub bot_token: Option<String>,
}

// The token never ends up in logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main configuration
///
/// Read once at startup and shared read-only between requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Download directory and size gate
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Telegram transport
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Upper bound on a single extraction (None = unbounded)
    #[serde(default)]
    pub extract_timeout: Option<Duration>,

    /// Timeout for direct HTTP fetches (default: 60 seconds)
    #[serde(default = "default_http_timeout")]
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delivery: DeliveryConfig::default(),
            tools: ToolsConfig::default(),
            telegram: TelegramConfig::default(),
            extract_timeout: None,
            http_timeout: default_http_timeout(),
        }
    }
}

/// Environment variable holding the bot token
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable overriding the download directory
pub const ENV_DOWNLOAD_PATH: &str = "DOWNLOAD_PATH";
/// Environment variable overriding the size limit
pub const ENV_MAX_FILE_SIZE: &str = "MAX_FILE_SIZE";
/// Environment variable pointing at the yt-dlp binary
pub const ENV_YTDLP_PATH: &str = "YTDLP_PATH";
/// Environment variable bounding extraction time, in seconds
pub const ENV_EXTRACT_TIMEOUT: &str = "EXTRACT_TIMEOUT_SECS";
/// Environment variable for the HTTP fetch timeout, in seconds
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.delivery.download_dir
    }

    /// Size limit for uploaded videos
    pub fn max_file_size(&self) -> u64 {
        self.delivery.max_file_size
    }

    /// Build a configuration from process environment variables
    ///
    /// Unset variables keep their defaults. See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Recognised keys: `TELEGRAM_BOT_TOKEN`, `DOWNLOAD_PATH`, `MAX_FILE_SIZE`,
    /// `YTDLP_PATH`, `EXTRACT_TIMEOUT_SECS`, `HTTP_TIMEOUT_SECS`. Empty values
    /// are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key when a numeric
    /// variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(token) = get(ENV_BOT_TOKEN) {
            config.telegram.bot_token = Some(token.trim().to_string());
        }
        if let Some(dir) = get(ENV_DOWNLOAD_PATH) {
            config.delivery.download_dir = PathBuf::from(dir);
        }
        if let Some(size) = get(ENV_MAX_FILE_SIZE) {
            config.delivery.max_file_size = parse_u64(&size, ENV_MAX_FILE_SIZE)?;
        }
        if let Some(path) = get(ENV_YTDLP_PATH) {
            config.tools.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = get(ENV_EXTRACT_TIMEOUT) {
            config.extract_timeout =
                Some(Duration::from_secs(parse_u64(&secs, ENV_EXTRACT_TIMEOUT)?));
        }
        if let Some(secs) = get(ENV_HTTP_TIMEOUT) {
            config.http_timeout = Duration::from_secs(parse_u64(&secs, ENV_HTTP_TIMEOUT)?);
        }

        Ok(config)
    }

    /// Check settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.delivery.max_file_size == 0 {
            return Err(Error::config(
                "maximum file size must be greater than zero",
                ENV_MAX_FILE_SIZE,
            ));
        }
        if self.delivery.download_dir.as_os_str().is_empty() {
            return Err(Error::config(
                "download directory must not be empty",
                ENV_DOWNLOAD_PATH,
            ));
        }
        if self.extract_timeout == Some(Duration::ZERO) {
            return Err(Error::config(
                "extraction timeout must be greater than zero",
                ENV_EXTRACT_TIMEOUT,
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(Error::config(
                "HTTP timeout must be greater than zero",
                ENV_HTTP_TIMEOUT,
            ));
        }
        Ok(())
    }

    /// Bot token, required to run the Telegram transport
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram
            .bot_token
            .as_deref()
            .ok_or_else(|| Error::config("no bot token configured", ENV_BOT_TOKEN))
    }
}

fn parse_u64(value: &str, key: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        Error::config(
            format!("{key} must be a non-negative integer, got {value:?}: {e}"),
            key,
        )
    })
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_file_size() -> u64 {
    50_000_000
}

fn default_true() -> bool {
    true
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(60)
}
