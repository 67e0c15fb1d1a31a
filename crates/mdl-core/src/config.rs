use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::ids::UserId;

/// Environment variable holding the bot credential (required).
pub const BOT_TOKEN_ENV: &str = "MDL_BOT_TOKEN";
/// Environment variable holding the privileged owner's user id (optional).
pub const OWNER_ID_ENV: &str = "MDL_OWNER_ID";

/// yt-dlp invocation settings (optional `[ytdlp]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtDlpConfig {
    /// Binary name or absolute path.
    pub binary: String,
    /// Netscape cookies file passed with `--cookies`.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    /// Format selector used when no variant was chosen.
    pub default_format: String,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            cookies_file: None,
            default_format: "best".to_string(),
        }
    }
}

/// Behavioral toggles of the download orchestrator (optional `[orchestrator]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Show the approximate size next to each quality option.
    pub show_size_in_prompt: bool,
    /// Keep a "Processing..." message alive while probing.
    pub probe_heartbeat: bool,
    /// Seconds between heartbeat messages.
    pub heartbeat_interval_secs: u64,
    /// Options above this size are only offered to the owner (None = no gate).
    #[serde(default)]
    pub max_ungated_size_bytes: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            show_size_in_prompt: true,
            probe_heartbeat: false,
            heartbeat_interval_secs: 5,
            max_ungated_size_bytes: None,
        }
    }
}

/// Global configuration loaded from `~/.config/mdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdlConfig {
    /// Where fetched files are written before upload (None = `$TMPDIR/mdl`).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Timeout for Media Backend and Messaging Gateway calls.
    pub network_timeout_secs: u64,
    /// Largest file the chat platform accepts.
    pub max_upload_bytes: u64,
    /// Tokens older than this are swept on startup.
    pub token_ttl_days: u64,
    /// Hosts for which users get a "use a clean URL" tip.
    #[serde(default)]
    pub clean_url_hosts: Vec<String>,
    /// Link shown by `/donate` (None = donations not set up).
    #[serde(default)]
    pub donate_url: Option<String>,
    #[serde(default)]
    pub ytdlp: YtDlpConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl Default for MdlConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            network_timeout_secs: 300,
            max_upload_bytes: 2000 * 1024 * 1024,
            token_ttl_days: 30,
            clean_url_hosts: vec!["faphouse.com".to_string()],
            donate_url: None,
            ytdlp: YtDlpConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl MdlConfig {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mdl"))
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs.max(1))
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_days.saturating_mul(24 * 60 * 60))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<MdlConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, creating a default file there if it is missing.
pub fn load_or_init_at(path: &Path) -> Result<MdlConfig> {
    if !path.exists() {
        let default_cfg = MdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: MdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Opaque secrets taken from the environment, never from the config file.
#[derive(Clone)]
pub struct Secrets {
    pub bot_token: String,
    pub owner_id: Option<UserId>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("bot_token", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. A missing or blank token is fatal; a
    /// missing owner id only disables owner commands.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(BOT_TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingCredential(BOT_TOKEN_ENV))?;

        let owner_id = match lookup(OWNER_ID_ENV).map(|s| s.trim().to_string()) {
            None => None,
            Some(s) if s.is_empty() => None,
            Some(s) => Some(UserId(
                s.parse::<i64>()
                    .map_err(|_| ConfigError::InvalidOwnerId(s.clone()))?,
            )),
        };

        Ok(Self { bot_token, owner_id })
    }
}
