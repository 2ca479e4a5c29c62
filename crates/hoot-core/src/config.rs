use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "HOOT_DATA_DIR";

pub const DB_FILE: &str = "hoot.db";
pub const SOCKET_FILE: &str = "hoot.sock";
pub const PID_FILE: &str = "hoot.pid";
pub const LOG_FILE: &str = "hoot.log";
pub const SETTINGS_FILE: &str = "hoot.toml";

/// Domains blocked outright during every session
pub const DEFAULT_BASELINE: &[&str] = &[
    "instagram.com",
    "tiktok.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "reddit.com",
    "snapchat.com",
    "netflix.com",
    "hulu.com",
    "twitch.tv",
    "discord.com",
];

pub const DEFAULT_VIDEO_HOST: &str = "youtube.com";
pub const DEFAULT_BLOCK_PAGE: &str = "hoot://block";

/// Get the local data directory for hoot.
///
/// `HOOT_DATA_DIR` wins over the platform default.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("hoot");
    Ok(path)
}

/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn socket_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(SOCKET_FILE))
}

/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn pid_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(PID_FILE))
}

/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn log_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(LOG_FILE))
}

/// File-based settings (`hoot.toml`). Every field has a default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub blocking: BlockingSettings,
    pub daemon: DaemonSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingSettings {
    /// Domains blocked in every session
    pub baseline: Vec<String>,
    /// Host whose videos go through the classifier instead of the block list
    pub video_host: String,
    /// Base URL of the block surface
    pub block_page: String,
    /// Ask the classifier for extra distracting domains on session start
    pub ai_extension: bool,
}

impl Default for BlockingSettings {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE.iter().map(ToString::to_string).collect(),
            video_host: DEFAULT_VIDEO_HOST.to_string(),
            block_page: DEFAULT_BLOCK_PAGE.to_string(),
            ai_extension: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub tick_interval_seconds: u64,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Number of observers (tabs) remembered for de-duplication
    pub dedup_capacity: usize,
    /// Upper bound on one classifier round trip; slower answers fail open
    pub timeout_seconds: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            dedup_capacity: 64,
            timeout_seconds: 20,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Load `hoot.toml` from the data directory
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unknown or the file is invalid
    pub fn load_default() -> Result<Self> {
        Self::load(&get_data_dir()?.join(SETTINGS_FILE))
    }

    /// # Errors
    ///
    /// Returns an error if `raw` is not valid settings TOML
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
