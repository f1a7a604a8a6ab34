//! Configuration management for ticketfs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request timeout against Zammad (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default freshness window for cached ticket data (seconds)
pub const DEFAULT_FRESHNESS_SECS: u64 = 5;

/// Default page-size ceiling for the root ticket search
pub const DEFAULT_SEARCH_LIMIT: u32 = 10_000;

/// Remote user id used when a local account has no Zammad counterpart
pub const DEFAULT_FALLBACK_USER_ID: u64 = 65534;

/// Zammad API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZammadConfig {
    /// Base URL of the Zammad instance, e.g. https://helpdesk.example.org
    pub url: String,

    /// API token
    pub token: String,

    /// Timeout for a single API call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of tickets returned by the root listing search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

/// Node cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds after which cached ticket data is re-fetched
    pub freshness_secs: u64,
}

/// Mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Mount point path
    pub mount_point: PathBuf,

    /// Allow other users to access the mount
    pub allow_other: bool,

    /// Unmount automatically when the process exits
    pub auto_unmount: bool,

    /// Filesystem name shown in the mount table
    pub fs_name: String,
}

/// Local user to Zammad user mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Local account name -> Zammad user id
    #[serde(default)]
    pub users: HashMap<String, u64>,

    /// Zammad user id for unmapped accounts
    #[serde(default = "default_fallback_user_id")]
    pub fallback_user_id: u64,
}

fn default_fallback_user_id() -> u64 {
    DEFAULT_FALLBACK_USER_ID
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Zammad API configuration
    pub zammad: ZammadConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Mount configuration
    #[serde(default)]
    pub mount: MountConfig,

    /// Identity mapping
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Default for ZammadConfig {
    fn default() -> Self {
        ZammadConfig {
            url: String::new(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ZammadConfig {
    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            freshness_secs: DEFAULT_FRESHNESS_SECS,
        }
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        MountConfig {
            mount_point: PathBuf::from("/mnt/tickets"),
            allow_other: false,
            auto_unmount: true,
            fs_name: "zammad".to_string(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            users: HashMap::new(),
            fallback_user_id: DEFAULT_FALLBACK_USER_ID,
        }
    }
}

impl Config {
    /// Load and validate configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file and apply environment overrides, without validating
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ZAMMAD_URL") {
            let url = url.trim().to_string();
            if !url.is_empty() {
                self.zammad.url = url;
            }
        }

        if let Ok(token) = std::env::var("ZAMMAD_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                self.zammad.token = token;
            }
        }

        if let Ok(secs) = std::env::var("TICKETFS_FRESHNESS_SECS") {
            if let Ok(secs) = secs.trim().parse::<u64>() {
                self.cache.freshness_secs = secs;
            }
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zammad.url.is_empty() {
            return Err(Error::InvalidConfig("Zammad URL is required".to_string()));
        }

        if !self.zammad.url.starts_with("http://") && !self.zammad.url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "Zammad URL must start with http:// or https://, got '{}'",
                self.zammad.url
            )));
        }

        if self.zammad.token.is_empty() {
            return Err(Error::InvalidConfig("Zammad token is required".to_string()));
        }

        if self.zammad.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.zammad.search_limit == 0 {
            return Err(Error::InvalidConfig(
                "Search limit must be greater than 0".to_string(),
            ));
        }

        if self.cache.freshness_secs == 0 {
            return Err(Error::InvalidConfig(
                "Freshness window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Freshness window as a Duration
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.zammad.url.trim_end_matches('/')
    }
}
