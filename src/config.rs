//! Runtime configuration.
//!
//! Defaults come from `Default`; `FINROUTE_*` environment variables pick the
//! database and completion provider; an optional TOML file (path in
//! `FINROUTE_CONFIG`) overrides cache settings and the suffix list:
//!
//! ```toml
//! db_path = "./finroute.db"
//! corporate_suffixes = ["inc", "corp", "plc"]
//!
//! [caches.reply]
//! ttl_seconds = 120
//! max_entries = 64
//! ```

use crate::domain::error::DomainError;
use crate::domain::values::normalized_name::DEFAULT_CORPORATE_SUFFIXES;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "FINROUTE_DB";
pub const ENV_CONFIG_PATH: &str = "FINROUTE_CONFIG";
pub const ENV_COMPLETION_PROVIDER: &str = "FINROUTE_COMPLETION_PROVIDER";
pub const ENV_COMPLETION_API_KEY: &str = "FINROUTE_COMPLETION_API_KEY";
pub const ENV_COMPLETION_MODEL: &str = "FINROUTE_COMPLETION_MODEL";

pub const DEFAULT_DB_PATH: &str = "./finroute.db";
pub const DEFAULT_MAX_ENTRIES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl CacheSettings {
    pub fn new(ttl_seconds: u64, max_entries: usize) -> Self {
        Self {
            ttl_seconds,
            max_entries,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub reply: CacheSettings,
    pub context: CacheSettings,
    pub metrics: CacheSettings,
    pub summary: CacheSettings,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reply: CacheSettings::new(300, DEFAULT_MAX_ENTRIES),
            context: CacheSettings::new(180, DEFAULT_MAX_ENTRIES),
            metrics: CacheSettings::new(300, DEFAULT_MAX_ENTRIES),
            summary: CacheSettings::new(600, DEFAULT_MAX_ENTRIES),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompletionBackend {
    #[default]
    Noop,
    OpenAi {
        api_key: String,
        model: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinRouteConfig {
    /// SQLite database holding aliases, metrics and messages.
    pub db_path: String,
    pub caches: CacheConfig,
    pub corporate_suffixes: Vec<String>,
    #[serde(skip)]
    pub completion: CompletionBackend,
}

impl Default for FinRouteConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            caches: CacheConfig::default(),
            corporate_suffixes: DEFAULT_CORPORATE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            completion: CompletionBackend::default(),
        }
    }
}

impl FinRouteConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, DomainError> {
        let mut cfg: FinRouteConfig =
            toml::from_str(s).map_err(|e| DomainError::Config(format!("Invalid config: {e}")))?;
        cfg.corporate_suffixes = cfg
            .corporate_suffixes
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("Reading {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// File config (if `FINROUTE_CONFIG` is set) with environment overrides applied.
    pub fn from_env() -> Result<Self, DomainError> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::load_from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(db) = std::env::var(ENV_DB_PATH) {
            cfg.db_path = db;
        }

        let provider = std::env::var(ENV_COMPLETION_PROVIDER).unwrap_or_else(|_| "noop".into());
        cfg.completion = match provider.to_lowercase().as_str() {
            "openai" => CompletionBackend::OpenAi {
                api_key: std::env::var(ENV_COMPLETION_API_KEY).unwrap_or_default(),
                model: std::env::var(ENV_COMPLETION_MODEL).ok(),
            },
            "noop" | "" => CompletionBackend::Noop,
            other => {
                return Err(DomainError::Config(format!(
                    "Unsupported completion provider: {other}"
                )))
            }
        };

        Ok(cfg)
    }
}
