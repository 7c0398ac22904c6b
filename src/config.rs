use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TabulaConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub pool: PoolConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Backing database file. Defaults to a per-project file under
    /// `~/.tabula/projects/`, named after the current directory.
    pub db_path: String,
    /// When true, every write operation is rejected with a permission error.
    pub read_only: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_decisions: usize,
    pub max_patterns: usize,
    pub max_context_keys: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PoolConfig {
    pub size: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub ops_per_minute: usize,
    pub window_secs: u64,
    /// Persist the window across restarts (stored in the database).
    pub persist: bool,
}

impl Default for TabulaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            pool: PoolConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_tabula_dir()
            .join("projects")
            .join(format!("{}.db", project_slug()))
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            read_only: false,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_decisions: 1000,
            max_patterns: 100,
            max_context_keys: 50,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ops_per_minute: 100,
            window_secs: 60,
            persist: false,
        }
    }
}

/// Returns `~/.tabula/`
pub fn default_tabula_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".tabula")
}

/// Returns the default config file path: `~/.tabula/config.toml`
pub fn default_config_path() -> PathBuf {
    default_tabula_dir().join("config.toml")
}

/// Filesystem-safe identifier for the current project, derived from the
/// working directory name.
fn project_slug() -> String {
    let name = std::env::current_dir()
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "default".into());
    sanitize_slug(&name)
}

fn sanitize_slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "default".into()
    } else {
        slug
    }
}

impl TabulaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TabulaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (TABULA_DB, TABULA_LOG_LEVEL,
    /// TABULA_READ_ONLY, TABULA_POOL_SIZE, TABULA_RATE_LIMIT).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TABULA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("TABULA_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("TABULA_READ_ONLY") {
            self.storage.read_only = val.eq_ignore_ascii_case("true") || val == "1";
        }
        if let Ok(val) = std::env::var("TABULA_POOL_SIZE") {
            if let Ok(n) = val.parse() {
                self.pool.size = n;
            }
        }
        if let Ok(val) = std::env::var("TABULA_RATE_LIMIT") {
            if let Ok(n) = val.parse() {
                self.rate_limit.ops_per_minute = n;
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
