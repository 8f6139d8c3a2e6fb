use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV: &str = "TRAINER_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

const DEFAULT_CONFIG_FILE: &str = "trainer.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub classification: ClassificationConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Upper bound on how long a single read may stall before the
    /// connection is dropped.
    pub idle_timeout_secs: u64,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub unknown_dir: PathBuf,
    pub ham_dir: PathBuf,
    pub spam_dir: PathBuf,
    /// Trained messages older than this are purged at startup.
    pub expiry_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub header_name: String,
    pub spam_string: String,
    pub ham_string: String,
    pub unsure_string: String,
    pub ham_cutoff: f64,
    pub spam_cutoff: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8880".to_string(),
            idle_timeout_secs: 30,
            max_header_bytes: 64 * 1024,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("hammie.yaml"),
            unknown_dir: PathBuf::from("trainer-unknown-cache"),
            ham_dir: PathBuf::from("trainer-ham-cache"),
            spam_dir: PathBuf::from("trainer-spam-cache"),
            expiry_days: 7,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Spambayes-Classification".to_string(),
            spam_string: "spam".to_string(),
            ham_string: "ham".to_string(),
            unsure_string: "unsure".to_string(),
            ham_cutoff: 0.20,
            spam_cutoff: 0.90,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

impl Config {
    /// Loads the configuration file named by `TRAINER_CONFIG` (or
    /// `trainer.yaml`), falling back to defaults when it does not exist,
    /// then applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut cfg = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
