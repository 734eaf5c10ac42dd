use crate::notifications::LEISURE_BUDGET;
use crate::preferences::local::LOCAL_CACHE_FILE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection details for the hosted profile table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RemoteSettings {
    pub base_url: String,
    /// Anonymous/public key sent as both `apikey` and bearer token.
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "profiles".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_leisure_budget() -> f64 {
    LEISURE_BUDGET
}

fn default_event_limit() -> usize {
    5
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the local cache. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Monthly leisure budget used by the finance alert.
    #[serde(default = "default_leisure_budget")]
    pub leisure_budget: f64,
    /// Number of upcoming events handed to the notification feed.
    #[serde(default = "default_event_limit")]
    pub event_limit: usize,
    /// Signed-in user. Remote writes are skipped while this is unset.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            debug_logging: false,
            log_file: None,
            leisure_budget: default_leisure_budget(),
            event_limit: default_event_limit(),
            user_id: None,
            remote: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        match dirs_next::data_dir() {
            Some(dir) => dir.join("taskboard"),
            None => {
                tracing::warn!("no platform data directory; using the working directory");
                PathBuf::from(".")
            }
        }
    }

    pub fn local_cache_path(&self) -> PathBuf {
        self.data_dir().join(LOCAL_CACHE_FILE)
    }
}
