use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Runtime settings of the office server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind: String,
    /// Directory holding the JSON data files
    pub data_dir: PathBuf,
    /// Directory whose `uploads/` subdirectory is served at `/uploads`
    pub public_dir: PathBuf,
    /// Number of chat messages kept in the history file
    pub chat_history_limit: usize,
    /// Poll interval suggested to chat clients
    pub chat_poll_interval_ms: u64,
    pub max_upload_bytes: u64,
    /// City printed in front of letter dates
    pub office_city: String,
    /// Sequence number printed in the monthly report letter number
    pub letter_sequence: u32,
    /// Name signing the report letters
    pub official_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public"),
            chat_history_limit: 500,
            chat_poll_interval_ms: 2000,
            max_upload_bytes: 10 * 1024 * 1024,
            office_city: "Garut".to_string(),
            letter_sequence: 1,
            official_name: String::new(),
        }
    }
}

impl Config {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config {} not found, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NOTARIS_BIND`, `NOTARIS_DATA_DIR` and `NOTARIS_PUBLIC_DIR`.
    pub fn with_env(mut self) -> Self {
        if let Ok(bind) = std::env::var("NOTARIS_BIND") {
            self.bind = bind;
        }
        if let Ok(dir) = std::env::var("NOTARIS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("NOTARIS_PUBLIC_DIR") {
            self.public_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chat_history_limit == 0 {
            return Err(AppError::invalid("chatHistoryLimit must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::invalid("maxUploadBytes must be at least 1"));
        }
        Ok(())
    }

    /// Defaults rooted in `dir`, used by tests and one-off tools.
    pub fn rooted_at(dir: &Path) -> Self {
        Config {
            data_dir: dir.join("data"),
            public_dir: dir.join("public"),
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bind": "0.0.0.0:8080", "chatHistoryLimit": 50 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.chat_history_limit, 50);
        assert_eq!(config.chat_poll_interval_ms, 2000);
        assert_eq!(config.office_city, "Garut");
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "chatHistoryLimit": 0 }"#).unwrap();
        assert!(Config::load(&path).is_err());
    }
}
