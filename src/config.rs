use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::hey;

const CONFIG_PATH: &str = "./config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfigSettings {
    /// users allowed to drive any menu, on top of whoever opened it
    pub owner_ids: Vec<u64>,
    pub menu_timeout_secs: u64,
    pub prompt_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub clip_lookback_days: i64,
    pub data_dir: String,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            owner_ids: Vec::new(),
            menu_timeout_secs: 60,
            prompt_timeout_secs: 30,
            poll_interval_secs: 60,
            clip_lookback_days: 8,
            data_dir: "./data".to_string(),
        }
    }
}

impl ConfigSettings {
    pub fn get() -> Self {
        Self::get_from(Path::new(CONFIG_PATH))
    }

    pub fn get_from(path: &Path) -> Self {
        if !path.exists() {
            Self::generate(path);
            return Self::default();
        }

        let Ok(data) = fs::read_to_string(path) else {
            hey!("Failed to read {}, using default settings", path.display());
            return Self::default();
        };

        match serde_json::from_str(data.as_str()) {
            Ok(cfg) => cfg,
            Err(e) => {
                hey!("Malformed config {}: {}, using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    fn generate(path: &Path) {
        if path.exists() {
            hey!("Config data already exists");
            return;
        };

        let Ok(mut file) = OpenOptions::new()
            .read(false)
            .write(true)
            .create(true)
            .append(false)
            .open(path)
        else {
            hey!("Failed to get file for config file.");
            return;
        };

        let Ok(data) = serde_json::to_string_pretty(&Self::default()) else {
            hey!("Failed to serialize config data.");
            return;
        };

        if let Err(e) = write!(file, "{}", data) {
            hey!("Failed to write to file for config: {}", e);
        }
    }

    pub fn menu_timeout(&self) -> Duration {
        Duration::from_secs(self.menu_timeout_secs)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

/// Application credentials for the Twitch API, read from the environment.
#[derive(Debug, Clone)]
pub struct TwitchCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl TwitchCredentials {
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("TWITCH_CLIENT_ID").ok()?;
        let client_secret = std::env::var("TWITCH_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_generated_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let cfg = ConfigSettings::get_from(&path);
        assert_eq!(cfg, ConfigSettings::default());
        assert!(path.exists());

        // the generated file reads back the same
        assert_eq!(ConfigSettings::get_from(&path), ConfigSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"owner_ids":[42],"poll_interval_secs":5}"#).unwrap();

        let cfg = ConfigSettings::get_from(&path);
        assert_eq!(cfg.owner_ids, vec![42]);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.menu_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.prompt_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(ConfigSettings::get_from(&path), ConfigSettings::default());
    }
}
