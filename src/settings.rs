use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Connection settings for the completion endpoint. The model id is a
/// configuration constant, never user-facing game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".into(),
            api_key: None,
            model: "local-model".into(),
            request_timeout_secs: 60,
        }
    }
}

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("infinite_flow");
    fs::create_dir_all(&path).ok();
    path.push("settings.json");
    path
}

/// Settings file, with `BASE_URL` / `API_KEY` environment overrides on
/// top. A missing or unreadable file just means defaults (a keyless
/// local endpoint is a valid setup); the defaults are written back so
/// there is a file to edit.
pub fn load_settings() -> Settings {
    let loaded: Option<Settings> = fs::read_to_string(settings_path())
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok());

    let mut settings = match loaded {
        Some(settings) => settings,
        None => {
            let defaults = Settings::default();
            save_settings(&defaults);
            defaults
        }
    };

    if let Ok(url) = std::env::var("BASE_URL") {
        if !url.trim().is_empty() {
            settings.base_url = url;
        }
    }
    if let Ok(key) = std::env::var("API_KEY") {
        if !key.trim().is_empty() {
            settings.api_key = Some(key);
        }
    }

    settings
}

pub fn save_settings(settings: &Settings) {
    let path = settings_path();
    if let Ok(json) = serde_json::to_string_pretty(settings) {
        let _ = fs::write(path, json);
    }
}
