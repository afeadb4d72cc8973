use adw::Application;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Process-wide configuration: which messaging endpoint to talk to and which
/// user this session acts as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub profiles_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            user_id: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            profiles_path: None,
        }
    }
}

impl Settings {
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("elite.toml"))
    }

    /// Config file, then `ELITE_ENDPOINT` / `ELITE_USER_ID` on top. A broken
    /// file is logged and ignored.
    pub fn load() -> Self {
        let mut settings = Self::toml_path()
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(text) => match Self::from_toml(&text) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        log::warn!("Ignoring {}: {e}", path.display());
                        None
                    }
                },
                Err(_) => {
                    log::info!("No config at {}; using defaults", path.display());
                    None
                }
            })
            .unwrap_or_default();
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("ELITE_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = lookup("ELITE_USER_ID") {
            match raw.trim().parse::<i64>() {
                Ok(id) => self.user_id = Some(id),
                Err(_) => log::warn!("ELITE_USER_ID is not a number: {raw:?}"),
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::toml_path().ok_or(ConfigError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        !self.endpoint.trim().is_empty() && self.user_id.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build settings from the setup form's raw text.
    pub fn from_form(endpoint: &str, user_id: &str, base: &Settings) -> Result<Self, ConfigError> {
        let endpoint = crate::utils::normalize_url(endpoint);
        url::Url::parse(&endpoint)
            .map_err(|e| ConfigError::Invalid(format!("Endpoint URL is invalid: {e}")))?;
        let user_id = user_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid("User id must be a number".into()))?;
        Ok(Self {
            endpoint,
            user_id: Some(user_id),
            ..base.clone()
        })
    }
}

pub fn build_ui(app: &Application) {
    let settings = Settings::load();
    if settings.is_complete() {
        crate::ui::main_window::show_main_window(app, settings);
    } else {
        crate::ui::setup::show_setup_window(app, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let s = Settings::from_toml(
            r#"
            endpoint = "https://functions.example.dev/messages"
            user_id = 1
            request_timeout_secs = 30
            profiles_path = "/tmp/profiles.json"
            "#,
        )
        .unwrap();
        assert_eq!(s.user_id, Some(1));
        assert_eq!(s.request_timeout(), Duration::from_secs(30));
        assert!(s.is_complete());
    }

    #[test]
    fn empty_config_is_incomplete() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
        assert!(!s.is_complete());
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(Settings::from_toml("user_id = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut s = Settings::default();
        s.apply_env(|key| match key {
            "ELITE_ENDPOINT" => Some(" https://other.example/api ".into()),
            "ELITE_USER_ID" => Some("42".into()),
            _ => None,
        });
        assert_eq!(s.endpoint, "https://other.example/api");
        assert_eq!(s.user_id, Some(42));

        s.apply_env(|key| (key == "ELITE_USER_ID").then(|| "abc".to_string()));
        assert_eq!(s.user_id, Some(42));
    }

    #[test]
    fn form_input_is_validated() {
        let base = Settings::default();
        let s = Settings::from_form("functions.example.dev/messages", " 3 ", &base).unwrap();
        assert_eq!(s.endpoint, "https://functions.example.dev/messages");
        assert_eq!(s.user_id, Some(3));
        assert!(matches!(
            Settings::from_form("https://x.dev", "me", &base),
            Err(ConfigError::Invalid(_))
        ));
    }
}
