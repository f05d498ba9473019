use crate::attachment::AttachmentPolicy;
use crate::errors::{GeminiError, GeminiResult};
use crate::history::HistoryWindow;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I couldn't understand that.";

/// Configuration for a chat session
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub api_base_url: Option<String>,
    pub attachment_policy: Option<AttachmentPolicy>,
    /// Number of most recent turns replayed per request; absent or 0 replays everything
    pub history_window: Option<usize>,
    pub fallback_reply: Option<String>,
    pub log_level: Option<String>,
}

impl ChatConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> GeminiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GeminiError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            GeminiError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> GeminiResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GeminiError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Reads the `GEMINI_*` environment variables
    pub fn from_env() -> GeminiResult<Self> {
        let attachment_policy = match env::var("GEMINI_ATTACHMENT_POLICY") {
            Ok(value) => Some(value.parse()?),
            Err(_) => None,
        };
        let history_window = match env::var("GEMINI_HISTORY_WINDOW") {
            Ok(value) => Some(value.parse::<usize>().map_err(|e| {
                GeminiError::ConfigError(format!(
                    "Invalid GEMINI_HISTORY_WINDOW '{}': {}",
                    value, e
                ))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            api_key: env::var("GEMINI_API_KEY").ok(),
            model_name: env::var("GEMINI_MODEL").ok(),
            api_base_url: env::var("GEMINI_API_BASE_URL").ok(),
            attachment_policy,
            history_window,
            fallback_reply: None,
            log_level: env::var("GEMINI_LOG_LEVEL").ok(),
        })
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            attachment_policy: other.attachment_policy.or(self.attachment_policy),
            history_window: other.history_window.or(self.history_window),
            fallback_reply: other
                .fallback_reply
                .clone()
                .or_else(|| self.fallback_reply.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn attachment_policy(&self) -> AttachmentPolicy {
        self.attachment_policy.unwrap_or_default()
    }

    pub fn history_window(&self) -> HistoryWindow {
        match self.history_window {
            None | Some(0) => HistoryWindow::Unbounded,
            Some(n) => HistoryWindow::LastTurns(n),
        }
    }

    pub fn fallback_reply(&self) -> &str {
        self.fallback_reply
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_REPLY)
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> GeminiResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        GeminiError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> GeminiResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.model_name(), DEFAULT_MODEL);
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.attachment_policy(), AttachmentPolicy::ReuseLatest);
        assert_eq!(config.history_window(), HistoryWindow::Unbounded);
        assert_eq!(config.fallback_reply(), "Sorry, I couldn't understand that.");
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let config = ChatConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ChatConfig {
            api_key: Some("key".to_string()),
            model_name: Some("gemini-1.5-pro".to_string()),
            attachment_policy: Some(AttachmentPolicy::ExplicitOnly),
            history_window: Some(6),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = ChatConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.history_window(), HistoryWindow::LastTurns(6));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "attachment_policy = \"sometimes\"").unwrap();

        let err = ChatConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GeminiError::ConfigError(_)));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = ChatConfig {
            api_key: Some("file-key".to_string()),
            model_name: Some("file-model".to_string()),
            history_window: Some(4),
            ..Default::default()
        };
        let overrides = ChatConfig {
            model_name: Some("cli-model".to_string()),
            ..Default::default()
        };

        let merged = base.merge(&overrides);
        assert_eq!(merged.api_key.as_deref(), Some("file-key"));
        assert_eq!(merged.model_name(), "cli-model");
        assert_eq!(merged.history_window, Some(4));
    }

    #[test]
    fn test_zero_window_is_unbounded() {
        let config = ChatConfig {
            history_window: Some(0),
            ..Default::default()
        };
        assert_eq!(config.history_window(), HistoryWindow::Unbounded);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ChatConfig {
            api_base_url: Some("http://localhost:8080/v1beta/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "http://localhost:8080/v1beta");
    }
}
