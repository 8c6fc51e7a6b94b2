use thiserror::Error;
use url::Url;

use crate::ChatConfig;

/// Values entered in the settings panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsForm {
    pub base_api_url: String,
    pub streaming_enabled: bool,
    pub use_websocket: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Base API URL must not be empty")]
    EmptyBaseUrl,
    #[error("Base API URL must be an http(s) URL: {0}")]
    InvalidBaseUrl(String),
}

impl SettingsForm {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            base_api_url: config.base_api_url.clone(),
            streaming_enabled: config.streaming_enabled,
            use_websocket: config.use_websocket,
        }
    }

    /// Validates the form and applies it on top of `config`.
    pub fn apply_to(&self, config: &ChatConfig) -> Result<ChatConfig, ValidationError> {
        let base_api_url = self.base_api_url.trim();
        if base_api_url.is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        match Url::parse(base_api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ValidationError::InvalidBaseUrl(base_api_url.to_string())),
        }

        Ok(ChatConfig {
            base_api_url: base_api_url.to_string(),
            streaming_enabled: self.streaming_enabled,
            use_websocket: self.use_websocket,
            ..config.clone()
        })
    }
}
