//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every section has `#[serde(default)]`
//! so a settings file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Root settings type.
///
/// Sampling temperatures and the assessment threshold are not settings;
/// they are fixed by the session engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HumilitySettings {
    pub api: ApiSettings,
    /// Model for the live chat turns.
    pub chat: ModelSettings,
    /// Model for the humility assessment.
    pub analysis: ModelSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Root of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl HumilitySettings {
    /// Reject values that would produce a broken session.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("api.baseUrl is empty".into()));
        }
        for (name, section) in [("chat", &self.chat), ("analysis", &self.analysis)] {
            if section.model.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!("{name}.model is empty")));
            }
            if section.max_tokens == Some(0) {
                return Err(SettingsError::InvalidValue(format!("{name}.maxTokens must be at least 1")));
            }
        }
        Ok(())
    }
}
