//! # humility-settings
//!
//! Layered configuration for the humility chat.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`HumilitySettings::default()`]
//! 2. **User file**: `~/.humility/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `HUMILITY_*` overrides (highest priority)
//!
//! The API credential is resolved separately by [`resolve_api_key`]: the
//! `OPENAI_API_KEY` environment variable first, then `apiKey` in the same
//! settings file. A missing credential is fatal.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, load_with_env, resolve_api_key,
    settings_path, API_KEY_ENV,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = HumilitySettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chat.model, "gpt-3.5-turbo");
        assert_eq!(settings.analysis.model, "gpt-3.5-turbo");
        assert_eq!(settings.api.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn re_exports_work() {
        let merged = deep_merge(serde_json::json!({"x": 1}), serde_json::json!({"y": 2}));
        assert_eq!(merged["x"], 1);
        assert!(settings_path().ends_with(".humility/settings.json"));
    }
}
