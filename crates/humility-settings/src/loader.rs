//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HumilitySettings::default()`]
//! 2. If `~/.humility/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use humility_core::security::ApiKey;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::HumilitySettings;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Resolve the path to the settings file (`~/.humility/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".humility").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HumilitySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or out-of-range values are errors.
pub fn load_settings_from_path(path: &Path) -> Result<HumilitySettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings_from_path`] with an injectable environment.
pub fn load_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<HumilitySettings> {
    let defaults = serde_json::to_value(HumilitySettings::default())?;

    let merged = match read_user_file(path)? {
        Some(user) => {
            reject_fixed_keys(&user)?;
            deep_merge(defaults, user)
        }
        None => defaults,
    };

    let mut settings: HumilitySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

fn read_user_file(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        debug!(?path, "settings file not found, using defaults");
        return Ok(None);
    }
    debug!(?path, "loading settings from file");
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Values the session engine fixes; a settings file may not set them.
const FIXED_KEYS: [(&str, &str); 3] = [
    ("chat", "temperature"),
    ("analysis", "temperature"),
    ("session", "analysisThreshold"),
];

fn reject_fixed_keys(user: &Value) -> Result<()> {
    for (section, key) in FIXED_KEYS {
        if user.get(section).and_then(|s| s.get(key)).is_some_and(|v| !v.is_null()) {
            return Err(SettingsError::InvalidValue(format!(
                "{section}.{key} is fixed and cannot be configured"
            )));
        }
    }
    Ok(())
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `HUMILITY_*` overrides. Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut HumilitySettings, env: impl Fn(&str) -> Option<String>) {
    let read_string = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read_string("HUMILITY_MODEL") {
        settings.chat.model = v;
    }
    if let Some(v) = read_string("HUMILITY_ANALYSIS_MODEL") {
        settings.analysis.model = v;
    }
    if let Some(v) = read_string("HUMILITY_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_string("HUMILITY_TIMEOUT_SECS") {
        match parse_u64_range(&v, 1, 3600) {
            Some(secs) => settings.api.request_timeout_secs = secs,
            None => tracing::warn!(key = "HUMILITY_TIMEOUT_SECS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = read_string("HUMILITY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_string("HUMILITY_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => tracing::warn!(key = "HUMILITY_LOG_JSON", value = %v, "invalid boolean env var, ignoring"),
        }
    }
}

/// The only field read from the settings file that is not part of [`HumilitySettings`].
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredSecrets {
    api_key: Option<SecretString>,
}

/// Find the API credential: `OPENAI_API_KEY` first, then `apiKey` in the settings file.
///
/// Fails with [`SettingsError::MissingCredential`] when neither yields a non-blank key.
pub fn resolve_api_key(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<ApiKey> {
    if let Some(key) = env(API_KEY_ENV).map(ApiKey::new).filter(|k| !k.is_blank()) {
        debug!(source = "env", "API credential resolved");
        return Ok(key);
    }

    if let Some(user) = read_user_file(path)? {
        let stored: StoredSecrets = serde_json::from_value(user)?;
        if let Some(key) = stored.api_key.map(ApiKey).filter(|k| !k.is_blank()) {
            debug!(source = "settings_file", "API credential resolved");
            return Ok(key);
        }
    }

    Err(SettingsError::MissingCredential {
        env_var: API_KEY_ENV,
        file: path.display().to_string(),
    })
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
