//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading settings or resolving the credential.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
    /// No API key in the environment or the settings file.
    #[error("missing API credential: set {env_var} or \"apiKey\" in {file}")]
    MissingCredential { env_var: &'static str, file: String },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
