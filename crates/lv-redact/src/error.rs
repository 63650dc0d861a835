//! Error types for the redaction engine.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during redaction.
///
/// Messages never carry log content: a failure on a sensitive value must not
/// become a way of leaking it.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// Invalid or contradictory redaction configuration.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Failed to load, decode or generate the encryption key.
    #[error("key error: {0}")]
    KeyError(String),

    /// Failed to compile the field-exemption pattern.
    #[error("pattern error: {0}")]
    PatternError(String),

    /// Encrypting or decrypting a single value failed.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// A log line was not a JSON document.
    #[error("malformed log line: {0}")]
    MalformedLine(String),

    /// I/O error during key or config file operations.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RedactionError {
    /// Whether this error only affects the current line, so processing can
    /// move on to the next one.
    pub fn is_line_local(&self) -> bool {
        matches!(
            self,
            RedactionError::MalformedLine(_) | RedactionError::JsonError(_)
        )
    }
}
