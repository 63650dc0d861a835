//! Redaction configuration.
//!
//! Every toggle that changes what gets redacted lives here. The config is
//! built once per invocation (from a JSON file, CLI flags, or both), checked
//! with [`RedactionConfig::validate`], and is read-only afterwards.

use crate::encrypt::EncryptionKey;
use crate::error::{RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default replacement for redacted strings.
pub const DEFAULT_PLACEHOLDER: &str = "REDACTED";

/// Redaction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Replacement for redacted strings, also the prefix of pseudonyms.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Replace numbers with 0.
    #[serde(default)]
    pub redact_numbers: bool,

    /// Replace booleans with false.
    #[serde(default)]
    pub redact_booleans: bool,

    /// Replace client endpoints with a fixed address.
    #[serde(default)]
    pub redact_ips: bool,

    /// Namespace prefixes whose entries also get field names hashed.
    #[serde(default)]
    pub eager_namespaces: Vec<String>,

    /// Hash database and collection names.
    #[serde(default)]
    pub redact_namespaces: bool,

    /// Only fields whose names match this pattern are redacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_regex: Option<String>,

    /// Encrypt redacted strings instead of replacing them. Key material is
    /// never part of a config file.
    #[serde(skip)]
    pub encryption_key: Option<EncryptionKey>,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            redact_numbers: false,
            redact_booleans: false,
            redact_ips: false,
            eager_namespaces: Vec::new(),
            redact_namespaces: false,
            field_regex: None,
            encryption_key: None,
        }
    }
}

impl RedactionConfig {
    /// Load config from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse config from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| RedactionError::ConfigError(format!("invalid config: {}", e)))
    }

    /// Save config to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the config for contradictions. Called once before any line is
    /// processed; a bad config never reaches the redaction path.
    pub fn validate(&self) -> Result<()> {
        if self.placeholder.is_empty() {
            return Err(RedactionError::ConfigError(
                "placeholder must not be empty".to_string(),
            ));
        }
        if let Some(pattern) = &self.field_regex {
            if !self.eager_namespaces.is_empty() {
                return Err(RedactionError::ConfigError(
                    "a field-exemption regex cannot be combined with eager namespaces".to_string(),
                ));
            }
            regex::Regex::new(pattern)
                .map_err(|e| RedactionError::PatternError(format!("invalid field regex: {}", e)))?;
        }
        Ok(())
    }

    /// Whether entries of namespace `ns` get eager field-name hashing.
    pub fn is_eager(&self, ns: &str) -> bool {
        self.eager_namespaces
            .iter()
            .any(|prefix| ns.starts_with(prefix.as_str()))
    }

    pub fn encryption_enabled(&self) -> bool {
        self.encryption_key.is_some()
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_redact_numbers(mut self, enabled: bool) -> Self {
        self.redact_numbers = enabled;
        self
    }

    pub fn with_redact_booleans(mut self, enabled: bool) -> Self {
        self.redact_booleans = enabled;
        self
    }

    pub fn with_redact_ips(mut self, enabled: bool) -> Self {
        self.redact_ips = enabled;
        self
    }

    pub fn with_eager_namespace(mut self, prefix: &str) -> Self {
        self.eager_namespaces.push(prefix.to_string());
        self
    }

    pub fn with_redact_namespaces(mut self, enabled: bool) -> Self {
        self.redact_namespaces = enabled;
        self
    }

    pub fn with_field_regex(mut self, pattern: &str) -> Self {
        self.field_regex = Some(pattern.to_string());
        self
    }

    pub fn with_encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}
