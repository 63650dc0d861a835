//! Substitution rules for leaf values.

use crate::classification::OperatorClassification;
use crate::config::RedactionConfig;
use crate::encrypt::Encryptor;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement for `$date` values.
pub const REDACTED_ISO_DATE: &str = "1970-01-01T00:00:00.000Z";

/// Replacement for `$oid` values and ObjectId-shaped strings.
pub const REDACTED_OBJECT_ID: &str = "000000000000000000000000";

/// Replacement for email addresses.
pub const REDACTED_EMAIL: &str = "redacted@redacted.com";

/// Replacement for client endpoints.
pub const REDACTED_ENDPOINT: &str = "255.255.255.255:65535";

/// Extended JSON wrappers that carry a number as a string.
const NUMBER_WRAPPERS: &[&str] = &["$numberLong", "$numberInt", "$numberDouble", "$numberDecimal"];

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%\&'*+/=?^_`{|}\~\-]+@[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Returns true if `s` is shaped like an email address.
pub fn looks_like_email(s: &str) -> bool {
    (3..=254).contains(&s.len()) && RE_EMAIL.is_match(s)
}

/// Returns true if `s` is 24 hex digits, the text form of an ObjectId.
pub fn looks_like_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// What the transformer knows about a leaf when handing it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarScope {
    pub classification: OperatorClassification,
    /// False when a field-exemption pattern is configured and this leaf does
    /// not belong to a matching field.
    pub selected: bool,
}

impl ScalarScope {
    pub fn new(classification: OperatorClassification) -> Self {
        Self {
            classification,
            selected: true,
        }
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// Applies the configured substitutions to one leaf value.
pub struct ScalarPolicy<'a> {
    config: &'a RedactionConfig,
    encryptor: Option<&'a dyn Encryptor>,
}

impl<'a> ScalarPolicy<'a> {
    pub fn new(config: &'a RedactionConfig, encryptor: Option<&'a dyn Encryptor>) -> Self {
        Self { config, encryptor }
    }

    /// Substitute `value`, found at `path`.
    pub fn redact<S: AsRef<str>>(&self, path: &[S], value: &Value, scope: ScalarScope) -> Value {
        if scope.classification.is_terminal() || !scope.selected {
            return value.clone();
        }

        let last = path.last().map(|s| s.as_ref());
        match (last, value) {
            (_, Value::Null) => return Value::Null,
            // Canonical form nests the millis: `{"$date": {"$numberLong": ".."}}`.
            (Some("$date"), Value::String(_) | Value::Number(_) | Value::Object(_)) => {
                return self.encrypt_or(value, REDACTED_ISO_DATE);
            }
            (Some("$oid"), Value::String(_)) => {
                return self.encrypt_or(value, REDACTED_OBJECT_ID);
            }
            (Some(wrapper), Value::String(_)) if NUMBER_WRAPPERS.contains(&wrapper) => {
                return if self.config.redact_numbers {
                    Value::String("0".to_string())
                } else {
                    value.clone()
                };
            }
            _ => {}
        }

        match value {
            Value::String(s) if looks_like_email(s) => Value::String(REDACTED_EMAIL.to_string()),
            Value::String(s) if looks_like_object_id(s) => {
                Value::String(REDACTED_OBJECT_ID.to_string())
            }
            Value::String(_) => self.encrypt_or(value, &self.config.placeholder),
            Value::Number(_) if self.config.redact_numbers => Value::from(0),
            Value::Bool(_) if self.config.redact_booleans => Value::Bool(false),
            Value::Number(_) | Value::Bool(_) | Value::Null => value.clone(),
            Value::Array(_) | Value::Object(_) => Value::String(self.config.placeholder.clone()),
        }
    }

    /// Encrypted form of `value` when encryption is on, else `fallback`.
    ///
    /// A value that fails to encrypt is replaced by `fallback`, never
    /// passed through.
    fn encrypt_or(&self, value: &Value, fallback: &str) -> Value {
        let Some(encryptor) = self.encryptor else {
            return Value::String(fallback.to_string());
        };
        let plaintext = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match encryptor.encrypt_to_base64(&plaintext) {
            Ok(encoded) => Value::String(encoded),
            Err(e) => {
                tracing::warn!(error = %e, "value encryption failed; using placeholder");
                Value::String(fallback.to_string())
            }
        }
    }
}
