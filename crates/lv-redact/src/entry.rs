//! Parsed log entries and their classification.

use crate::error::{RedactionError, Result};
use serde_json::{Map, Value};

/// How an entry's `attr` is redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryShape {
    /// Carries command documents (slow queries, command and query logs).
    CommandTree,
    /// A successful authentication; `attr.client` is an endpoint.
    Authentication,
    /// Nothing shape-specific to redact.
    Passthrough,
}

impl EntryShape {
    pub fn classify(category: Option<&str>, message: Option<&str>) -> Self {
        match (category, message) {
            (Some("COMMAND" | "QUERY"), _) | (_, Some("Slow query")) => EntryShape::CommandTree,
            (Some("ACCESS"), Some("Successfully authenticated")) => EntryShape::Authentication,
            _ => EntryShape::Passthrough,
        }
    }
}

/// One structured log line, held as an order-preserving document.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    fields: Map<String, Value>,
}

impl LogEntry {
    /// Parse a log line. Blank lines and non-object JSON are malformed.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(RedactionError::MalformedLine("blank line".to_string()));
        }
        match serde_json::from_str::<Value>(line)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(RedactionError::MalformedLine(
                "log line is not a JSON object".to_string(),
            )),
        }
    }

    /// Timestamp (`t`), usually `{"$date": "..."}`.
    pub fn timestamp(&self) -> Option<&Value> {
        self.fields.get("t")
    }

    pub fn severity(&self) -> Option<&str> {
        self.str_field("s")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_field("c")
    }

    pub fn id(&self) -> Option<i64> {
        self.fields.get("id")?.as_i64()
    }

    pub fn context(&self) -> Option<&str> {
        self.str_field("ctx")
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("msg")
    }

    /// The `attr` document, if present and a document.
    pub fn attr(&self) -> Option<&Map<String, Value>> {
        self.fields.get("attr")?.as_object()
    }

    pub fn shape(&self) -> EntryShape {
        EntryShape::classify(self.category(), self.message())
    }

    /// Copy of this entry with `attr` replaced, in place.
    pub fn with_attr(&self, attr: Map<String, Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert("attr".to_string(), Value::Object(attr));
        Self { fields }
    }

    /// Serialize back to a single line.
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key)?.as_str()
    }
}
