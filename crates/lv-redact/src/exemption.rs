//! Allowlist redaction: only fields matching a pattern are redacted.

use crate::error::{RedactionError, Result};
use crate::taxonomy::{Language, OperatorTable};
use regex::Regex;
use serde_json::Value;

/// Compiled field-exemption pattern.
#[derive(Debug, Clone)]
pub struct FieldExemption {
    pattern: Regex,
}

/// Decision for one search clause.
#[derive(Debug, Clone)]
pub enum ClauseSelection {
    /// The clause's field matched: its values are redacted.
    Selected,
    /// The clause's field did not match: its values are kept, using this
    /// override of the clause table.
    Exempted(OperatorTable),
}

impl FieldExemption {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| RedactionError::PatternError(format!("invalid field regex: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether the value at `path` belongs to a matching field.
    ///
    /// In the core language the field name is spread over the path, so any
    /// non-operator segment (or dotted piece of one) may match, as may the
    /// dotted join of all of them. Search paths are made of clause keywords,
    /// which never select anything on their own.
    pub fn matches_path<S: AsRef<str>>(&self, path: &[S], language: Language) -> bool {
        if language == Language::Search {
            return false;
        }
        let fields: Vec<&str> = path
            .iter()
            .map(|segment| segment.as_ref())
            .filter(|segment| !segment.starts_with('$'))
            .collect();
        if fields.is_empty() {
            return false;
        }
        let any_segment = fields.iter().any(|segment| {
            self.pattern.is_match(segment) || segment.split('.').any(|p| self.pattern.is_match(p))
        });
        any_segment || self.pattern.is_match(&fields.join("."))
    }

    /// Whether a field-name value (`"title"`, `["a", "b"]`,
    /// `{"value": "title"}`) names a matching field.
    pub fn matches_field_value(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => {
                self.pattern.is_match(s) || s.split('.').any(|p| self.pattern.is_match(p))
            }
            Value::Array(items) => items.iter().any(|item| self.matches_field_value(item)),
            Value::Object(map) => map.values().any(|item| self.matches_field_value(item)),
            Value::Null | Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Decide how a search clause is redacted.
    ///
    /// Returns `None` when the clause table does not pair a field with
    /// values, or the clause does not carry its field; the regular path rules
    /// apply then.
    pub fn select_clause(
        &self,
        table: &OperatorTable,
        clause: &serde_json::Map<String, Value>,
    ) -> Option<ClauseSelection> {
        if !table.pairs_field_with_values() {
            return None;
        }
        let mut field_values = table
            .field_name_keys()
            .filter_map(|key| clause.get(key))
            .peekable();
        field_values.peek()?;
        if field_values.any(|value| self.matches_field_value(value)) {
            Some(ClauseSelection::Selected)
        } else {
            Some(ClauseSelection::Exempted(table.exempting_values()))
        }
    }
}
