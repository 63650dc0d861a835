//! Classification of query-language keywords for redaction decisions.

use serde::{Deserialize, Serialize};

/// How the value under a recognized keyword is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorClassification {
    /// User data: scalars go through the scalar policy.
    Redactable,
    /// Structural value that is copied verbatim, including any subtree.
    Exempt,
    /// The value names a field (`"$amount"`, `"items.tags"`); it is never
    /// substituted, only hashed in eager mode.
    FieldName,
    /// The value names a database or collection.
    Namespace,
    /// The value is an aggregation pipeline (or a map of named pipelines).
    Pipeline,
    /// The value is an array of clauses shaped like the enclosing language.
    OperatorArray,
    /// The value is a document whose keys are user-chosen names.
    OperatorMap,
}

impl OperatorClassification {
    /// Returns true if nothing below this keyword is ever rewritten.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperatorClassification::Exempt)
    }
}
