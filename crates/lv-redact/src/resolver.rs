//! Path-sensitive classification of document keys.
//!
//! The same key means different things at different depths: `from` is a
//! collection name under `$lookup` and user data anywhere else. Resolution
//! therefore looks at the whole key path, walking the taxonomy from the
//! nearest recognized keyword.

use crate::classification::OperatorClassification;
use crate::taxonomy::{
    Language, OperatorNode, OperatorTable, CORE_OPERATORS, OPERATOR_MAP_DEFS, SEARCH_OPERATORS,
    SEARCH_AGGREGATION_OPERATORS,
};

/// Outcome of resolving one key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// How the value at the path is treated.
    pub classification: OperatorClassification,
    /// Whether the final key was recognized by the taxonomy. Unrecognized
    /// keys are user field names and get hashed in eager mode.
    pub found: bool,
}

impl Resolution {
    /// A path the taxonomy does not know: user data under a user key.
    pub const fn unresolved() -> Self {
        Self {
            classification: OperatorClassification::Redactable,
            found: false,
        }
    }

    pub const fn found(classification: OperatorClassification) -> Self {
        Self {
            classification,
            found: true,
        }
    }
}

/// Where a walk through the taxonomy ended.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Leaf(OperatorClassification),
    Table(&'a OperatorTable),
    /// A user-chosen key inside an operator map (`facets.<name>`).
    MapKey,
}

impl Target<'_> {
    fn into_resolution(self) -> Resolution {
        match self {
            Target::Leaf(class) => Resolution::found(class),
            Target::Table(table) => Resolution::found(table.scalar_classification()),
            Target::MapKey => Resolution::unresolved(),
        }
    }
}

/// Classify the value at `path` in the given language.
pub fn resolve<S: AsRef<str>>(path: &[S], language: Language) -> Resolution {
    if path.is_empty() {
        return Resolution::unresolved();
    }
    match language {
        Language::Core => resolve_core(path),
        Language::Search => resolve_search(path),
    }
    .map(Target::into_resolution)
    .unwrap_or_else(Resolution::unresolved)
}

/// The keyword table describing the sub-keys of the document at `path`, if
/// the taxonomy has one. Used to evaluate a search clause as a whole.
pub fn resolve_table<S: AsRef<str>>(path: &[S], language: Language) -> Option<&'static OperatorTable> {
    if path.is_empty() {
        return None;
    }
    let target = match language {
        Language::Core => resolve_core(path),
        Language::Search => resolve_search(path),
    };
    match target {
        Some(Target::Table(table)) => Some(table),
        _ => None,
    }
}

fn resolve_core<S: AsRef<str>>(path: &[S]) -> Option<Target<'static>> {
    // The nearest enclosing keyword decides; the final segment is tried first.
    let start = path
        .iter()
        .rposition(|segment| CORE_OPERATORS.contains(segment.as_ref()))?;
    walk(&CORE_OPERATORS, &CORE_OPERATORS, &path[start..], Language::Core)
}

fn resolve_search<S: AsRef<str>>(path: &[S]) -> Option<Target<'static>> {
    walk(
        &SEARCH_AGGREGATION_OPERATORS,
        &SEARCH_OPERATORS,
        path,
        Language::Search,
    )
    .or_else(|| {
        let last = path.last()?.as_ref();
        match SEARCH_OPERATORS.get(last)? {
            OperatorNode::Leaf(class) => Some(Target::Leaf(*class)),
            OperatorNode::Table(table) => Some(Target::Table(table)),
        }
    })
}

fn walk<'a, S: AsRef<str>>(
    table: &'a OperatorTable,
    base: &'a OperatorTable,
    path: &[S],
    language: Language,
) -> Option<Target<'a>> {
    let (first, rest) = path.split_first()?;
    let node = table.get(first.as_ref())?;

    if rest.is_empty() {
        return Some(match node {
            OperatorNode::Leaf(class) => Target::Leaf(*class),
            OperatorNode::Table(t) => Target::Table(t),
        });
    }

    match node {
        OperatorNode::Table(t) => walk(t, base, rest, language),
        OperatorNode::Leaf(OperatorClassification::Exempt) => {
            Some(Target::Leaf(OperatorClassification::Exempt))
        }
        OperatorNode::Leaf(OperatorClassification::OperatorArray) => {
            walk(base, base, rest, language)
        }
        OperatorNode::Leaf(OperatorClassification::OperatorMap) => {
            let side = OPERATOR_MAP_DEFS.get(first.as_ref())?;
            let (_user_key, inner) = rest.split_first()?;
            if inner.is_empty() {
                Some(Target::MapKey)
            } else {
                walk(side, base, inner, language)
            }
        }
        OperatorNode::Leaf(OperatorClassification::Redactable) if language == Language::Search => {
            walk(base, base, rest, language)
        }
        OperatorNode::Leaf(OperatorClassification::FieldName) if language == Language::Search => {
            search_path_option(rest)
        }
        OperatorNode::Leaf(_) => None,
    }
}

/// Keys of the object form of a search `path`:
/// `{"value": "title", "multi": "english"}` or `{"wildcard": "title.*"}`.
fn search_path_option<'a, S: AsRef<str>>(rest: &[S]) -> Option<Target<'a>> {
    match rest {
        [key] => match key.as_ref() {
            "value" | "wildcard" => Some(Target::Leaf(OperatorClassification::FieldName)),
            "multi" => Some(Target::Leaf(OperatorClassification::Exempt)),
            _ => None,
        },
        _ => None,
    }
}
