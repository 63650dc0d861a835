//! Database and collection names.
//!
//! Namespaces appear in three places: the entry's `ns` attribute, the `$db`
//! field of a logged command, and the command verb's value (`{"find":
//! "orders"}`). The verb decides which field holds the collection.

use crate::hash::FieldNameHasher;
use serde_json::{Map, Value};

/// `attr` fields holding a logged command.
pub const COMMAND_FIELDS: &[&str] = &["command", "originatingCommand", "cmd"];

/// Command verbs whose value is the target collection.
const COLLECTION_VERBS: &[&str] = &[
    "find",
    "aggregate",
    "count",
    "distinct",
    "insert",
    "update",
    "delete",
    "findAndModify",
    "findandmodify",
    "create",
    "drop",
    "createIndexes",
    "dropIndexes",
    "listIndexes",
    "collMod",
    "mapReduce",
    "validate",
];

/// `attr` fields holding a full namespace.
const NAMESPACE_FIELDS: &[&str] = &["ns", "namespace"];

/// The command field holding the target collection, if any.
///
/// `getMore` carries a cursor id, with the collection in `collection`.
pub fn collection_field(command: &Map<String, Value>) -> Option<&str> {
    for (key, value) in command {
        if key == "getMore" {
            return match command.get("collection") {
                Some(Value::String(_)) => Some("collection"),
                _ => None,
            };
        }
        if COLLECTION_VERBS.contains(&key.as_str()) && value.is_string() {
            return Some(key.as_str());
        }
    }
    None
}

/// `<$db>.<collection>` of a logged command.
pub fn command_namespace(command: &Map<String, Value>) -> Option<String> {
    let db = command.get("$db")?.as_str()?;
    let field = collection_field(command)?;
    let collection = command.get(field)?.as_str()?;
    Some(format!("{}.{}", db, collection))
}

/// Namespace an entry is about: `attr.ns`, else derived from its command.
pub fn entry_namespace(attr: &Map<String, Value>) -> Option<String> {
    if let Some(Value::String(ns)) = attr.get("ns") {
        return Some(ns.clone());
    }
    COMMAND_FIELDS
        .iter()
        .filter_map(|field| attr.get(*field)?.as_object())
        .find_map(command_namespace)
}

/// Hash every database and collection name in `attr`.
pub fn redact_namespaces(attr: &Map<String, Value>, hasher: &FieldNameHasher) -> Map<String, Value> {
    attr.iter()
        .map(|(key, value)| {
            let out = match value {
                Value::String(ns) if NAMESPACE_FIELDS.contains(&key.as_str()) => {
                    Value::String(hasher.hash(ns))
                }
                Value::Object(command) if COMMAND_FIELDS.contains(&key.as_str()) => {
                    Value::Object(redact_command_namespace(command, hasher))
                }
                _ => value.clone(),
            };
            (key.clone(), out)
        })
        .collect()
}

fn redact_command_namespace(
    command: &Map<String, Value>,
    hasher: &FieldNameHasher,
) -> Map<String, Value> {
    let collection = collection_field(command).map(str::to_string);
    command
        .iter()
        .map(|(key, value)| {
            let out = match value {
                Value::String(name)
                    if key == "$db" || collection.as_deref() == Some(key.as_str()) =>
                {
                    Value::String(hasher.hash(name))
                }
                _ => value.clone(),
            };
            (key.clone(), out)
        })
        .collect()
}
