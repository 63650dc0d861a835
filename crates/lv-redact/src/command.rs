//! Command-level dispatch.
//!
//! A logged command mixes query-language documents (`filter`, `pipeline`,
//! `updates`) with plain options (`batchSize`, `lsid`, `$db`). Only the
//! former go through the transformer; everything else is copied verbatim.

use crate::transform::Transformer;
use serde_json::{Map, Value};

/// Command fields holding a filter or update document.
const QUERY_FIELDS: &[&str] = &["filter", "query", "q", "let"];

/// Command fields holding a key pattern (`{"age": -1}`).
const KEY_PATTERN_FIELDS: &[&str] = &["sort", "hint"];

/// Command fields holding a projection.
const PROJECTION_FIELDS: &[&str] = &["projection", "fields"];

/// Command fields holding a list of documents.
const DOCUMENT_LIST_FIELDS: &[&str] = &["documents", "arrayFilters"];

/// Command fields holding a list of statements (`update`/`delete` batches).
const STATEMENT_FIELDS: &[&str] = &["updates", "deletes"];

impl<'a> Transformer<'a> {
    /// Transform a logged command document.
    pub fn transform_command(&self, command: &Map<String, Value>) -> Map<String, Value> {
        let is_distinct = command.contains_key("distinct");
        command
            .iter()
            .map(|(key, value)| {
                let out = match value {
                    Value::String(name) if is_distinct && key == "key" => {
                        Value::String(self.field_name(name))
                    }
                    _ => self.command_field(key, value),
                };
                (key.clone(), out)
            })
            .collect()
    }

    fn command_field(&self, key: &str, value: &Value) -> Value {
        match value {
            Value::Object(doc) if QUERY_FIELDS.contains(&key) => {
                Value::Object(self.transform_query(doc))
            }
            // `update` is a collection name in the update command, an update
            // document in findAndModify and a pipeline in either when
            // pipeline-style updates are used.
            Value::Object(doc) if key == "u" || key == "update" => {
                Value::Object(self.transform_query(doc))
            }
            Value::Array(stages) if key == "u" || key == "update" || key == "pipeline" => {
                Value::Array(self.transform_pipeline(stages))
            }
            Value::Object(doc) if KEY_PATTERN_FIELDS.contains(&key) => {
                Value::Object(self.transform_key_pattern(doc))
            }
            Value::Object(doc) if PROJECTION_FIELDS.contains(&key) => {
                Value::Object(self.transform_projection(doc))
            }
            Value::Array(docs) if DOCUMENT_LIST_FIELDS.contains(&key) => Value::Array(
                docs.iter()
                    .map(|doc| match doc {
                        Value::Object(doc) => Value::Object(self.transform_query(doc)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            Value::Array(statements) if STATEMENT_FIELDS.contains(&key) => Value::Array(
                statements
                    .iter()
                    .map(|statement| match statement {
                        Value::Object(statement) => Value::Object(self.transform_command(statement)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
