//! Recursive document transformer.
//!
//! Walks a command sub-document key by key, resolves each key path against
//! the taxonomy and rebuilds the document with values substituted and, in
//! eager mode, user field names hashed. Input documents are never modified
//! and key order is kept at every depth.

use crate::classification::OperatorClassification;
use crate::config::RedactionConfig;
use crate::encrypt::Encryptor;
use crate::exemption::{ClauseSelection, FieldExemption};
use crate::hash::FieldNameHasher;
use crate::resolver::{resolve, resolve_table, Resolution};
use crate::scalar::{ScalarPolicy, ScalarScope};
use crate::taxonomy::{is_operator_keyword, is_search_stage, Language, OperatorNode, OperatorTable};
use serde_json::{Map, Value};

/// Stages whose direct numeric and boolean values are structural flags
/// (`{"$project": {"name": 1}}`, `{"$sort": {"age": -1}}`).
const FLAG_STAGES: &[&str] = &["$project", "$addFields", "$sort"];

/// Projection operators whose numeric argument is a flag, not data.
const PROJECTION_FLAG_OPERATORS: &[&str] = &["$slice"];

/// Per-subtree state carried down the walk.
#[derive(Debug, Clone, Copy)]
struct Scope {
    language: Language,
    /// A search clause above this point named a field matching the
    /// exemption pattern.
    clause_selected: bool,
}

impl Scope {
    const fn core() -> Self {
        Self {
            language: Language::Core,
            clause_selected: false,
        }
    }

    const fn search() -> Self {
        Self {
            language: Language::Search,
            clause_selected: false,
        }
    }
}

/// Rewrites query-language documents for one log entry.
pub struct Transformer<'a> {
    config: &'a RedactionConfig,
    hasher: &'a FieldNameHasher,
    scalars: ScalarPolicy<'a>,
    exemption: Option<&'a FieldExemption>,
    eager: bool,
}

impl<'a> Transformer<'a> {
    pub fn new(
        config: &'a RedactionConfig,
        hasher: &'a FieldNameHasher,
        encryptor: Option<&'a dyn Encryptor>,
        exemption: Option<&'a FieldExemption>,
    ) -> Self {
        Self {
            config,
            hasher,
            scalars: ScalarPolicy::new(config, encryptor),
            exemption,
            eager: false,
        }
    }

    /// Also hash user field names and field references.
    pub fn with_eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Transform a filter or update document.
    pub fn transform_query(&self, doc: &Map<String, Value>) -> Map<String, Value> {
        self.document(doc, &mut Vec::new(), Scope::core())
    }

    /// Transform aggregation stages. Each stage starts from an empty path in
    /// the core language.
    pub fn transform_pipeline(&self, stages: &[Value]) -> Vec<Value> {
        stages
            .iter()
            .map(|stage| self.value(stage, &mut Vec::new(), Resolution::unresolved(), Scope::core()))
            .collect()
    }

    /// Transform a find-style projection (`{"name": 1, "_id": 0}`).
    pub fn transform_projection(&self, doc: &Map<String, Value>) -> Map<String, Value> {
        self.document(doc, &mut vec!["$project".to_string()], Scope::core())
    }

    /// Transform an index key pattern or sort spec (`{"age": -1}`).
    pub fn transform_key_pattern(&self, doc: &Map<String, Value>) -> Map<String, Value> {
        self.document(doc, &mut vec!["$sort".to_string()], Scope::core())
    }

    /// A field-name value: hashed in eager mode unless it is a keyword.
    pub fn field_name(&self, name: &str) -> String {
        if self.eager && !is_operator_keyword(name) {
            self.hasher.hash(name)
        } else {
            name.to_string()
        }
    }

    /// A database or collection name.
    pub fn namespace(&self, name: &str) -> String {
        if self.config.redact_namespaces {
            self.hasher.hash(name)
        } else {
            name.to_string()
        }
    }

    fn document(
        &self,
        doc: &Map<String, Value>,
        path: &mut Vec<String>,
        scope: Scope,
    ) -> Map<String, Value> {
        let mut scope = scope;
        let mut overlay: Option<OperatorTable> = None;
        if scope.language == Language::Search {
            if let (Some(exemption), Some(table)) =
                (self.exemption, resolve_table(path, Language::Search))
            {
                match exemption.select_clause(table, doc) {
                    Some(ClauseSelection::Selected) => scope.clause_selected = true,
                    Some(ClauseSelection::Exempted(table)) => overlay = Some(table),
                    None => {}
                }
            }
        }

        let mut out = Map::new();
        for (key, value) in doc {
            let child_scope =
                if scope.language == Language::Core && path.is_empty() && is_search_stage(key) {
                    Scope::search()
                } else {
                    scope
                };

            path.push(key.clone());
            let mut resolution = resolve(path, child_scope.language);
            if let Some(OperatorNode::Leaf(class)) = overlay.as_ref().and_then(|t| t.get(key)) {
                resolution = Resolution::found(*class);
            }
            let out_key = self.key(key, resolution);
            let out_value = self.value(value, path, resolution, child_scope);
            path.pop();

            out.insert(out_key, out_value);
        }
        out
    }

    fn key(&self, key: &str, resolution: Resolution) -> String {
        if self.eager && !resolution.found && !key.starts_with('$') && !is_operator_keyword(key) {
            self.hasher.hash(key)
        } else {
            key.to_string()
        }
    }

    fn value(
        &self,
        value: &Value,
        path: &mut Vec<String>,
        resolution: Resolution,
        scope: Scope,
    ) -> Value {
        use OperatorClassification::*;

        let class = resolution.classification;
        if class.is_terminal() {
            return value.clone();
        }

        match value {
            Value::Null => Value::Null,
            Value::Object(_) if path.last().is_some_and(|key| key == "$date") => {
                self.scalar(value, path, resolution, scope)
            }
            Value::Object(doc) => match class {
                Pipeline => Value::Object(self.named_pipelines(doc, path, scope)),
                _ => Value::Object(self.document(doc, path, scope)),
            },
            Value::Array(items) => match class {
                Pipeline => Value::Array(self.transform_pipeline(items)),
                FieldName => Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(name) => Value::String(self.field_name(name)),
                            other => self.value(other, path, resolution, scope),
                        })
                        .collect(),
                ),
                _ => Value::Array(
                    items
                        .iter()
                        .map(|item| self.value(item, path, resolution, scope))
                        .collect(),
                ),
            },
            Value::String(s) => match class {
                FieldName => Value::String(self.field_name(s)),
                Namespace => Value::String(self.namespace(s)),
                // Mode names such as `whenMatched: "merge"`.
                Pipeline | OperatorMap => value.clone(),
                _ if s.starts_with('$') => Value::String(self.field_name(s)),
                _ => self.scalar(value, path, resolution, scope),
            },
            Value::Number(_) | Value::Bool(_) => {
                if is_structural_flag(path) {
                    value.clone()
                } else {
                    self.scalar(value, path, resolution, scope)
                }
            }
        }
    }

    /// `$facet`: arbitrary output names, each holding a pipeline.
    fn named_pipelines(
        &self,
        doc: &Map<String, Value>,
        path: &mut Vec<String>,
        scope: Scope,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, pipeline) in doc {
            let out_key = self.key(name, Resolution::unresolved());
            let out_value = match pipeline {
                Value::Array(stages) => Value::Array(self.transform_pipeline(stages)),
                other => {
                    path.push(name.clone());
                    let v = self.value(other, path, Resolution::unresolved(), scope);
                    path.pop();
                    v
                }
            };
            out.insert(out_key, out_value);
        }
        out
    }

    fn scalar(&self, value: &Value, path: &[String], resolution: Resolution, scope: Scope) -> Value {
        let selected = self.exemption.map_or(true, |exemption| {
            scope.clause_selected || exemption.matches_path(path, scope.language)
        });
        let scalar_scope = ScalarScope::new(resolution.classification).with_selected(selected);
        self.scalars.redact(path, value, scalar_scope)
    }
}

/// A number or boolean directly under a flag stage, or under a `$project`
/// through user keys only (`{"address": {"city": 1}}`, `{"tags": {"$slice": 5}}`).
fn is_structural_flag(path: &[String]) -> bool {
    let Some(stage) = path
        .iter()
        .rposition(|segment| FLAG_STAGES.contains(&segment.as_str()))
    else {
        return false;
    };
    match &path[stage + 1..] {
        [] => false,
        [_] => true,
        below => path[stage] == "$project" && is_projection_flag(below),
    }
}

fn is_projection_flag(below: &[String]) -> bool {
    let Some((last, fields)) = below.split_last() else {
        return false;
    };
    fields.iter().all(|field| !field.starts_with('$'))
        && (!last.starts_with('$') || PROJECTION_FLAG_OPERATORS.contains(&last.as_str()))
}
