//! Main redaction engine.
//!
//! The RedactionEngine owns everything a run needs: the validated config,
//! the field-name hasher and its mapping, the compiled exemption pattern and
//! the encryptor. It is built once per invocation and shared by reference,
//! across threads if needed.

use crate::config::RedactionConfig;
use crate::encrypt::{AesSivEncryptor, Encryptor};
use crate::entry::{EntryShape, LogEntry};
use crate::error::Result;
use crate::exemption::FieldExemption;
use crate::hash::{FieldNameHasher, FieldNameMapping};
use crate::namespace::{entry_namespace, redact_namespaces, COMMAND_FIELDS};
use crate::plan_summary::rewrite_plan_summary;
use crate::scalar::REDACTED_ENDPOINT;
use crate::transform::Transformer;
use serde_json::{Map, Value};

/// The main redaction engine.
pub struct RedactionEngine {
    config: RedactionConfig,
    hasher: FieldNameHasher,
    exemption: Option<FieldExemption>,
    encryptor: Option<Box<dyn Encryptor>>,
}

impl std::fmt::Debug for RedactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactionEngine")
            .field("config", &self.config)
            .field("exemption", &self.exemption)
            .field("encryption", &self.encryptor.is_some())
            .finish()
    }
}

impl RedactionEngine {
    /// Create an engine with its own pseudonym mapping.
    ///
    /// Fails if the config does not validate.
    pub fn new(config: RedactionConfig) -> Result<Self> {
        Self::with_mapping(config, FieldNameMapping::new())
    }

    /// Create an engine recording pseudonyms into an existing mapping.
    pub fn with_mapping(config: RedactionConfig, mapping: FieldNameMapping) -> Result<Self> {
        config.validate()?;
        let exemption = config
            .field_regex
            .as_deref()
            .map(FieldExemption::new)
            .transpose()?;
        let encryptor = config
            .encryption_key
            .clone()
            .map(|key| Box::new(AesSivEncryptor::new(key)) as Box<dyn Encryptor>);
        let hasher = FieldNameHasher::with_mapping(&config.placeholder, mapping);

        tracing::debug!(
            eager_namespaces = config.eager_namespaces.len(),
            exemption = exemption.is_some(),
            encryption = encryptor.is_some(),
            "redaction engine ready"
        );

        Ok(Self {
            config,
            hasher,
            exemption,
            encryptor,
        })
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    pub fn hasher(&self) -> &FieldNameHasher {
        &self.hasher
    }

    /// Every pseudonym handed out so far.
    pub fn mapping(&self) -> &FieldNameMapping {
        self.hasher.mapping()
    }

    /// A transformer borrowing this engine's state.
    pub fn transformer(&self, eager: bool) -> Transformer<'_> {
        Transformer::new(
            &self.config,
            &self.hasher,
            self.encryptor.as_deref(),
            self.exemption.as_ref(),
        )
        .with_eager(eager)
    }

    /// Whether an entry about `attr` gets eager field-name hashing.
    fn is_eager(&self, attr: &Map<String, Value>) -> bool {
        if self.config.eager_namespaces.is_empty() {
            return false;
        }
        entry_namespace(attr).map_or(false, |ns| self.config.is_eager(&ns))
    }

    /// Redact one parsed entry. Never fails: anything not understood is
    /// passed through.
    pub fn redact_entry(&self, entry: &LogEntry) -> LogEntry {
        let Some(attr) = entry.attr() else {
            return entry.clone();
        };
        let shape = entry.shape();
        let eager = self.is_eager(attr);
        let transformer = self.transformer(eager);

        let mut out: Map<String, Value> = attr
            .iter()
            .map(|(key, value)| {
                let redacted = match (shape, key.as_str(), value) {
                    (EntryShape::CommandTree, field, Value::Object(command))
                        if COMMAND_FIELDS.contains(&field) =>
                    {
                        Value::Object(transformer.transform_command(command))
                    }
                    (EntryShape::CommandTree, "filter", Value::Object(filter)) => {
                        Value::Object(transformer.transform_query(filter))
                    }
                    (EntryShape::CommandTree, "planSummary", Value::String(summary)) if eager => {
                        Value::String(rewrite_plan_summary(summary, &self.hasher))
                    }
                    (_, "remote", Value::String(endpoint)) => self.endpoint(endpoint),
                    (EntryShape::Authentication, "client", Value::String(endpoint)) => {
                        self.endpoint(endpoint)
                    }
                    _ => value.clone(),
                };
                (key.clone(), redacted)
            })
            .collect();

        if self.config.redact_namespaces {
            out = redact_namespaces(&out, &self.hasher);
        }
        entry.with_attr(out)
    }

    /// Parse, redact and re-serialize one log line.
    pub fn redact_line(&self, line: &str) -> Result<String> {
        let entry = LogEntry::parse(line)?;
        self.redact_entry(&entry).to_line()
    }

    fn endpoint(&self, endpoint: &str) -> Value {
        if self.config.redact_ips && !endpoint.is_empty() {
            Value::String(REDACTED_ENDPOINT.to_string())
        } else {
            Value::String(endpoint.to_string())
        }
    }
}
