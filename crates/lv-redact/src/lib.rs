//! Redaction engine for MongoDB structured server logs.
//!
//! Each log line is a JSON document. Lines carrying commands (slow queries,
//! command and query logs) hold filters, updates, aggregation pipelines and
//! Atlas Search clauses whose values are user data. This crate rewrites those
//! documents so that values are replaced while the query shape survives.
//!
//! # Key Features
//!
//! - **Path-sensitive classification**: a static taxonomy of query, stage and
//!   search keywords decides, per key path, whether a value is data, a field
//!   name, a collection name, a nested pipeline or a structural option.
//! - **Field-name pseudonyms**: in eager mode user field names, field
//!   references and plan-summary index keys are replaced with stable
//!   SHA-256 based pseudonyms.
//! - **Allowlist mode**: with a field regex only matching fields are
//!   redacted.
//! - **Deterministic encryption**: redacted strings can be replaced with
//!   AES-SIV ciphertext and recovered later with the key.
//!
//! # Example
//!
//! ```no_run
//! use lv_redact::{RedactionConfig, RedactionEngine};
//!
//! let engine = RedactionEngine::new(RedactionConfig::default()).unwrap();
//! let line = r#"{"c":"COMMAND","msg":"Slow query","attr":{"command":{"find":"users","filter":{"name":"alice"}}}}"#;
//! let out = engine.redact_line(line).unwrap();
//! assert!(!out.contains("alice"));
//! ```

pub mod classification;
pub mod command;
pub mod config;
pub mod encrypt;
pub mod engine;
pub mod entry;
pub mod error;
pub mod exemption;
pub mod hash;
pub mod namespace;
pub mod plan_summary;
pub mod resolver;
pub mod scalar;
pub mod taxonomy;
pub mod transform;

pub use classification::OperatorClassification;
pub use config::{RedactionConfig, DEFAULT_PLACEHOLDER};
pub use encrypt::{AesSivEncryptor, EncryptionKey, Encryptor, KEY_BYTES};
pub use engine::RedactionEngine;
pub use entry::{EntryShape, LogEntry};
pub use error::{RedactionError, Result};
pub use exemption::FieldExemption;
pub use hash::{FieldNameHasher, FieldNameMapping};
pub use plan_summary::{plan_summary_fields, rewrite_plan_summary};
pub use resolver::{resolve, Resolution};
pub use taxonomy::Language;
pub use transform::Transformer;
