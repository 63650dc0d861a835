//! Field-name pseudonyms.
//!
//! Field names, collection names and field references are replaced with a
//! stable digest so that the shape of queries survives redaction while the
//! names themselves do not. The same segment always maps to the same
//! pseudonym, which keeps plan summaries, namespaces and commands
//! cross-referenceable.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of digest bytes kept in a pseudonym (16 hex chars).
pub const DIGEST_BYTES: usize = 8;

/// Shared, append-only record of every segment hashed so far.
///
/// Cloning the mapping clones the handle, not the contents, so workers
/// processing different files of one batch agree on every pseudonym.
#[derive(Debug, Clone, Default)]
pub struct FieldNameMapping {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl FieldNameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // Entries are only ever inserted whole, so a poisoned map is still
        // consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pseudonym previously recorded for `segment`.
    pub fn get(&self, segment: &str) -> Option<String> {
        self.lock().get(segment).cloned()
    }

    fn get_or_insert_with(&self, segment: &str, make: impl FnOnce() -> String) -> String {
        let mut map = self.lock();
        if let Some(existing) = map.get(segment) {
            return existing.clone();
        }
        let pseudonym = make();
        map.insert(segment.to_string(), pseudonym.clone());
        pseudonym
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the mapping, for reporting.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Hashes dotted field names segment by segment.
#[derive(Debug, Clone)]
pub struct FieldNameHasher {
    placeholder: String,
    mapping: FieldNameMapping,
}

impl FieldNameHasher {
    /// Create a hasher with its own empty mapping.
    pub fn new(placeholder: &str) -> Self {
        Self::with_mapping(placeholder, FieldNameMapping::new())
    }

    /// Create a hasher that records into an existing mapping.
    pub fn with_mapping(placeholder: &str, mapping: FieldNameMapping) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            mapping,
        }
    }

    pub fn mapping(&self) -> &FieldNameMapping {
        &self.mapping
    }

    /// Pseudonymize a field name, field reference or namespace.
    ///
    /// Leading `$` are stripped, so `"$items.tags"` and `"items.tags"` hash
    /// alike; each dot-separated segment is hashed on its own and the
    /// segments are rejoined with dots.
    pub fn hash(&self, name: &str) -> String {
        name.trim_start_matches('$')
            .split('.')
            .map(|segment| self.hash_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Pseudonymize a single segment without splitting on dots.
    pub fn hash_segment(&self, segment: &str) -> String {
        self.mapping
            .get_or_insert_with(segment, || pseudonym(&self.placeholder, segment))
    }
}

/// `<placeholder>_<first 8 bytes of sha256(segment) as hex>`.
pub fn pseudonym(placeholder: &str, segment: &str) -> String {
    let digest = Sha256::digest(segment.as_bytes());
    format!("{}_{}", placeholder, hex::encode(&digest[..DIGEST_BYTES]))
}
