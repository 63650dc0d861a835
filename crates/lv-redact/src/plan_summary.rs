//! Index names in plan summaries.
//!
//! `"IXSCAN { foo: 1, bar.baz: -1 }"` lists the index keys in plain text. In
//! eager mode they are replaced with the same pseudonyms used for the
//! command's field names.

use crate::hash::FieldNameHasher;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

static RE_IXSCAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(IXSCAN\s*\{)([^}]*)(\})").unwrap());

/// Sorted, unique field segments named by every `IXSCAN { ... }` fragment.
pub fn plan_summary_fields(summary: &str) -> Vec<String> {
    let mut fields = BTreeSet::new();
    for caps in RE_IXSCAN.captures_iter(summary) {
        for pair in caps[2].split(',') {
            let key = pair.split(':').next().unwrap_or_default().trim();
            if key.is_empty() {
                continue;
            }
            fields.extend(key.split('.').map(str::to_string));
        }
    }
    fields.into_iter().collect()
}

/// Replace each index key with its pseudonym, keeping the surrounding text
/// and spacing.
pub fn rewrite_plan_summary(summary: &str, hasher: &FieldNameHasher) -> String {
    RE_IXSCAN
        .replace_all(summary, |caps: &Captures| {
            let body = caps[2]
                .split(',')
                .map(|pair| rewrite_pair(pair, hasher))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}{}{}", &caps[1], body, &caps[3])
        })
        .into_owned()
}

fn rewrite_pair(pair: &str, hasher: &FieldNameHasher) -> String {
    let Some((key, rest)) = pair.split_once(':') else {
        return pair.to_string();
    };
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return pair.to_string();
    }
    let lead = &key[..key.len() - key.trim_start().len()];
    let trail = &key[key.trim_end().len()..];
    format!("{}{}{}:{}", lead, hasher.hash(trimmed), trail, rest)
}
