//! Fuzz target for single-line redaction.
//!
//! Any input, under any combination of toggles, must either redact to a
//! JSON object line or be rejected as a line-local error. Never a panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lv_redact::{RedactionConfig, RedactionEngine};

#[derive(Debug, Arbitrary)]
struct Input {
    line: String,
    redact_numbers: bool,
    redact_booleans: bool,
    redact_ips: bool,
    redact_namespaces: bool,
    eager_prefix: Option<String>,
}

fuzz_target!(|input: Input| {
    let mut config = RedactionConfig::default()
        .with_redact_numbers(input.redact_numbers)
        .with_redact_booleans(input.redact_booleans)
        .with_redact_ips(input.redact_ips)
        .with_redact_namespaces(input.redact_namespaces);
    if let Some(prefix) = &input.eager_prefix {
        config = config.with_eager_namespace(prefix);
    }
    let engine = RedactionEngine::new(config).expect("config without a regex is valid");

    match engine.redact_line(&input.line) {
        Ok(out) => {
            let value: serde_json::Value =
                serde_json::from_str(&out).expect("redacted output is JSON");
            assert!(value.is_object());
        }
        Err(err) => assert!(err.is_line_local()),
    }
});
