//! Fuzz target for redaction config parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lv_redact::RedactionConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = RedactionConfig::from_json(text) {
            let _ = config.validate();
        }
    }
});
