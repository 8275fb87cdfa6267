#![no_main]

use libfuzzer_sys::fuzz_target;
use oas_jsonschema_core::{DereferencePass, LocalRefResolver};

// Arbitrary documents through the local resolver: errors are fine, panics
// and unbounded recursion on reference cycles are not.
fuzz_target!(|data: &[u8]| {
    if let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = LocalRefResolver.run(&document);
    }
});
