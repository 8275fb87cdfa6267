#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes, parsed as JSON, fed to the normalizer. No input may panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(schema) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = oas_jsonschema_core::to_json_schema(&schema, &Default::default());
    }
});
