#![no_main]

use libfuzzer_sys::fuzz_target;
use shapeshift_errors::{Options, Value, normalize_with};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let options = Options::default();
    let err = normalize_with(&Value::from(json), &options);

    assert!(!err.name().is_empty());
    let text = err.to_text_with(&options);
    assert!(text.starts_with(&err.header()));
    let _ = err.to_structured_with(&options);
});
