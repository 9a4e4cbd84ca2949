#![no_main]

use libfuzzer_sys::fuzz_target;
use shapeshift_errors::{Object, Options, Value, normalize_with};

// First byte picks the ceiling, the rest shapes a nested cause/errors chain.
fuzz_target!(|data: &[u8]| {
    let Some((&ceiling, shape)) = data.split_first() else {
        return;
    };
    let Ok(options) = Options::builder().max_depth(i64::from(ceiling % 32) + 1).build() else {
        return;
    };

    let mut current = Value::from("leaf");
    for (idx, byte) in shape.iter().take(256).enumerate() {
        let node = Object::new().with("message", format!("n{idx}"));
        match byte % 3 {
            0 => node.set("cause", current),
            1 => node.set("errors", Object::array([current])),
            _ => node.set("errors", Object::new().with("k", current)),
        }
        current = node.into();
    }

    let err = normalize_with(&current, &options);
    let _ = err.to_text_with(&options);
    let _ = err.to_structured_with(&options);
});
