//! Golden output and end-to-end behavior tests.
//!
//! Exact text and JSON renderings are pinned here; any layout change must
//! update these strings deliberately.

use serde_json::json;
use shapeshift_errors::{
    CapturedError, Construction, ErrorClass, MAX_DEPTH_CEILING, MetaValue, NativeHost,
    NormalizedError, Object, Options, OptionsError, SubErrors, Symbol, Value, normalize,
    normalize_with, record, try_catch_async,
};
use std::sync::Arc;

fn opts(max_depth: i64) -> Options {
    Options::builder().max_depth(max_depth).build().unwrap()
}

/// A TypeError with a stack, metadata, a cause and two sub-errors.
fn request_failure() -> Value {
    let root = Object::error(ErrorClass::TypeError, "invalid payload");
    root.set_hidden(
        "stack",
        "TypeError: invalid payload\n    at parse (parser.rs:12:9)\n    at handle (server.rs:40:5)",
    );
    root.set("field", "email");
    root.set("attempts", 3);
    root.set("tags", Object::array(["a", "b"]));
    root.set(
        "cause",
        record! { "name" => "IoError", "message" => "socket closed", "errno" => -104 },
    );
    root.set(
        "errors",
        Object::array([
            Value::from(Object::error(ErrorClass::RangeError, "too long")),
            Value::from("missing @"),
        ]),
    );
    root.into()
}

// ============================================================================
// GOLDEN RENDERINGS
// ============================================================================

#[test]
fn golden_text() {
    let err = normalize_with(&request_failure(), &Options::default());

    let expected = "\
TypeError: invalid payload
    at parse (parser.rs:12:9)
    at handle (server.rs:40:5)
  field: \"email\"
  attempts: 3
  tags: [\"a\", \"b\"]
  [cause] IoError: socket closed
    errno: -104
  [errors] [
    RangeError: too long
    Error: missing @
  ]";
    assert_eq!(err.to_text_with(&Options::default()), expected);
}

#[test]
fn golden_structured() {
    let err = normalize_with(&request_failure(), &Options::default());

    let expected = json!({
        "name": "TypeError",
        "message": "invalid payload",
        "stack": "TypeError: invalid payload\n    at parse (parser.rs:12:9)\n    at handle (server.rs:40:5)",
        "field": "email",
        "attempts": 3,
        "tags": ["a", "b"],
        "cause": { "name": "IoError", "message": "socket closed", "errno": -104 },
        "errors": [
            { "name": "RangeError", "message": "too long" },
            { "name": "Error", "message": "missing @" }
        ]
    });
    assert_eq!(err.to_structured_with(&Options::default()), expected);
    assert_eq!(
        serde_json::to_string(&err).unwrap(),
        serde_json::to_string(&expected).unwrap()
    );
}

#[test]
fn golden_map_mode() {
    let input = record! {
        "message" => "health check failed",
        "errors" => record! {
            "db" => record! { "message" => "timeout", "ms" => 5000 },
            "cache" => "refused",
        },
    };
    let err = normalize_with(&input.into(), &Options::default());

    assert_eq!(
        err.to_text_with(&Options::default()),
        "Error: health check failed\n  [errors] {\n    db: Error: timeout\n      ms: 5000\n    cache: Error: refused\n  }"
    );
    assert_eq!(
        err.to_structured_with(&Options::default())["errors"],
        json!({
            "db": { "name": "Error", "message": "timeout", "ms": 5000 },
            "cache": { "name": "Error", "message": "refused" }
        })
    );
}

#[test]
fn golden_markers() {
    let a = Object::new().with("message", "loop");
    a.set("cause", &a);
    let err = normalize_with(&a.clone().into(), &Options::default());
    a.delete("cause");

    assert_eq!(err.to_text_with(&Options::default()), "Error: loop\n  [cause] Error: [Circular]");
    assert_eq!(
        err.to_structured_with(&Options::default()),
        json!({ "name": "Error", "message": "loop", "cause": { "name": "Error", "message": "[Circular]" } })
    );
}

// ============================================================================
// TESTABLE PROPERTIES
// ============================================================================

#[test]
fn cycle_safety() {
    let a = Object::new();
    a.set("cause", &a);

    let err = normalize_with(&a.clone().into(), &Options::default());
    assert_eq!(err.cause().unwrap().message(), "[Circular]");
    a.delete("cause");
}

#[test]
fn two_node_cycle() {
    let a = Object::new().with("message", "a");
    let b = Object::new().with("message", "b").with("cause", &a);
    a.set("cause", &b);

    let err = normalize_with(&a.clone().into(), &Options::default());
    let messages: Vec<&str> = err.chain().map(NormalizedError::message).collect();
    assert_eq!(messages, ["a", "b", "[Circular]"]);
    a.delete("cause");
}

#[test]
fn depth_exactness() {
    let input = record! {
        "cause" => record! { "cause" => record! { "message" => "deep" } },
    };
    let err = normalize_with(&input.into(), &opts(1));

    let cause = err.cause().unwrap();
    assert_eq!(cause.message(), "[Max depth of 1 reached]");
    assert!(cause.cause().is_none());
}

#[test]
fn array_mode_depth_parity() {
    let input = record! { "errors" => Object::array([record! { "cause" => "x" }]) };
    let err = normalize_with(&input.into(), &opts(1));

    let items = err.errors().and_then(SubErrors::as_list).unwrap();
    assert_eq!(items[0].message(), "[Max depth of 1 reached]");
}

#[test]
fn single_mode_message_override() {
    let input = record! { "message" => "single", "errors" => 42 };
    let err = normalize_with(&input.into(), &Options::default());

    assert_eq!(err.name(), "AggregateError");
    assert_eq!(err.message(), "AggregateError");
    let items = err.errors().and_then(SubErrors::as_list).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(*items[0], normalize_with(&Value::from(42), &Options::default()));
    assert_eq!(items[0].message(), "42");
}

#[test]
fn denylist_enforcement() {
    let input = record! {
        "__proto__" => record! { "isAdmin" => true },
        "constructor" => record! { "name" => "Evil" },
        "safe" => "ok",
    };
    let err = normalize_with(&input.into(), &Options::default());

    let keys: Vec<String> = err.metadata().keys().map(ToString::to_string).collect();
    assert_eq!(keys, ["safe"]);
    assert_eq!(err.metadata().get("safe").and_then(MetaValue::as_str), Some("ok"));

    let structured = err.to_structured_with(&Options::default());
    assert!(structured.get("__proto__").is_none());
    assert!(structured.get("constructor").is_none());
    assert_eq!(structured["safe"], "ok");
}

#[test]
fn rendering_idempotence() {
    let err = normalize_with(&request_failure(), &Options::default());
    assert_eq!(err.to_text(), err.to_text());
    assert_eq!(err.to_structured(), err.to_structured());
}

#[test]
fn default_name_and_message() {
    let err = normalize(&Value::from("oops"));
    assert_eq!(err.name(), "Error");
    assert_eq!(err.message(), "oops");

    let null = normalize(&Value::Null);
    let undefined = normalize(&Value::Undefined);
    assert_eq!(null.message(), "unknown error (null)");
    assert_eq!(undefined.message(), "unknown error (undefined)");
    assert_ne!(null.message(), undefined.message());
}

#[test]
fn hostile_input_never_fails() {
    let input = Object::new();
    input.define_getter("name", || Err(Value::from("no name for you")));
    input.define_getter("message", || Err(Object::error(ErrorClass::TypeError, "denied").into()));
    input.define_getter("cause", || Err(Value::Null));
    input.set("__proto__", &input);
    input.set("visible", 1);

    let err = normalize_with(&input.clone().into(), &Options::default());
    assert_eq!(err.header(), "Error");
    assert_eq!(err.metadata().len(), 1);
    assert_eq!(err.to_text_with(&Options::default()), "Error\n  visible: 1");
    input.delete("__proto__");
}

#[test]
fn symbol_keys_and_values() {
    let key = Symbol::new("requestId");
    let input = record! { "message" => "m", &key => Symbol::new("abc") };

    let err = normalize_with(&input.into(), &Options::default());
    assert_eq!(err.to_text_with(&Options::default()), "Error: m\n  Symbol(requestId): Symbol(abc)");
    assert_eq!(
        err.to_structured_with(&Options::default())["Symbol(requestId)"],
        "Symbol(abc)"
    );
}

// ============================================================================
// DEPTH CEILING
// ============================================================================

fn ceiling() -> Options {
    opts(MAX_DEPTH_CEILING as i64)
}

#[test]
fn cause_chain_at_the_ceiling_fits_the_stack() {
    let mut current = Object::new().with("message", "leaf");
    for level in 0..MAX_DEPTH_CEILING + 50 {
        current = record! {
            "message" => format!("level {level}"),
            "code" => level as u32,
            "cause" => current,
        };
    }

    let options = ceiling();
    let err = normalize_with(&current.into(), &options);
    let chain: Vec<&NormalizedError> = err.chain().collect();
    assert_eq!(chain.len(), MAX_DEPTH_CEILING + 1);
    let marker = format!("[Max depth of {MAX_DEPTH_CEILING} reached]");
    assert_eq!(chain.last().map(|e| e.message()), Some(marker.as_str()));

    let text = err.to_text_with(&options);
    assert_eq!(text.lines().filter(|line| line.contains("[cause]")).count(), MAX_DEPTH_CEILING);
    assert!(err.to_structured_with(&options).is_object());
    assert!(serde_json::to_string(&err).is_ok());
}

#[test]
fn nested_metadata_at_the_ceiling_fits_the_stack() {
    let mut current = Object::new().with("leaf", true);
    for _ in 0..MAX_DEPTH_CEILING + 50 {
        current = Object::new().with("inner", current).with("list", Object::array([1, 2]));
    }

    let options = ceiling();
    let err = normalize_with(&record! { "message" => "deep", "payload" => current }.into(), &options);

    let mut levels = 0;
    let mut value = err.metadata().get("payload");
    while let Some(record) = value.and_then(MetaValue::as_record) {
        levels += 1;
        value = record.get("inner");
    }
    assert_eq!(levels, MAX_DEPTH_CEILING - 1);
    assert_eq!(value, Some(&MetaValue::MaxDepth(MAX_DEPTH_CEILING)));
    assert!(err.to_structured_with(&options)["payload"].is_object());
}

// ============================================================================
// CONSTRUCTION PATHS
// ============================================================================

#[test]
fn custom_subclasses_are_preserved() {
    let host = NativeHost::new().register_class(ErrorClass::custom("ValidationError"));
    let options = Options::builder().host(Arc::new(host)).build().unwrap();

    let input = record! { "name" => "ValidationError", "message" => "email required" };
    let err = normalize_with(&input.into(), &options);
    assert_eq!(err.construction(), Construction::Subclassed);
    assert_eq!(err.class(), &ErrorClass::custom("ValidationError"));
}

#[test]
fn legacy_hosts_fall_back_to_plain_fields() {
    let options = Options::builder().host(Arc::new(NativeHost::legacy())).build().unwrap();
    let input = record! {
        "name" => "BatchError",
        "errors" => Object::array(["a"]),
        "cause" => "root",
    };

    let err = normalize_with(&input.into(), &options);
    assert_eq!(err.construction(), Construction::PlainFallback);
    assert_eq!(err.class(), &ErrorClass::Error);
    assert!(err.cause().is_some());
    assert_eq!(err.errors().map(SubErrors::len), Some(1));
}

#[test]
fn unregistered_names_use_native_constructs() {
    let batch = record! { "name" => "BatchError", "errors" => Object::array(["a"]) };
    let err = normalize_with(&batch.into(), &Options::default());
    assert_eq!(err.construction(), Construction::NativeMultiError);

    let chained = record! { "name" => "DbError", "cause" => "socket" };
    let err = normalize_with(&chained.into(), &Options::default());
    assert_eq!(err.construction(), Construction::NativeCausal);
}

// ============================================================================
// STANDARD ERRORS AND WRAPPERS
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("failed to load settings")]
struct LoadError {
    #[source]
    source: std::io::Error,
}

#[test]
fn std_error_chains_become_causes() {
    let error: Box<dyn std::error::Error + Send + Sync> = Box::new(LoadError {
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json"),
    });

    let err = normalize(&Value::from(error));
    assert_eq!(
        err.to_text_with(&Options::default()),
        "Error: failed to load settings\n  [cause] Error: settings.json"
    );
}

#[test]
fn captured_error_keeps_its_own_ceiling() {
    let input: Value = record! {
        "message" => "outer",
        "cause" => record! { "message" => "middle", "cause" => "inner" },
    }
    .into();

    let captured = CapturedError::capture(&input).with_max_depth(2).unwrap();
    assert_eq!(
        captured.to_text(),
        "Error: outer\n  [cause] Error: middle\n    [cause] [Max depth of 2 reached]"
    );
    assert_eq!(captured.error().to_text_with(&Options::default()).lines().count(), 3);
    assert_eq!(
        captured.with_max_depth(0).unwrap_err(),
        OptionsError::MaxDepthOutOfRange { value: 0 }
    );
}

#[tokio::test]
async fn try_catch_async_normalizes_errors() {
    let result: Result<(), _> = try_catch_async(async { Err("late failure") }).await;
    assert_eq!(result.unwrap_err().header(), "Error: late failure");

    let ok: Result<u8, _> = try_catch_async(async { Ok::<_, Value>(1) }).await;
    assert_eq!(ok.ok(), Some(1));
}

#[test]
fn global_options_install_once() {
    assert!(Options::default().install_global().is_ok());
    assert_eq!(
        Options::default().install_global(),
        Err(OptionsError::GlobalAlreadyInstalled)
    );
    assert_eq!(Options::global().max_depth(), 8);
}
