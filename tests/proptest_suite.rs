//! Property-based tests for shapeshift_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use proptest::prelude::*;
use serde_json::Value as Json;
use shapeshift_errors::{
    DENYLIST, ErrorClass, MAX_DEPTH_CEILING, MetaValue, NormalizedError, Object, Options,
    SubErrors, Value, normalize_with,
};

// ============================================================================
// STRATEGIES
// ============================================================================

const INTERESTING_KEYS: &[&str] = &[
    "name",
    "message",
    "cause",
    "errors",
    "stack",
    "__proto__",
    "constructor",
    "prototype",
    "toString",
    "toJSON",
    "valueOf",
];

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(INTERESTING_KEYS).prop_map(str::to_owned),
        "[a-z_]{1,8}",
    ]
}

fn json_value() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::from),
        any::<i64>().prop_map(Json::from),
        any::<f64>().prop_map(Json::from),
        "\\PC{0,40}".prop_map(Json::from),
    ];
    leaf.prop_recursive(6, 96, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::vec((key(), inner), 0..6)
                .prop_map(|entries| Json::Object(entries.into_iter().collect())),
        ]
    })
}

fn options(max_depth: i64) -> Options {
    Options::builder().max_depth(max_depth).build().unwrap()
}

/// Build a `cause` chain with `len` links below the root.
fn cause_chain(len: usize) -> Object {
    let mut current = Object::new().with("message", "leaf");
    for level in 0..len {
        current = Object::new()
            .with("message", format!("level {level}"))
            .with("cause", current);
    }
    current
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Cause,
    Errors,
    Meta,
}

fn edges(nodes: usize) -> impl Strategy<Value = Vec<(usize, usize, Edge)>> {
    let edge = prop_oneof![Just(Edge::Cause), Just(Edge::Errors), Just(Edge::Meta)];
    prop::collection::vec((0..nodes, 0..nodes, edge), 0..(nodes * 3))
}

/// Wire up an arbitrary (usually cyclic) graph.
fn graph(nodes: usize, edges: &[(usize, usize, Edge)]) -> Vec<Object> {
    let objects: Vec<Object> = (0..nodes)
        .map(|idx| Object::new().with("message", format!("node {idx}")))
        .collect();
    let lists: Vec<Object> = (0..nodes).map(|_| Object::array(Vec::<Value>::new())).collect();

    for (link, (from, to, edge)) in edges.iter().enumerate() {
        let (source, target) = (&objects[*from], &objects[*to]);
        match edge {
            Edge::Cause => source.set("cause", target),
            Edge::Errors => {
                lists[*from].push(target);
                source.set("errors", &lists[*from]);
            }
            Edge::Meta => source.set(format!("link{link}"), target),
        }
    }
    objects
}

fn break_cycles(objects: &[Object]) {
    for object in objects {
        for (key, _) in object.own_keys() {
            object.delete(key);
        }
    }
}

fn metadata_errors(value: &MetaValue, out: &mut Vec<String>) {
    match value {
        MetaValue::Array(items) => items.iter().for_each(|item| metadata_errors(item, out)),
        MetaValue::Record(record) => {
            for (key, item) in record.iter() {
                out.push(key.to_string());
                metadata_errors(item, out);
            }
        }
        _ => {}
    }
}

fn all_metadata_keys(err: &NormalizedError, out: &mut Vec<String>) {
    for (key, value) in err.metadata().iter() {
        out.push(key.to_string());
        metadata_errors(value, out);
    }
    if let Some(cause) = err.cause() {
        all_metadata_keys(cause, out);
    }
    if let Some(errors) = err.errors() {
        errors.values().for_each(|item| all_metadata_keys(item, out));
    }
}

// ============================================================================
// TOTALITY
// ============================================================================

proptest! {
    /// Any JSON payload normalizes to a well-formed error
    #[test]
    fn normalize_is_total_over_json(json in json_value(), max_depth in 1i64..12) {
        let err = normalize_with(&Value::from(json), &options(max_depth));

        prop_assert!(!err.name().is_empty());
        if let Some(errors) = err.errors() {
            prop_assert_eq!(errors.is_list(), errors.as_map().is_none());
        }
    }

    /// Arbitrary primitives never fail and always carry text
    #[test]
    fn primitives_always_wrap(n in any::<f64>(), s in "\\PC{0,64}", b in any::<bool>(), big in any::<i128>()) {
        let opts = Options::default();
        for value in [Value::from(n), Value::from(s.as_str()), Value::from(b), Value::BigInt(big)] {
            let err = normalize_with(&value, &opts);
            prop_assert_eq!(err.name(), "Error");
            prop_assert!(err.metadata().is_empty());
        }
        let wrapped = normalize_with(&Value::from(s.as_str()), &opts);
        prop_assert_eq!(wrapped.message(), s.as_str());
    }
}

// ============================================================================
// TERMINATION
// ============================================================================

proptest! {
    /// A cause chain never yields more than max_depth real nodes
    #[test]
    fn cause_chains_respect_the_ceiling(len in 0usize..40, max_depth in 1usize..16) {
        let err = normalize_with(&cause_chain(len).into(), &options(max_depth as i64));
        let chain: Vec<&NormalizedError> = err.chain().collect();

        prop_assert_eq!(chain.len(), (len + 1).min(max_depth + 1));
        if len >= max_depth {
            let marker = format!("[Max depth of {max_depth} reached]");
            prop_assert_eq!(chain.last().map(|e| e.message()), Some(marker.as_str()));
        } else {
            prop_assert_eq!(chain.last().map(|e| e.message()), Some("leaf"));
        }
    }

    /// Random graphs with cycles through every edge kind terminate
    #[test]
    fn cyclic_graphs_terminate(
        (nodes, links) in (1usize..8).prop_flat_map(|n| (Just(n), edges(n))),
        root in 0usize..8,
    ) {
        let objects = graph(nodes, &links);
        let root = &objects[root % nodes];

        let err = normalize_with(&root.into(), &Options::default());
        let text = err.to_text_with(&Options::default());
        let structured = err.to_structured_with(&Options::default());

        prop_assert!(text.starts_with(&err.header()));
        prop_assert!(structured.is_object());
        break_cycles(&objects);
    }

    /// Self-reference through cause is always reported as circular
    #[test]
    fn self_cause_is_circular(extra in prop::collection::vec(("[a-z]{1,6}", any::<i32>()), 0..5)) {
        let object = Object::new();
        for (key, value) in &extra {
            object.set(key.as_str(), *value);
        }
        object.set("cause", &object);

        let err = normalize_with(&object.clone().into(), &Options::default());
        prop_assert_eq!(err.cause().map(NormalizedError::message), Some("[Circular]"));
        object.delete("cause");
    }
}

// ============================================================================
// RENDERING PROPERTIES
// ============================================================================

proptest! {
    /// Both renderings are deterministic
    #[test]
    fn rendering_is_idempotent(json in json_value()) {
        let opts = Options::default();
        let err = normalize_with(&Value::from(json), &opts);

        prop_assert_eq!(err.to_text_with(&opts), err.to_text_with(&opts));
        prop_assert_eq!(err.to_structured_with(&opts), err.to_structured_with(&opts));
    }

    /// The structured form is plain JSON with the header fields first
    #[test]
    fn structured_form_is_plain_json(json in json_value()) {
        let err = normalize_with(&Value::from(json), &Options::default());

        let text = serde_json::to_string(&err).unwrap();
        let reparsed: Json = serde_json::from_str(&text).unwrap();
        let object = reparsed.as_object().unwrap();
        let keys: Vec<&str> = object.keys().take(2).map(String::as_str).collect();
        prop_assert_eq!(keys, ["name", "message"]);
        prop_assert_eq!(object["name"].as_str(), Some(err.name()));
        prop_assert_eq!(object["message"].as_str(), Some(err.message()));
    }

    /// Text output of a normalized error always starts with its header
    #[test]
    fn text_starts_with_header(json in json_value()) {
        let err = normalize_with(&Value::from(json), &Options::default());
        let text = err.to_text_with(&Options::default());
        prop_assert!(text.starts_with(&err.header()));
    }
}

// ============================================================================
// SAFETY PROPERTIES
// ============================================================================

proptest! {
    /// Denylisted keys never reach metadata, at any depth
    #[test]
    fn denylist_is_enforced(json in json_value()) {
        let err = normalize_with(&Value::from(json), &Options::default());

        let mut keys = Vec::new();
        all_metadata_keys(&err, &mut keys);
        for key in keys {
            prop_assert!(!DENYLIST.contains(&key.as_str()), "leaked key {}", key);
        }
    }

    /// The property cap bounds metadata exactly
    #[test]
    fn property_cap_is_exact(count in 0usize..40, cap in 0usize..20) {
        let object = Object::new();
        for idx in 0..count {
            object.set(format!("k{idx}"), idx as u32);
        }
        let opts = Options::builder().max_properties(cap).build().unwrap();

        let err = normalize_with(&object.into(), &opts);
        prop_assert_eq!(err.metadata().len(), count.min(cap));
    }

    /// The array cap bounds list-mode errors exactly
    #[test]
    fn array_cap_is_exact(count in 0usize..40, cap in 0usize..20) {
        let items = Object::array((0..count).map(|idx| format!("e{idx}")));
        let input = Object::new().with("errors", items);
        let opts = Options::builder().max_array_length(cap).build().unwrap();

        let err = normalize_with(&input.into(), &opts);
        let len = err.errors().and_then(SubErrors::as_list).map_or(0, <[_]>::len);
        prop_assert_eq!(len, count.min(cap));
    }

    /// Failing getters never change the outcome for the remaining fields
    #[test]
    fn failing_getters_are_skipped(message in "[a-z ]{1,20}", keys in prop::collection::vec("[a-z]{1,6}", 0..6)) {
        let object = Object::new().with("message", message.as_str());
        for key in &keys {
            object.define_getter(format!("bad_{key}"), || {
                Err(Object::error(ErrorClass::TypeError, "denied").into())
            });
        }

        let err = normalize_with(&object.into(), &Options::default());
        prop_assert_eq!(err.message(), message.as_str());
        prop_assert!(err.metadata().is_empty());
    }
}

// ============================================================================
// CONFIGURATION PROPERTIES
// ============================================================================

proptest! {
    /// Only 1..=MAX_DEPTH_CEILING is accepted as a depth ceiling
    #[test]
    fn max_depth_validation(depth in prop_oneof![any::<i64>(), -5i64..300]) {
        let result = Options::builder().max_depth(depth).build();
        prop_assert_eq!(result.is_ok(), (1..=MAX_DEPTH_CEILING as i64).contains(&depth));
    }
}
