//! Safe metadata copier.
//!
//! Copies a source record's own properties into a [`Metadata`] target,
//! normalizing every value on the way.
//!
//! # Exclusions
//!
//! - [`DENYLIST`] keys are never copied. They control type identity and
//!   rendering behavior, so copying them would let a hostile record spoof
//!   the output's own machinery.
//! - Caller exclusions (the structural keys in [`RESERVED_KEYS`] when copying
//!   an error) are unioned with the denylist.
//! - Callable values are skipped.
//!
//! # Hostile Input
//!
//! A getter that fails skips its property. The exception is a thrown
//! `RangeError` or `ReferenceError` instance: that signals the runtime itself
//! is in trouble, and it is re-raised as a [`Fault`] instead of absorbed.
//!
//! # Caps
//!
//! `max_properties` and `max_array_length` bound the copy. Exceeding either
//! emits a `tracing` warning and continues with the truncated set.

use crate::classify::{ValueClass, classify_object};
use crate::models::{MetaValue, Metadata};
use crate::normalize::{Fault, Walk};
use crate::value::{Object, PropertyKey, Value};
use std::sync::Arc;

/// Keys that are never copied as data.
pub const DENYLIST: [&str; 6] = [
    "__proto__",
    "constructor",
    "prototype",
    "toString",
    "toJSON",
    "valueOf",
];

/// Structural keys consumed by the shape normalizer.
pub const RESERVED_KEYS: [&str; 5] = ["name", "message", "stack", "cause", "errors"];

#[inline]
pub(crate) fn is_denylisted(key: &PropertyKey) -> bool {
    key.as_str().is_some_and(|key| DENYLIST.contains(&key))
}

/// Denylisted or reserved.
#[inline]
pub(crate) fn is_copy_excluded(key: &PropertyKey) -> bool {
    is_denylisted(key) || key.as_str().is_some_and(|key| RESERVED_KEYS.contains(&key))
}

/// Whether a thrown value must propagate instead of being absorbed.
#[inline]
fn is_fault(thrown: &Value) -> bool {
    thrown
        .as_object()
        .and_then(Object::error_class)
        .is_some_and(|class| class.is_resource_exhaustion())
}

/// Read an own property, treating a failing accessor as absent.
pub(crate) fn read_guarded(object: &Object, key: &PropertyKey) -> Result<Option<Value>, Fault> {
    match object.read(key) {
        Ok(value) => Ok(value),
        Err(thrown) if is_fault(&thrown) => Err(Fault(thrown)),
        Err(_) => Ok(None),
    }
}

/// Side-channel diagnostic for a capped collection.
pub(crate) fn warn_truncated(what: &'static str, limit: usize, total: usize) {
    tracing::warn!(limit, total, "{what} truncated to {limit} of {total} entries");
}

/// Copy `source`'s own properties into `target`.
///
/// `depth` is the depth of the copied values. Keys in `exclude` are skipped
/// along with the [`DENYLIST`].
pub(crate) fn copy_into(
    source: &Object,
    target: &mut Metadata,
    exclude: &[&str],
    depth: usize,
    walk: &mut Walk<'_>,
) -> Result<(), Fault> {
    let options = walk.options;
    let keys: Vec<PropertyKey> = source
        .own_keys()
        .into_iter()
        .filter(|(key, enumerable)| {
            (*enumerable || options.include_non_enumerable())
                && (options.include_symbol_keys() || !key.is_symbol())
        })
        .map(|(key, _)| key)
        .filter(|key| !is_denylisted(key))
        .filter(|key| !key.as_str().is_some_and(|key| exclude.contains(&key)))
        .collect();

    let limit = options.max_properties();
    if keys.len() > limit {
        warn_truncated("metadata properties", limit, keys.len());
    }

    for key in keys.into_iter().take(limit) {
        let Some(value) = read_guarded(source, &key)? else {
            continue;
        };
        if matches!(value, Value::Function(_)) {
            continue;
        }
        let key = if options.stringify_symbol_keys() {
            key.to_text_key()
        } else {
            key
        };
        let normalized = meta_value(&value, depth, walk)?;
        target.insert(key, normalized);
    }
    Ok(())
}

/// Normalize one metadata value found at `depth`.
pub(crate) fn meta_value(value: &Value, depth: usize, walk: &mut Walk<'_>) -> Result<MetaValue, Fault> {
    if walk.governor.at_limit(depth) {
        return Ok(MetaValue::MaxDepth(walk.governor.max_depth()));
    }

    let normalized = match value {
        Value::Undefined => MetaValue::Undefined,
        Value::Null => MetaValue::Null,
        Value::Bool(b) => MetaValue::Bool(*b),
        Value::Number(n) => MetaValue::Number(*n),
        Value::BigInt(n) => MetaValue::BigInt(*n),
        Value::String(s) => MetaValue::String(s.to_string()),
        Value::Symbol(symbol) => MetaValue::Symbol(symbol.clone()),
        // Only reachable inside sequences; record properties skip callables.
        Value::Function(function) => MetaValue::String(function.to_string()),
        Value::Object(object) => {
            if walk.visited.enter(object) {
                return Ok(MetaValue::Circular);
            }
            match classify_object(object) {
                ValueClass::Sequence => MetaValue::Array(sequence(object, depth + 1, walk)?),
                ValueClass::ErrorShaped => {
                    MetaValue::Error(Arc::new(walk.error_record(object, depth)?))
                }
                _ => {
                    let mut record = Metadata::new();
                    copy_into(object, &mut record, &[], depth + 1, walk)?;
                    MetaValue::Record(record)
                }
            }
        }
    };
    Ok(normalized)
}

/// Normalize the elements of an array, each at `depth`.
fn sequence(object: &Object, depth: usize, walk: &mut Walk<'_>) -> Result<Vec<MetaValue>, Fault> {
    let elements = object.elements().unwrap_or_default();
    let limit = walk.options.max_array_length();
    if elements.len() > limit {
        warn_truncated("array elements", limit, elements.len());
    }
    elements
        .iter()
        .take(limit)
        .map(|element| meta_value(element, depth, walk))
        .collect()
}
