//! Value classification.
//!
//! Every value is tagged exactly once at ingress and the tag is carried
//! through the rest of the pipeline, instead of re-probing shape at each
//! step. Classification only checks for the *presence* of own keys; it never
//! reads a property, so hostile accessors cannot run here.

use crate::value::{Object, Value};

/// Own keys that make a reference value error-shaped.
pub const ERROR_SHAPE_KEYS: [&str; 5] = ["name", "message", "cause", "errors", "stack"];

/// Closed set of shapes the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    /// `undefined`, `null`, booleans, numbers, bigints, strings.
    Primitive,
    /// Symbols.
    OpaqueKey,
    /// Functions.
    Callable,
    /// Arrays.
    Sequence,
    /// Native exception instances, or records with at least one of
    /// [`ERROR_SHAPE_KEYS`] as an own key.
    ErrorShaped,
    /// Any other record.
    PlainRecord,
}

impl ValueClass {
    /// Whether values of this class are tracked by identity during a walk.
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Sequence | Self::ErrorShaped | Self::PlainRecord)
    }
}

/// Classify a value.
pub fn classify(value: &Value) -> ValueClass {
    match value {
        Value::Undefined
        | Value::Null
        | Value::Bool(_)
        | Value::Number(_)
        | Value::BigInt(_)
        | Value::String(_) => ValueClass::Primitive,
        Value::Symbol(_) => ValueClass::OpaqueKey,
        Value::Function(_) => ValueClass::Callable,
        Value::Object(object) => classify_object(object),
    }
}

/// Classify a reference value.
pub fn classify_object(object: &Object) -> ValueClass {
    // Native instances take the fast path without probing keys.
    if object.error_class().is_some() {
        return ValueClass::ErrorShaped;
    }
    if object.is_array() {
        return ValueClass::Sequence;
    }
    if ERROR_SHAPE_KEYS.iter().any(|key| object.has_own_str(key)) {
        ValueClass::ErrorShaped
    } else {
        ValueClass::PlainRecord
    }
}
