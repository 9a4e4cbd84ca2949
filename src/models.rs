//! Canonical error shape produced by normalization.
//!
//! # Structure
//!
//! A [`NormalizedError`] always has a non-empty `name` and a `message`
//! (possibly empty). Everything else is optional:
//!
//! - `stack`: preserved verbatim from the source, or set explicitly
//! - `cause`: another normalized error
//! - `errors`: a list ([`SubErrors::List`]) or a keyed map
//!   ([`SubErrors::Map`]), never both
//! - `metadata`: remaining own properties, with values normalized into
//!   [`MetaValue`]
//!
//! Nodes are shared through `Arc`, so the whole tree is `Send + Sync` and can
//! cross threads or be boxed as `dyn Error + Send + Sync`.
//!
//! # Immutability
//!
//! Once returned from normalization a node is never mutated. The `with_*`
//! methods consume and return `self`, for building errors by hand.

use crate::metadata::is_copy_excluded;
use crate::value::{ErrorClass, PropertyKey, Symbol, format_number};
use std::fmt;
use std::sync::Arc;

/// Name used when nothing better is available.
pub const DEFAULT_NAME: &str = "Error";

/// Conventional name of a multi-error container. Also the forced message of
/// single-mode `errors` (see [`crate::normalize`]).
pub const AGGREGATE_NAME: &str = "AggregateError";

// ============================================================================
// Construction Path
// ============================================================================

/// Which path of the canonical error constructor produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construction {
    /// A host constructor matching the derived name was used.
    Subclassed,
    /// The host's native multi-error container was used.
    NativeMultiError,
    /// The host's native cause chaining was used.
    NativeCausal,
    /// A bare error with `cause`/`errors` attached as plain fields.
    PlainFallback,
}

impl Construction {
    /// Stable lowercase label for logs and diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subclassed => "subclassed",
            Self::NativeMultiError => "native-multi-error",
            Self::NativeCausal => "native-causal",
            Self::PlainFallback => "plain-fallback",
        }
    }
}

// ============================================================================
// Sub-errors
// ============================================================================

/// Sub-errors of a multi-error node.
#[derive(Debug, Clone, PartialEq)]
pub enum SubErrors {
    /// From a sequence, or a single non-collection value wrapped as one item.
    List(Vec<Arc<NormalizedError>>),
    /// From a keyed record, in key order.
    Map(Vec<(String, Arc<NormalizedError>)>),
}

impl SubErrors {
    /// Number of sub-errors, whichever mode.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Map(entries) => entries.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the container came from a sequence or a wrapped single value.
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Get the items when in list mode.
    #[inline]
    pub fn as_list(&self) -> Option<&[Arc<NormalizedError>]> {
        match self {
            Self::List(items) => Some(items),
            Self::Map(_) => None,
        }
    }

    /// Get the keyed entries when in map mode.
    ///
    /// Keys keep the order they had on the source record.
    #[inline]
    pub fn as_map(&self) -> Option<&[(String, Arc<NormalizedError>)]> {
        match self {
            Self::List(_) => None,
            Self::Map(entries) => Some(entries),
        }
    }

    /// Item by position (list) or by key (map).
    pub fn get(&self, index_or_key: &str) -> Option<&NormalizedError> {
        match self {
            Self::List(items) => index_or_key
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .map(Arc::as_ref),
            Self::Map(entries) => entries
                .iter()
                .find(|(key, _)| key == index_or_key)
                .map(|(_, err)| err.as_ref()),
        }
    }

    /// All sub-errors in order, ignoring keys.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Arc<NormalizedError>> + '_> {
        match self {
            Self::List(items) => Box::new(items.iter()),
            Self::Map(entries) => Box::new(entries.iter().map(|(_, err)| err)),
        }
    }
}

// ============================================================================
// Metadata Values
// ============================================================================

/// A normalized metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    Array(Vec<MetaValue>),
    Record(Metadata),
    /// An error-shaped value, normalized.
    Error(Arc<NormalizedError>),
    /// The value was already visited in this traversal.
    Circular,
    /// The value sat past the depth ceiling given here.
    MaxDepth(usize),
}

impl MetaValue {
    /// Get the string payload.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric payload. BigInts are not converted.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the nested error, when the value was error-shaped.
    #[inline]
    pub fn as_error(&self) -> Option<&NormalizedError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Get the nested record.
    #[inline]
    pub fn as_record(&self) -> Option<&Metadata> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Get the array items.
    #[inline]
    pub fn as_array(&self) -> Option<&[MetaValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a substituted marker rather than data.
    #[inline]
    pub const fn is_marker(&self) -> bool {
        matches!(self, Self::Circular | Self::MaxDepth(_))
    }

    /// Text form of scalar values and markers; `None` for containers and
    /// errors.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Undefined => Some("undefined".to_owned()),
            Self::Null => Some("null".to_owned()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::BigInt(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Symbol(symbol) => Some(symbol.to_string()),
            Self::Circular => Some(crate::guard::CIRCULAR_MARKER.to_owned()),
            Self::MaxDepth(max_depth) => Some(crate::guard::depth_marker(*max_depth)),
            Self::Array(_) | Self::Record(_) | Self::Error(_) => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<NormalizedError> for MetaValue {
    fn from(value: NormalizedError) -> Self {
        Self::Error(Arc::new(value))
    }
}

/// Ordered key/value pairs copied from a source record.
///
/// Heap-backed, since a [`MetaValue::Record`] nests another `Metadata`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(PropertyKey, MetaValue)>,
}

impl Metadata {
    /// Empty metadata.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of a string key.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Value of any key, including symbols.
    pub fn get_key(&self, key: &PropertyKey) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Check for a string key.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Insert or replace.
    pub(crate) fn insert(&mut self, key: PropertyKey, value: MetaValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

// ============================================================================
// Normalized Error
// ============================================================================

/// Canonical error shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    name: String,
    message: String,
    stack: Option<String>,
    cause: Option<Arc<NormalizedError>>,
    errors: Option<SubErrors>,
    metadata: Metadata,
    class: ErrorClass,
    construction: Construction,
}

impl NormalizedError {
    /// Build an error by hand. An empty name becomes [`DEFAULT_NAME`].
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: if name.is_empty() { DEFAULT_NAME.to_owned() } else { name },
            message: message.into(),
            stack: None,
            cause: None,
            errors: None,
            metadata: Metadata::new(),
            class: ErrorClass::Error,
            construction: Construction::PlainFallback,
        }
    }

    /// Error carrying a substituted marker as its message.
    pub(crate) fn marker(text: impl Into<String>) -> Self {
        Self::new(DEFAULT_NAME, text)
    }

    /// Record which construction path materialized this node.
    pub(crate) fn with_construction(mut self, class: ErrorClass, construction: Construction) -> Self {
        self.class = class;
        self.construction = construction;
        self
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Override the stack trace.
    #[inline]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach a cause, replacing any existing one.
    #[inline]
    pub fn with_cause(mut self, cause: impl Into<Arc<NormalizedError>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attach sub-errors, replacing any existing container.
    #[inline]
    pub fn with_errors(mut self, errors: SubErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Attach a metadata entry.
    ///
    /// Keys that are consumed structurally (`name`, `message`, `stack`,
    /// `cause`, `errors`) or reserved (`__proto__`, `constructor`, ...) are
    /// ignored.
    pub fn with_metadata(mut self, key: impl Into<PropertyKey>, value: impl Into<MetaValue>) -> Self {
        let key = key.into();
        if !is_copy_excluded(&key) {
            self.metadata.insert(key, value.into());
        }
        self
    }

    /// Get the derived name. Never empty.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the message. May be empty.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the stack trace, verbatim from the source.
    #[inline]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Get the normalized cause.
    #[inline]
    pub fn cause(&self) -> Option<&NormalizedError> {
        self.cause.as_deref()
    }

    /// Shared handle to the cause.
    #[inline]
    pub fn cause_arc(&self) -> Option<&Arc<NormalizedError>> {
        self.cause.as_ref()
    }

    /// Get the sub-errors of a multi-error node.
    #[inline]
    pub fn errors(&self) -> Option<&SubErrors> {
        self.errors.as_ref()
    }

    /// Get the copied metadata.
    ///
    /// Structural keys are never present here.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Concrete error type this node was materialized as.
    #[inline]
    pub fn class(&self) -> &ErrorClass {
        &self.class
    }

    /// Construction path chosen for this node.
    #[inline]
    pub fn construction(&self) -> Construction {
        self.construction
    }

    /// `"<name>: <message>"`, or just the name when the message is empty.
    pub fn header(&self) -> String {
        if self.message.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.message)
        }
    }

    /// Walk the cause chain starting at this node.
    pub fn chain(&self) -> impl Iterator<Item = &NormalizedError> {
        std::iter::successors(Some(self), |err| err.cause())
    }
}

impl fmt::Display for NormalizedError {
    /// Header line; the alternate form (`{:#}`) renders the full text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.write_text(f, crate::Options::global())
        } else {
            f.write_str(&self.name)?;
            if !self.message.is_empty() {
                write!(f, ": {}", self.message)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for NormalizedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_defaults() {
        let err = NormalizedError::new("", "boom");
        assert_eq!(err.name(), "Error");
        assert_eq!(err.header(), "Error: boom");
        assert_eq!(NormalizedError::new("TypeError", "").header(), "TypeError");
    }

    #[test]
    fn builder_rejects_reserved_keys() {
        let err = NormalizedError::new("Error", "x")
            .with_metadata("message", "shadow")
            .with_metadata("__proto__", "polluted")
            .with_metadata("code", "E42");

        assert_eq!(err.metadata().len(), 1);
        assert_eq!(err.metadata().get("code").and_then(MetaValue::as_str), Some("E42"));
        assert_eq!(err.message(), "x");
    }

    #[test]
    fn source_follows_cause() {
        use std::error::Error;
        let err = NormalizedError::new("Outer", "o").with_cause(NormalizedError::new("Inner", "i"));
        let source = err.source().expect("cause");
        assert_eq!(source.to_string(), "Inner: i");
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn sub_error_lookup() {
        let list = SubErrors::List(vec![Arc::new(NormalizedError::new("A", ""))]);
        assert_eq!(list.get("0").map(NormalizedError::name), Some("A"));
        assert!(list.get("x").is_none());

        let map = SubErrors::Map(vec![("db".to_owned(), Arc::new(NormalizedError::new("B", "")))]);
        assert_eq!(map.get("db").map(NormalizedError::name), Some("B"));
        assert_eq!(map.values().count(), 1);
        assert!(map.as_list().is_none());
    }

    #[test]
    fn records_nest_inside_records() {
        let mut inner = Metadata::new();
        inner.insert("port".into(), MetaValue::from(5432));
        let mut outer = Metadata::new();
        outer.insert("db".into(), MetaValue::Record(inner));

        let err = NormalizedError::new("Error", "x").with_metadata("config", MetaValue::Record(outer));
        let port = err
            .metadata()
            .get("config")
            .and_then(MetaValue::as_record)
            .and_then(|config| config.get("db"))
            .and_then(MetaValue::as_record)
            .and_then(|db| db.get("port"))
            .and_then(MetaValue::as_f64);
        assert_eq!(port, Some(5432.0));
    }

    #[test]
    fn normalized_errors_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NormalizedError>();
    }
}
