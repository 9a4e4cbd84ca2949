//! Shape normalizer: turns any value into a [`NormalizedError`].
//!
//! # Algorithm
//!
//! For an error-shaped or plain record at depth `d`:
//!
//! 1. `d >= max_depth` yields a depth marker error.
//! 2. `cause` (when not null or undefined) is normalized at `d + 1`.
//! 3. `errors` is resolved in one of three modes, decided by shape:
//!    - **Array**: items normalized at `d + 1`, the same depth as the array
//!    - **Map**: values normalized at `d + 1` under their keys
//!    - **Single**: any other value is normalized at `d + 1` and wrapped in a
//!      one-element list; the name defaults to `AggregateError` and the
//!      message is forced to `AggregateError`
//! 4. The name and message are derived.
//! 5. The canonical constructor picks a construction path, then the
//!    remaining properties are copied as metadata at `d + 1`.
//!
//! Depth is checked before the cycle guard for every node, and both run
//! before any property is read.
//!
//! # Totality
//!
//! [`normalize`] never fails and never panics. Failing getters are absorbed.
//! A resource-exhaustion error thrown by a getter aborts the walk; the call
//! then returns the normalization of that thrown value instead.

use crate::classify::{ValueClass, classify, classify_object};
use crate::construct::{ErrorsMode, Parts, construct};
use crate::guard::{CIRCULAR_MARKER, DepthGovernor, VisitedSet};
use crate::metadata::{RESERVED_KEYS, copy_into, meta_value, read_guarded, warn_truncated};
use crate::models::{AGGREGATE_NAME, DEFAULT_NAME, NormalizedError, SubErrors};
use crate::options::Options;
use crate::structured::meta_json;
use crate::value::{Object, PropertyKey, Value};
use std::sync::Arc;

/// Normalize with the process-wide default options.
///
/// # Example
///
/// ```rust
/// use shapeshift_errors::{Value, normalize, record};
///
/// let err = normalize(&Value::from("oops"));
/// assert_eq!(err.name(), "Error");
/// assert_eq!(err.message(), "oops");
///
/// let err = normalize(&record! { "name" => "TimeoutError", "ms" => 3000 }.into());
/// assert_eq!(err.header(), "TimeoutError");
/// assert!(err.metadata().contains("ms"));
/// ```
pub fn normalize(input: &Value) -> NormalizedError {
    normalize_with(input, Options::global())
}

/// Normalize with explicit options.
pub fn normalize_with(input: &Value, options: &Options) -> NormalizedError {
    match Walk::new(options).root(input) {
        Ok(err) => err,
        Err(Fault(thrown)) => {
            tracing::debug!("resource exhaustion while reading input, normalizing the thrown value");
            Walk::new(options).root(&thrown).unwrap_or_else(|Fault(again)| {
                let name = again
                    .as_object()
                    .and_then(Object::error_class)
                    .map_or(DEFAULT_NAME.to_owned(), |class| class.name().to_owned());
                NormalizedError::new(name, "")
            })
        }
    }
}

/// Fatal value thrown by an accessor. Unwinds to the top-level call.
#[derive(Debug)]
pub(crate) struct Fault(pub(crate) Value);

/// Per-call traversal state.
pub(crate) struct Walk<'o> {
    pub(crate) options: &'o Options,
    pub(crate) governor: DepthGovernor,
    pub(crate) visited: VisitedSet<Object>,
}

impl<'o> Walk<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        Self {
            options,
            governor: DepthGovernor::new(options.max_depth()),
            visited: VisitedSet::new(),
        }
    }

    fn root(&mut self, input: &Value) -> Result<NormalizedError, Fault> {
        self.node(input, 0)
    }

    /// Normalize any value at `depth`, applying both guards.
    fn node(&mut self, value: &Value, depth: usize) -> Result<NormalizedError, Fault> {
        if self.governor.at_limit(depth) {
            return Ok(NormalizedError::marker(self.governor.marker()));
        }
        let Value::Object(object) = value else {
            return Ok(self.primitive(value));
        };
        if self.visited.enter(object) {
            return Ok(NormalizedError::marker(CIRCULAR_MARKER));
        }
        if object.is_array() {
            self.sequence_root(object, depth)
        } else {
            self.error_record(object, depth)
        }
    }

    #[inline]
    fn shared(&mut self, value: &Value, depth: usize) -> Result<Arc<NormalizedError>, Fault> {
        self.node(value, depth).map(Arc::new)
    }

    /// Primitives, symbols and callables wrap into an error carrying their text.
    fn primitive(&self, value: &Value) -> NormalizedError {
        let message = match value {
            Value::Null => "unknown error (null)".to_owned(),
            Value::Undefined => "unknown error (undefined)".to_owned(),
            other => other.primitive_text().unwrap_or_default(),
        };
        construct(Parts::new(DEFAULT_NAME, message), self.options)
    }

    /// A bare sequence is a multi-error container with no name or message.
    fn sequence_root(&mut self, array: &Object, depth: usize) -> Result<NormalizedError, Fault> {
        let items = self.list_items(array, depth + 1)?;
        let mut parts = Parts::new(DEFAULT_NAME, "");
        parts.errors = Some(SubErrors::List(items));
        parts.mode = ErrorsMode::List;
        Ok(construct(parts, self.options))
    }

    /// Normalize an error-shaped or plain record whose guards already ran.
    pub(crate) fn error_record(&mut self, object: &Object, depth: usize) -> Result<NormalizedError, Fault> {
        let cause = match read_guarded(object, &PropertyKey::from("cause"))? {
            Some(value) if !value.is_nullish() => Some(self.shared(&value, depth + 1)?),
            _ => None,
        };

        let (errors, mode) = match read_guarded(object, &PropertyKey::from("errors"))? {
            Some(value) if !value.is_nullish() => self.errors(&value, depth + 1)?,
            _ => (None, ErrorsMode::None),
        };

        let default_name = match mode {
            ErrorsMode::Single => AGGREGATE_NAME.to_owned(),
            _ => object
                .error_class()
                .map_or(DEFAULT_NAME.to_owned(), |class| class.name().to_owned()),
        };
        let name = self
            .text_field(object, "name", depth)?
            .filter(|name| !name.is_empty())
            .unwrap_or(default_name);

        let message = if mode == ErrorsMode::Single {
            AGGREGATE_NAME.to_owned()
        } else {
            self.text_field(object, "message", depth)?.unwrap_or_default()
        };

        let stack = match read_guarded(object, &PropertyKey::from("stack"))? {
            Some(Value::String(stack)) => Some(stack.to_string()),
            _ => None,
        };

        let mut parts = Parts::new(name, message);
        parts.stack = stack;
        parts.cause = cause;
        parts.errors = errors;
        parts.mode = mode;

        let mut err = construct(parts, self.options);
        copy_into(object, err.metadata_mut(), &RESERVED_KEYS, depth + 1, self)?;
        Ok(err)
    }

    /// Resolve an `errors` value found at `depth`.
    fn errors(&mut self, value: &Value, depth: usize) -> Result<(Option<SubErrors>, ErrorsMode), Fault> {
        let class = classify(value);
        let container = match (class, value) {
            (ValueClass::Sequence | ValueClass::PlainRecord, Value::Object(object)) => object,
            _ => {
                let item = self.shared(value, depth)?;
                return Ok((Some(SubErrors::List(vec![item])), ErrorsMode::Single));
            }
        };

        // Past the ceiling every item or key carries its own depth marker, so
        // the container is only tracked while it can still be descended into.
        if !self.governor.at_limit(depth) && self.visited.enter(container) {
            let marker = Arc::new(NormalizedError::marker(CIRCULAR_MARKER));
            return Ok((Some(SubErrors::List(vec![marker])), ErrorsMode::List));
        }

        if class == ValueClass::Sequence {
            let items = self.list_items(container, depth)?;
            Ok((Some(SubErrors::List(items)), ErrorsMode::List))
        } else {
            let entries = self.map_entries(container, depth)?;
            Ok((Some(SubErrors::Map(entries)), ErrorsMode::Map))
        }
    }

    /// Array-mode items, each at `depth`.
    fn list_items(&mut self, array: &Object, depth: usize) -> Result<Vec<Arc<NormalizedError>>, Fault> {
        let elements = array.elements().unwrap_or_default();
        let limit = self.options.max_array_length();
        if elements.len() > limit {
            warn_truncated("errors", limit, elements.len());
        }
        elements
            .iter()
            .take(limit)
            .map(|element| self.shared(element, depth))
            .collect()
    }

    /// Map-mode values, each at `depth`. Keys follow the copier's policy.
    fn map_entries(
        &mut self,
        record: &Object,
        depth: usize,
    ) -> Result<Vec<(String, Arc<NormalizedError>)>, Fault> {
        let options = self.options;
        let keys: Vec<PropertyKey> = record
            .own_keys()
            .into_iter()
            .filter(|(key, enumerable)| {
                (*enumerable || options.include_non_enumerable())
                    && (options.include_symbol_keys() || !key.is_symbol())
            })
            .map(|(key, _)| key)
            .filter(|key| !crate::metadata::is_denylisted(key))
            .collect();

        let limit = options.max_properties();
        if keys.len() > limit {
            warn_truncated("errors", limit, keys.len());
        }

        let mut entries = Vec::with_capacity(keys.len().min(limit));
        for key in keys.into_iter().take(limit) {
            let Some(value) = read_guarded(record, &key)? else {
                continue;
            };
            if matches!(value, Value::Function(_)) {
                continue;
            }
            entries.push((key.to_string(), self.shared(&value, depth)?));
        }
        Ok(entries)
    }

    /// Coerce the `name` or `message` property of a node at `depth` to text.
    ///
    /// `None` when absent, nullish, or not coercible.
    fn text_field(&mut self, object: &Object, key: &str, depth: usize) -> Result<Option<String>, Fault> {
        let Some(value) = read_guarded(object, &PropertyKey::from(key))? else {
            return Ok(None);
        };
        let text = match &value {
            Value::Undefined | Value::Null => None,
            Value::Object(inner) => match classify_object(inner) {
                ValueClass::ErrorShaped => {
                    let err = self.node(&value, depth + 1)?;
                    if err.message().is_empty() {
                        Some(err.name().to_owned())
                    } else {
                        Some(err.message().to_owned())
                    }
                }
                // Records have no natural name.
                _ if key == "name" => None,
                _ => {
                    let normalized = meta_value(&value, depth + 1, self)?;
                    Some(meta_json(&normalized, self.options).to_string())
                }
            },
            other => other.primitive_text(),
        };
        Ok(text)
    }
}
