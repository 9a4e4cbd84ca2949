//! Structural serializer.
//!
//! Produces a `serde_json::Value` tree containing only strings, numbers,
//! booleans, nulls, arrays and objects. Object keys are ordered `name`,
//! `message`, `stack`, metadata, `cause`, `errors`.
//!
//! Unlike the text renderer nothing is summarized inline; only the depth
//! ceiling and the property and array caps bound the output. Values JSON
//! cannot carry are replaced by their text form:
//!
//! | Value                 | Output                         |
//! |-----------------------|--------------------------------|
//! | symbol key or value   | `"Symbol(desc)"`               |
//! | `NaN`, `±Infinity`    | `"NaN"`, `"Infinity"`, ...     |
//! | bigint                | decimal string                 |
//! | `undefined` in record | omitted                        |
//! | `undefined` in array  | `null`                         |
//! | depth / cycle marker  | marker string                  |

use crate::guard::{CIRCULAR_MARKER, DepthGovernor, VisitedSet, depth_marker};
use crate::metadata::warn_truncated;
use crate::models::{Metadata, MetaValue, NormalizedError, SubErrors};
use crate::options::Options;
use crate::value::format_number;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value as Json};

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl NormalizedError {
    /// Structured form with the process-wide default options.
    pub fn to_structured(&self) -> Json {
        self.to_structured_with(Options::global())
    }

    /// Structured form under explicit options.
    ///
    /// Emits `name`, `message`, `stack` (when present), the metadata, then
    /// `cause` and `errors`. Metadata never overwrites those structural keys,
    /// `undefined` values are dropped, and past-ceiling or repeated nodes
    /// become marker strings.
    pub fn to_structured_with(&self, options: &Options) -> Json {
        StructuredWriter::new(options).node(self, 0)
    }
}

impl Serialize for NormalizedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_structured().serialize(serializer)
    }
}

/// Structured form of a lone metadata value, in a fresh traversal.
pub(crate) fn meta_json(value: &MetaValue, options: &Options) -> Json {
    StructuredWriter::new(options).meta(value, 0)
}

/// One structured serialization pass, with its own governor and visited set.
struct StructuredWriter<'t> {
    governor: DepthGovernor,
    visited: VisitedSet<&'t NormalizedError>,
    max_properties: usize,
    max_array_length: usize,
}

impl<'t> StructuredWriter<'t> {
    fn new(options: &Options) -> Self {
        Self {
            governor: DepthGovernor::new(options.max_depth()),
            visited: VisitedSet::new(),
            max_properties: options.max_properties(),
            max_array_length: options.max_array_length(),
        }
    }

    fn node(&mut self, err: &'t NormalizedError, depth: usize) -> Json {
        if self.governor.at_limit(depth) {
            return Json::String(self.governor.marker());
        }
        if self.visited.enter(&err) {
            return Json::String(CIRCULAR_MARKER.to_owned());
        }

        let mut object = Map::new();
        object.insert("name".to_owned(), Json::from(err.name()));
        object.insert("message".to_owned(), Json::from(err.message()));
        if let Some(stack) = err.stack() {
            object.insert("stack".to_owned(), Json::from(stack));
        }
        self.record_into(&mut object, err.metadata(), depth + 1);

        if let Some(cause) = err.cause() {
            object.insert("cause".to_owned(), self.node(cause, depth + 1));
        }

        match err.errors() {
            Some(SubErrors::List(items)) => {
                if items.len() > self.max_array_length {
                    warn_truncated("serialized errors", self.max_array_length, items.len());
                }
                let items = items
                    .iter()
                    .take(self.max_array_length)
                    .map(|item| self.node(item, depth + 1))
                    .collect();
                object.insert("errors".to_owned(), Json::Array(items));
            }
            Some(SubErrors::Map(entries)) => {
                if entries.len() > self.max_properties {
                    warn_truncated("serialized errors", self.max_properties, entries.len());
                }
                let mut map = Map::new();
                for (key, item) in entries.iter().take(self.max_properties) {
                    map.insert(key.clone(), self.node(item, depth + 1));
                }
                object.insert("errors".to_owned(), Json::Object(map));
            }
            None => {}
        }

        Json::Object(object)
    }

    /// Copy metadata entries into `object`, each value at `depth`.
    ///
    /// Entries never overwrite the structural keys already present.
    fn record_into(&mut self, object: &mut Map<String, Json>, record: &'t Metadata, depth: usize) {
        if record.len() > self.max_properties {
            warn_truncated("serialized properties", self.max_properties, record.len());
        }
        for (key, value) in record.iter().take(self.max_properties) {
            if matches!(value, MetaValue::Undefined) {
                continue;
            }
            let key = key.to_string();
            if object.contains_key(&key) {
                continue;
            }
            let value = self.meta(value, depth);
            object.insert(key, value);
        }
    }

    fn meta(&mut self, value: &'t MetaValue, depth: usize) -> Json {
        if self.governor.at_limit(depth) {
            return Json::String(self.governor.marker());
        }
        match value {
            MetaValue::Undefined | MetaValue::Null => Json::Null,
            MetaValue::Bool(b) => Json::Bool(*b),
            MetaValue::Number(n) => number(*n),
            MetaValue::BigInt(n) => Json::String(n.to_string()),
            MetaValue::String(s) => Json::String(s.clone()),
            MetaValue::Symbol(symbol) => Json::String(symbol.to_string()),
            MetaValue::Array(items) => {
                if items.len() > self.max_array_length {
                    warn_truncated("serialized array elements", self.max_array_length, items.len());
                }
                Json::Array(
                    items
                        .iter()
                        .take(self.max_array_length)
                        .map(|item| self.meta(item, depth + 1))
                        .collect(),
                )
            }
            MetaValue::Record(record) => {
                let mut object = Map::new();
                self.record_into(&mut object, record, depth + 1);
                Json::Object(object)
            }
            MetaValue::Error(err) => self.node(err, depth),
            MetaValue::Circular => Json::String(CIRCULAR_MARKER.to_owned()),
            MetaValue::MaxDepth(max_depth) => Json::String(depth_marker(*max_depth)),
        }
    }
}

/// Integral values become JSON integers; non-finite values become text.
fn number(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or_else(|| Json::String(format_number(n)), Json::Number)
}
