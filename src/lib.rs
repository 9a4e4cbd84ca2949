//! # Shapeshift Errors
//!
//! Normalize anything that was thrown into one canonical error shape, and
//! render it as text or JSON without ever failing.
//!
//! ## Design Philosophy
//!
//! 1. **Total**: every input yields a [`NormalizedError`]; normalization
//!    never returns an error and never panics
//! 2. **Bounded**: a depth ceiling and an identity-based visited set make
//!    every walk terminate, even over cyclic or adversarially deep graphs
//! 3. **Shape, not meaning**: the engine decides whether a value is a single
//!    error, a multi-error container or a plain record by its shape alone
//! 4. **Hostile-input safe**: throwing getters are absorbed, and keys that
//!    control type identity (`__proto__`, `constructor`, ...) are never copied
//!
//! ## Pipeline
//!
//! ```text
//! Value ──classify──▶ shape normalizer ──▶ canonical constructor ──▶ NormalizedError
//!                       │   ▲                                          │
//!                       ▼   │                                          ├─▶ to_text()
//!                    metadata copier                                   └─▶ to_structured()
//! ```
//!
//! Each top-level call allocates its own guards; nothing is shared between
//! calls except the read-only default [`Options`].
//!
//! ## Quick Start
//!
//! ```rust
//! use shapeshift_errors::{Options, normalize_with, record};
//!
//! let input = record! {
//!     "name" => "UpstreamError",
//!     "message" => "payment gateway unavailable",
//!     "status" => 503,
//!     "cause" => record! { "message" => "connection reset" },
//! };
//!
//! let err = normalize_with(&input.into(), &Options::default());
//! assert_eq!(
//!     err.to_text(),
//!     "UpstreamError: payment gateway unavailable\n  status: 503\n  [cause] Error: connection reset"
//! );
//! assert_eq!(err.to_structured()["cause"]["message"], "connection reset");
//! ```
//!
//! ## Cycles and Depth
//!
//! ```rust
//! use shapeshift_errors::{Object, Options, normalize_with};
//!
//! let a = Object::new().with("message", "loop");
//! a.set("cause", &a);
//!
//! let err = normalize_with(&a.clone().into(), &Options::default());
//! assert_eq!(err.cause().unwrap().message(), "[Circular]");
//! # a.delete("cause");
//! ```
//!
//! ## Multi-Errors
//!
//! `errors` is resolved by shape: an array gives a list, a record gives a
//! keyed map, and any other value is wrapped as a single-item list with the
//! message forced to `AggregateError`.
//!
//! ```rust
//! use shapeshift_errors::{Object, Options, normalize_with, record};
//!
//! let batch = record! { "errors" => Object::array(["disk full", "quota exceeded"]) };
//! let err = normalize_with(&batch.into(), &Options::default());
//! assert_eq!(err.errors().unwrap().len(), 2);
//! ```

#![warn(clippy::all)]

pub mod captured;
pub mod classify;
mod construct;
pub mod convenience;
pub mod guard;
pub mod host;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod options;
pub mod render;
pub mod structured;
pub mod value;

pub use captured::CapturedError;
pub use classify::{ValueClass, classify};
pub use convenience::{catch_panic, try_catch, try_catch_async, try_catch_map, try_catch_with};
pub use guard::{CIRCULAR_MARKER, depth_marker};
pub use host::{ConstructError, ErrorConstructor, ErrorHost, NativeHost};
pub use metadata::{DENYLIST, RESERVED_KEYS};
pub use models::{Construction, MetaValue, Metadata, NormalizedError, SubErrors};
pub use normalize::{normalize, normalize_with};
pub use options::{
    DEFAULT_MAX_ARRAY_LENGTH, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PROPERTIES, MAX_DEPTH_CEILING,
    Options, OptionsBuilder, OptionsError,
};
pub use value::{ErrorClass, Function, Getter, Object, ObjectKind, PropertyKey, Symbol, Value};

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, OptionsError>;
