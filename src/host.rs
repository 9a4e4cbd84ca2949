//! Host capability probes and the error-constructor registry.
//!
//! The canonical error constructor asks the host two questions: which
//! native constructs it offers (multi-error containers, cause chaining), and
//! whether a constructor exists for a given error name. [`NativeHost`] is the
//! default answer; callers plug in their own [`ErrorHost`] to model older
//! runtimes or to register project-specific error classes.
//!
//! # Example
//!
//! ```rust
//! use shapeshift_errors::{ErrorClass, NativeHost, Options, normalize_with, record};
//! use std::sync::Arc;
//!
//! let host = NativeHost::new().register_class(ErrorClass::custom("ValidationError"));
//! let options = Options::builder().host(Arc::new(host)).build().unwrap();
//!
//! let err = normalize_with(&record! { "name" => "ValidationError" }.into(), &options);
//! assert_eq!(err.class().name(), "ValidationError");
//! ```

use crate::value::ErrorClass;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Failure raised by an [`ErrorConstructor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error constructor `{class}` failed: {reason}")]
pub struct ConstructError {
    pub class: String,
    pub reason: String,
}

impl ConstructError {
    pub fn new(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            reason: reason.into(),
        }
    }
}

/// Constructor for a named error type.
pub trait ErrorConstructor: Send + Sync {
    /// Whether this constructor produces error instances at all. Hosts may
    /// expose non-error constructors under error-like names.
    fn is_error_type(&self) -> bool {
        true
    }

    /// Instantiate with the final message.
    fn construct(&self, message: &str) -> Result<ErrorClass, ConstructError>;
}

impl<F> ErrorConstructor for F
where
    F: Fn(&str) -> Result<ErrorClass, ConstructError> + Send + Sync,
{
    fn construct(&self, message: &str) -> Result<ErrorClass, ConstructError> {
        self(message)
    }
}

/// Capability probes consumed by the canonical error constructor.
pub trait ErrorHost: Send + Sync {
    /// Native multi-error containers are available.
    fn supports_multi_error(&self) -> bool;

    /// Native cause chaining is available.
    fn supports_causal_chain(&self) -> bool;

    /// Constructor registered under `name`, if any.
    fn constructor(&self, name: &str) -> Option<Arc<dyn ErrorConstructor>>;
}

/// Constructor that always succeeds with a fixed class.
struct ClassConstructor(ErrorClass);

impl ErrorConstructor for ClassConstructor {
    fn construct(&self, _message: &str) -> Result<ErrorClass, ConstructError> {
        Ok(self.0.clone())
    }
}

/// Default host: every native error class is constructible and both native
/// constructs are available.
pub struct NativeHost {
    multi_error: bool,
    causal_chain: bool,
    registry: HashMap<String, Arc<dyn ErrorConstructor>>,
}

impl NativeHost {
    /// Host with both capabilities and all native classes registered.
    pub fn new() -> Self {
        let mut registry: HashMap<String, Arc<dyn ErrorConstructor>> = HashMap::new();
        for class in ErrorClass::NATIVE {
            registry.insert(class.name().to_owned(), Arc::new(ClassConstructor(class)));
        }
        Self {
            multi_error: true,
            causal_chain: true,
            registry,
        }
    }

    /// Host modeling a runtime without multi-error containers or cause
    /// chaining. Native classes stay constructible.
    pub fn legacy() -> Self {
        Self::new().without_multi_error().without_causal_chain()
    }

    /// Shared default instance.
    pub fn shared() -> Arc<dyn ErrorHost> {
        static SHARED: OnceLock<Arc<NativeHost>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(NativeHost::new())).clone()
    }

    /// Drop native multi-error support, including the `AggregateError`
    /// constructor.
    #[inline]
    pub fn without_multi_error(mut self) -> Self {
        self.multi_error = false;
        self.registry.remove(ErrorClass::AggregateError.name());
        self
    }

    /// Drop native cause chaining; causes attach as plain fields.
    #[inline]
    pub fn without_causal_chain(mut self) -> Self {
        self.causal_chain = false;
        self
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register(
        mut self,
        name: impl Into<String>,
        constructor: impl ErrorConstructor + 'static,
    ) -> Self {
        self.registry.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Register a class under its own name with an infallible constructor.
    pub fn register_class(self, class: ErrorClass) -> Self {
        let name = class.name().to_owned();
        self.register(name, ClassConstructor(class))
    }
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHost for NativeHost {
    #[inline]
    fn supports_multi_error(&self) -> bool {
        self.multi_error
    }

    #[inline]
    fn supports_causal_chain(&self) -> bool {
        self.causal_chain
    }

    fn constructor(&self, name: &str) -> Option<Arc<dyn ErrorConstructor>> {
        self.registry.get(name).cloned()
    }
}

impl fmt::Debug for NativeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("NativeHost")
            .field("multi_error", &self.multi_error)
            .field("causal_chain", &self.causal_chain)
            .field("constructors", &names)
            .finish()
    }
}
