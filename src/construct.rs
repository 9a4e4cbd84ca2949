//! Canonical error constructor.
//!
//! Picks how a normalized shape is materialized. The paths are tried in
//! priority order:
//!
//! 1. [`Construction::Subclassed`]: subclass preservation is enabled and the
//!    host has an error constructor for the derived name. A failing
//!    constructor falls through.
//! 2. [`Construction::NativeMultiError`]: list or single mode, with native
//!    multi-error support enabled and available.
//! 3. [`Construction::NativeCausal`]: a cause was resolved, with native cause
//!    chaining enabled and available.
//! 4. [`Construction::PlainFallback`]: a bare error with `cause` and `errors`
//!    attached as plain fields.
//!
//! Metadata is copied by the caller after construction, whichever path ran.

use crate::models::{Construction, NormalizedError, SubErrors};
use crate::options::Options;
use crate::value::ErrorClass;
use std::sync::Arc;

/// Resolved shape of the `errors` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorsMode {
    None,
    List,
    Map,
    Single,
}

/// Everything the constructor needs except metadata.
pub(crate) struct Parts {
    pub(crate) name: String,
    pub(crate) message: String,
    pub(crate) stack: Option<String>,
    pub(crate) cause: Option<Arc<NormalizedError>>,
    pub(crate) errors: Option<SubErrors>,
    pub(crate) mode: ErrorsMode,
}

impl Parts {
    /// Parts with only a name and message.
    pub(crate) fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            cause: None,
            errors: None,
            mode: ErrorsMode::None,
        }
    }
}

/// Select a construction path and build the node.
pub(crate) fn construct(parts: Parts, options: &Options) -> NormalizedError {
    let (class, construction) = select(&parts, options);

    let mut err = NormalizedError::new(parts.name, parts.message).with_construction(class, construction);
    if let Some(stack) = parts.stack {
        err = err.with_stack(stack);
    }
    if let Some(cause) = parts.cause {
        err = err.with_cause(cause);
    }
    if let Some(errors) = parts.errors {
        err = err.with_errors(errors);
    }
    err
}

/// Pick the concrete class and construction path for `parts`.
///
/// Subclass lookup wins when enabled and the host constructs the name; then the
/// native multi-error or causal path; otherwise a plain error.
fn select(parts: &Parts, options: &Options) -> (ErrorClass, Construction) {
    let host = options.host();

    if options.enable_subclass_preservation() {
        if let Some(constructor) = host.constructor(&parts.name) {
            if constructor.is_error_type() {
                match constructor.construct(&parts.message) {
                    Ok(class) => return (class, Construction::Subclassed),
                    Err(err) => tracing::debug!(
                        name = %parts.name,
                        error = %err,
                        "subclass construction failed, falling back"
                    ),
                }
            }
        }
    }

    if matches!(parts.mode, ErrorsMode::List | ErrorsMode::Single)
        && options.use_native_multi_error()
        && host.supports_multi_error()
    {
        return (ErrorClass::AggregateError, Construction::NativeMultiError);
    }

    if parts.cause.is_some() && options.use_native_causal_chain() && host.supports_causal_chain() {
        return (ErrorClass::Error, Construction::NativeCausal);
    }

    (ErrorClass::Error, Construction::PlainFallback)
}
