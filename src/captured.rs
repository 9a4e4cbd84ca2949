//! Convenience exception type.
//!
//! [`CapturedError`] wraps a [`NormalizedError`] together with the options
//! it was captured with. Rendering reuses those options (depth ceiling, caps
//! and copier policy), and they live in a private field, so nothing about
//! them shows up in the error's metadata or in its rendered forms.

use crate::models::NormalizedError;
use crate::normalize::normalize_with;
use crate::options::{Options, Result, validate_max_depth};
use crate::value::Value;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// A normalized error that renders itself with the options it was captured
/// with.
///
/// # Example
///
/// ```rust
/// use shapeshift_errors::{CapturedError, Value, record};
///
/// let input: Value = record! {
///     "message" => "outer",
///     "cause" => record! { "message" => "inner" },
/// }
/// .into();
///
/// let captured = CapturedError::capture(&input).with_max_depth(1).unwrap();
/// assert_eq!(captured.message(), "outer");
/// assert_eq!(captured.to_text(), "Error: outer\n  [cause] [Max depth of 1 reached]");
/// ```
#[derive(Debug, Clone)]
pub struct CapturedError {
    error: NormalizedError,
    options: Options,
}

impl CapturedError {
    /// Normalize with the process-wide default options.
    pub fn capture(value: &Value) -> Self {
        Self::capture_with(value, Options::global())
    }

    /// Normalize with explicit options and keep them for rendering.
    pub fn capture_with(value: &Value, options: &Options) -> Self {
        Self {
            error: normalize_with(value, options),
            options: options.clone(),
        }
    }

    /// Replace the rendering ceiling. The normalized tree is not rebuilt.
    ///
    /// # Errors
    ///
    /// [`OptionsError::MaxDepthOutOfRange`](crate::OptionsError) when the
    /// ceiling is outside `1..=MAX_DEPTH_CEILING`.
    pub fn with_max_depth(mut self, max_depth: impl Into<i64>) -> Result<Self> {
        let max_depth = validate_max_depth(max_depth.into())?;
        self.options = self.options.with_max_depth(max_depth)?;
        Ok(self)
    }

    /// Depth ceiling used by [`to_text`](Self::to_text) and
    /// [`to_structured`](Self::to_structured).
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.options.max_depth()
    }

    /// Options used for rendering.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the wrapped error.
    #[inline]
    pub fn error(&self) -> &NormalizedError {
        &self.error
    }

    #[inline]
    pub fn into_inner(self) -> NormalizedError {
        self.error
    }

    /// Text form under the capture options.
    pub fn to_text(&self) -> String {
        self.error.to_text_with(&self.options)
    }

    /// Structured form under the capture options.
    pub fn to_structured(&self) -> serde_json::Value {
        self.error.to_structured_with(&self.options)
    }
}

impl From<NormalizedError> for CapturedError {
    fn from(error: NormalizedError) -> Self {
        Self {
            error,
            options: Options::global().clone(),
        }
    }
}

impl Deref for CapturedError {
    type Target = NormalizedError;

    fn deref(&self) -> &NormalizedError {
        &self.error
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.to_text())
        } else {
            fmt::Display::fmt(&self.error, f)
        }
    }
}

impl std::error::Error for CapturedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl Serialize for CapturedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_structured().serialize(serializer)
    }
}
