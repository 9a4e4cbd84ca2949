//! Per-call configuration and the process-wide default.
//!
//! [`Options`] is immutable once built and is threaded explicitly through
//! every call. The process-wide default is a read-only value installed at
//! most once at startup with [`Options::install_global`]; until then the
//! built-in defaults apply.
//!
//! # Example
//!
//! ```rust
//! use shapeshift_errors::Options;
//!
//! let options = Options::builder()
//!     .max_depth(4)
//!     .max_properties(64)
//!     .build()
//!     .expect("valid options");
//! assert_eq!(options.max_depth(), 4);
//!
//! assert!(Options::builder().max_depth(0).build().is_err());
//! ```

use crate::host::{ErrorHost, NativeHost};
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Default depth ceiling.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Largest accepted depth ceiling.
///
/// Normalization and rendering recurse once per level, so the ceiling is
/// sized for a 2 MiB thread stack in an unoptimized build, with room left
/// for metadata fan-out at every level.
pub const MAX_DEPTH_CEILING: usize = 200;

/// Default cap on metadata keys copied per record.
pub const DEFAULT_MAX_PROPERTIES: usize = 1000;

/// Default cap on elements copied per sequence.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 10_000;

/// Configuration errors. These are programmer errors and are reported
/// eagerly rather than absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// `max_depth` outside `1..=MAX_DEPTH_CEILING`.
    #[error("max_depth must be between 1 and {}, got {value}", MAX_DEPTH_CEILING)]
    MaxDepthOutOfRange { value: i64 },

    /// The process-wide default was already installed.
    #[error("global options are already installed")]
    GlobalAlreadyInstalled,
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, OptionsError>;

/// Validate a depth ceiling from any integer source.
pub fn validate_max_depth(value: i64) -> Result<usize> {
    match usize::try_from(value) {
        Ok(depth) if (1..=MAX_DEPTH_CEILING).contains(&depth) => Ok(depth),
        _ => Err(OptionsError::MaxDepthOutOfRange { value }),
    }
}

/// Normalization and rendering options.
#[derive(Clone)]
pub struct Options {
    max_depth: usize,
    max_properties: usize,
    max_array_length: usize,
    use_native_multi_error: bool,
    use_native_causal_chain: bool,
    enable_subclass_preservation: bool,
    include_non_enumerable: bool,
    include_symbol_keys: bool,
    stringify_symbol_keys: bool,
    host: Arc<dyn ErrorHost>,
}

static GLOBAL: OnceLock<Options> = OnceLock::new();

impl Options {
    /// Start a builder from the defaults.
    #[inline]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Builder seeded from these options.
    #[inline]
    pub fn to_builder(&self) -> OptionsBuilder {
        OptionsBuilder {
            max_depth: self.max_depth as i64,
            options: self.clone(),
        }
    }

    /// The process-wide default: installed options, or the built-in defaults.
    pub fn global() -> &'static Options {
        static BUILTIN: OnceLock<Options> = OnceLock::new();
        GLOBAL
            .get()
            .unwrap_or_else(|| BUILTIN.get_or_init(Options::default))
    }

    /// Install these options as the process-wide default. Succeeds once.
    pub fn install_global(self) -> Result<()> {
        GLOBAL
            .set(self)
            .map_err(|_| OptionsError::GlobalAlreadyInstalled)
    }

    /// Get the depth ceiling shared by normalization and both renderers.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Get the cap on copied and rendered properties per record.
    #[inline]
    pub fn max_properties(&self) -> usize {
        self.max_properties
    }

    /// Get the cap on array elements and list-mode sub-errors.
    #[inline]
    pub fn max_array_length(&self) -> usize {
        self.max_array_length
    }

    /// Whether multi-error nodes go through the host's native container.
    #[inline]
    pub fn use_native_multi_error(&self) -> bool {
        self.use_native_multi_error
    }

    /// Whether causes are attached through the host's native chaining.
    #[inline]
    pub fn use_native_causal_chain(&self) -> bool {
        self.use_native_causal_chain
    }

    /// Whether a host constructor matching the derived name is tried first.
    #[inline]
    pub fn enable_subclass_preservation(&self) -> bool {
        self.enable_subclass_preservation
    }

    /// Whether hidden own properties are copied.
    #[inline]
    pub fn include_non_enumerable(&self) -> bool {
        self.include_non_enumerable
    }

    /// Whether symbol keys are copied at all.
    #[inline]
    pub fn include_symbol_keys(&self) -> bool {
        self.include_symbol_keys
    }

    /// Whether copied symbol keys become `Symbol(desc)` text keys.
    #[inline]
    pub fn stringify_symbol_keys(&self) -> bool {
        self.stringify_symbol_keys
    }

    /// Get the host used for error construction.
    #[inline]
    pub fn host(&self) -> &dyn ErrorHost {
        self.host.as_ref()
    }

    /// Copy of these options with a different depth ceiling.
    pub fn with_max_depth(&self, max_depth: usize) -> Result<Self> {
        let max_depth = i64::try_from(max_depth).unwrap_or(i64::MAX);
        self.to_builder().max_depth(max_depth).build()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_properties: DEFAULT_MAX_PROPERTIES,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            use_native_multi_error: true,
            use_native_causal_chain: true,
            enable_subclass_preservation: true,
            include_non_enumerable: true,
            include_symbol_keys: true,
            stringify_symbol_keys: false,
            host: NativeHost::shared(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("max_depth", &self.max_depth)
            .field("max_properties", &self.max_properties)
            .field("max_array_length", &self.max_array_length)
            .field("use_native_multi_error", &self.use_native_multi_error)
            .field("use_native_causal_chain", &self.use_native_causal_chain)
            .field("enable_subclass_preservation", &self.enable_subclass_preservation)
            .field("include_non_enumerable", &self.include_non_enumerable)
            .field("include_symbol_keys", &self.include_symbol_keys)
            .field("stringify_symbol_keys", &self.stringify_symbol_keys)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for [`Options`]. Validation happens once, in
/// [`OptionsBuilder::build`].
#[derive(Clone)]
pub struct OptionsBuilder {
    // Kept signed so out-of-range input from loosely typed sources is
    // reported instead of wrapped.
    max_depth: i64,
    options: Options,
}

impl OptionsBuilder {
    /// Builder seeded with the defaults.
    #[inline]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH as i64,
            options: Options::default(),
        }
    }

    /// Depth ceiling, `1..=MAX_DEPTH_CEILING`.
    #[inline]
    pub fn max_depth(mut self, max_depth: impl Into<i64>) -> Self {
        self.max_depth = max_depth.into();
        self
    }

    /// Cap properties per record. Zero copies nothing.
    #[inline]
    pub fn max_properties(mut self, max_properties: usize) -> Self {
        self.options.max_properties = max_properties;
        self
    }

    /// Cap array elements and list-mode sub-errors.
    #[inline]
    pub fn max_array_length(mut self, max_array_length: usize) -> Self {
        self.options.max_array_length = max_array_length;
        self
    }

    /// Toggle the host's native multi-error container.
    #[inline]
    pub fn use_native_multi_error(mut self, enabled: bool) -> Self {
        self.options.use_native_multi_error = enabled;
        self
    }

    /// Toggle the host's native cause chaining.
    #[inline]
    pub fn use_native_causal_chain(mut self, enabled: bool) -> Self {
        self.options.use_native_causal_chain = enabled;
        self
    }

    /// Toggle subclass lookup by derived name.
    #[inline]
    pub fn enable_subclass_preservation(mut self, enabled: bool) -> Self {
        self.options.enable_subclass_preservation = enabled;
        self
    }

    /// Toggle copying of hidden own properties.
    #[inline]
    pub fn include_non_enumerable(mut self, enabled: bool) -> Self {
        self.options.include_non_enumerable = enabled;
        self
    }

    /// Toggle copying of symbol keys.
    #[inline]
    pub fn include_symbol_keys(mut self, enabled: bool) -> Self {
        self.options.include_symbol_keys = enabled;
        self
    }

    /// Convert symbol keys to `Symbol(desc)` text when copying metadata.
    #[inline]
    pub fn stringify_symbol_keys(mut self, enabled: bool) -> Self {
        self.options.stringify_symbol_keys = enabled;
        self
    }

    /// Capability probes and constructor registry.
    #[inline]
    pub fn host(mut self, host: Arc<dyn ErrorHost>) -> Self {
        self.options.host = host;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Options> {
        let mut options = self.options;
        options.max_depth = validate_max_depth(self.max_depth)?;
        Ok(options)
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
