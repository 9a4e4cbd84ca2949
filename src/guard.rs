//! Traversal guards: identity-based cycle detection and the depth ceiling.
//!
//! Both guards are allocated fresh for every top-level call (normalization or
//! rendering) and never escape it.

use crate::models::NormalizedError;
use crate::value::Object;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Marker substituted for a value already seen in the current traversal.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Values with a stable identity for the lifetime of a traversal.
pub trait Identity: Clone {
    fn identity(&self) -> usize;
}

impl Identity for Object {
    #[inline]
    fn identity(&self) -> usize {
        Object::identity(self)
    }
}

impl Identity for &NormalizedError {
    #[inline]
    fn identity(&self) -> usize {
        *self as *const NormalizedError as usize
    }
}

/// Identity set of reference values seen during one traversal.
///
/// Entries are never removed: a shared subgraph reached a second time is
/// reported as circular. Each entry keeps its value alive, so an address
/// cannot be recycled mid-walk and produce a false positive.
pub struct VisitedSet<T: Identity> {
    seen: HashMap<usize, T>,
}

impl<T: Identity> VisitedSet<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// Register a value before descending into it.
    ///
    /// Returns `true` if it was already seen, in which case the caller must
    /// substitute [`CIRCULAR_MARKER`] instead of descending.
    pub fn enter(&mut self, value: &T) -> bool {
        match self.seen.entry(value.identity()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                false
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<T: Identity> Default for VisitedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive depth ceiling: the root is depth 0, and any node at
/// `depth >= max_depth` is replaced by a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthGovernor {
    max_depth: usize,
}

impl DepthGovernor {
    #[inline]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Get the ceiling.
    #[inline]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether a node at `depth` must be replaced by the marker.
    #[inline]
    pub const fn at_limit(&self, depth: usize) -> bool {
        depth >= self.max_depth
    }

    /// Text substituted for a subtree past the ceiling.
    #[inline]
    pub fn marker(&self) -> String {
        depth_marker(self.max_depth)
    }
}

/// `"[Max depth of N reached]"`.
#[inline]
pub fn depth_marker(max_depth: usize) -> String {
    format!("[Max depth of {max_depth} reached]")
}
