//! Text renderer.
//!
//! # Layout
//!
//! ```text
//! DbError: connection lost
//!     at connect (db.rs:10:5)
//!   host: "db.internal"
//!   [cause] Error: socket closed
//!     errno: -104
//!   [errors] [
//!     TypeError: a
//!     Error: b
//!   ]
//! ```
//!
//! - The header is `Name: message`, or just `Name` for an empty message.
//! - Up to three stack lines follow at the root only. A first line that
//!   repeats the header is skipped.
//! - Body lines indent two spaces per level: metadata as `key: value`, then
//!   `[cause]`, then `[errors]`.
//! - Metadata values are inline. Arrays and records longer than
//!   [`INLINE_THRESHOLD`] are summarized as `[[Array(n)]]` and
//!   `{Object with n keys}`; nested errors show as `[Name: message]`.
//!
//! The renderer runs its own depth governor and visited set. List items and
//! map values both sit one level below their parent, mirroring
//! normalization.

use crate::guard::{CIRCULAR_MARKER, DepthGovernor, VisitedSet, depth_marker};
use crate::metadata::warn_truncated;
use crate::models::{MetaValue, NormalizedError, SubErrors};
use crate::options::Options;
use crate::value::format_number;
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Arrays and records with more entries than this are summarized.
pub const INLINE_THRESHOLD: usize = 3;

/// Longest inline string, in bytes, before truncation.
pub const MAX_INLINE_STRING_LEN: usize = 200;

const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

const STACK_LINES: usize = 3;

impl NormalizedError {
    /// Render with the process-wide default options.
    pub fn to_text(&self) -> String {
        self.to_text_with(Options::global())
    }

    /// Render with an explicit depth ceiling and caps.
    ///
    /// The tree is walked again under `options`, so a lower ceiling or
    /// tighter caps than the ones used at normalization still apply here.
    /// Truncation is reported through `tracing`, never in the text.
    pub fn to_text_with(&self, options: &Options) -> String {
        let mut out = String::new();
        // Writing into a `String` never fails.
        let _ = self.write_text(&mut out, options);
        out
    }

    /// Stream the text form into `out`.
    pub(crate) fn write_text<W: Write + ?Sized>(&self, out: &mut W, options: &Options) -> fmt::Result {
        TextRenderer::new(options).root(out, self)
    }
}

/// One text rendering pass.
///
/// Visited tracking is by node identity: a node reached a second time is
/// written as the circular marker.
struct TextRenderer<'t> {
    governor: DepthGovernor,
    visited: VisitedSet<&'t NormalizedError>,
    max_properties: usize,
    max_array_length: usize,
}

impl<'t> TextRenderer<'t> {
    fn new(options: &Options) -> Self {
        Self {
            governor: DepthGovernor::new(options.max_depth()),
            visited: VisitedSet::new(),
            max_properties: options.max_properties(),
            max_array_length: options.max_array_length(),
        }
    }

    /// Header, root-only stack lines, then the body at depth 0.
    fn root<W: Write + ?Sized>(&mut self, out: &mut W, err: &'t NormalizedError) -> fmt::Result {
        self.visited.enter(&err);
        let header = err.header();
        out.write_str(&header)?;
        if let Some(stack) = err.stack() {
            write_stack(out, &header, stack)?;
        }
        self.body(out, err, 0, 1)
    }

    /// A nested node, written after a label on the current line.
    fn node<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        err: &'t NormalizedError,
        depth: usize,
        level: usize,
    ) -> fmt::Result {
        if self.governor.at_limit(depth) {
            return out.write_str(&self.governor.marker());
        }
        if self.visited.enter(&err) {
            return out.write_str(CIRCULAR_MARKER);
        }
        out.write_str(&err.header())?;
        self.body(out, err, depth, level + 1)
    }

    /// Metadata, cause and errors of a node at `depth`, indented to `level`.
    fn body<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        err: &'t NormalizedError,
        depth: usize,
        level: usize,
    ) -> fmt::Result {
        let metadata = err.metadata();
        if metadata.len() > self.max_properties {
            warn_truncated("rendered properties", self.max_properties, metadata.len());
        }
        for (key, value) in metadata.iter().take(self.max_properties) {
            newline(out, level)?;
            write!(out, "{key}: ")?;
            self.inline(out, value, depth + 1)?;
        }

        if let Some(cause) = err.cause() {
            newline(out, level)?;
            out.write_str("[cause] ")?;
            self.node(out, cause, depth + 1, level)?;
        }

        match err.errors() {
            Some(SubErrors::List(items)) => {
                newline(out, level)?;
                out.write_str("[errors] [")?;
                if items.len() > self.max_array_length {
                    warn_truncated("rendered errors", self.max_array_length, items.len());
                }
                for item in items.iter().take(self.max_array_length) {
                    newline(out, level + 1)?;
                    self.node(out, item, depth + 1, level + 1)?;
                }
                if !items.is_empty() {
                    newline(out, level)?;
                }
                out.write_char(']')?;
            }
            Some(SubErrors::Map(entries)) => {
                newline(out, level)?;
                out.write_str("[errors] {")?;
                if entries.len() > self.max_properties {
                    warn_truncated("rendered errors", self.max_properties, entries.len());
                }
                for (key, item) in entries.iter().take(self.max_properties) {
                    newline(out, level + 1)?;
                    write!(out, "{key}: ")?;
                    self.node(out, item, depth + 1, level + 1)?;
                }
                if !entries.is_empty() {
                    newline(out, level)?;
                }
                out.write_char('}')?;
            }
            None => {}
        }
        Ok(())
    }

    /// Short single-line form of a metadata value at `depth`.
    fn inline<W: Write + ?Sized>(&mut self, out: &mut W, value: &'t MetaValue, depth: usize) -> fmt::Result {
        if self.governor.at_limit(depth) {
            return out.write_str(&self.governor.marker());
        }
        match value {
            MetaValue::Undefined => out.write_str("undefined"),
            MetaValue::Null => out.write_str("null"),
            MetaValue::Bool(b) => write!(out, "{b}"),
            MetaValue::Number(n) => out.write_str(&format_number(*n)),
            MetaValue::BigInt(n) => write!(out, "{n}n"),
            MetaValue::String(s) => {
                let quoted = serde_json::Value::from(truncate_with_indicator(s, MAX_INLINE_STRING_LEN));
                write!(out, "{quoted}")
            }
            MetaValue::Symbol(symbol) => write!(out, "{symbol}"),
            MetaValue::Array(items) if items.len() > INLINE_THRESHOLD => {
                write!(out, "[[Array({})]]", items.len())
            }
            MetaValue::Array(items) => {
                out.write_char('[')?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.write_str(", ")?;
                    }
                    self.inline(out, item, depth + 1)?;
                }
                out.write_char(']')
            }
            MetaValue::Record(record) if record.len() > INLINE_THRESHOLD => {
                write!(out, "{{Object with {} keys}}", record.len())
            }
            MetaValue::Record(record) if record.is_empty() => out.write_str("{}"),
            MetaValue::Record(record) => {
                out.write_str("{ ")?;
                for (idx, (key, item)) in record.iter().enumerate() {
                    if idx > 0 {
                        out.write_str(", ")?;
                    }
                    write!(out, "{key}: ")?;
                    self.inline(out, item, depth + 1)?;
                }
                out.write_str(" }")
            }
            MetaValue::Error(err) => {
                if self.visited.enter(&err.as_ref()) {
                    out.write_str(CIRCULAR_MARKER)
                } else {
                    write!(out, "[{}]", err.header())
                }
            }
            MetaValue::Circular => out.write_str(CIRCULAR_MARKER),
            MetaValue::MaxDepth(max_depth) => out.write_str(&depth_marker(*max_depth)),
        }
    }
}

/// Line break followed by two spaces per level.
fn newline<W: Write + ?Sized>(out: &mut W, level: usize) -> fmt::Result {
    out.write_char('\n')?;
    for _ in 0..level {
        out.write_str("  ")?;
    }
    Ok(())
}

fn write_stack<W: Write + ?Sized>(out: &mut W, header: &str, stack: &str) -> fmt::Result {
    let mut frames = stack.lines().map(str::trim).filter(|line| !line.is_empty()).peekable();
    if frames.peek().is_some_and(|first| *first == header) {
        frames.next();
    }
    for frame in frames.take(STACK_LINES) {
        out.write_str("\n    ")?;
        out.write_str(frame)?;
    }
    Ok(())
}

/// Truncate to at most `max_len` bytes on a char boundary, marking the cut.
fn truncate_with_indicator(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.len() <= max_len {
        return Cow::Borrowed(s);
    }

    let mut idx = max_len.saturating_sub(TRUNCATION_INDICATOR.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    let mut truncated = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    truncated.push_str(&s[..idx]);
    truncated.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(truncated)
}
