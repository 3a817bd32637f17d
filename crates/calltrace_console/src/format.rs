//! Bounded text rendering of runtime values and trace frames.
//!
//! Formatting never fails: anything that cannot be enumerated collapses to
//! a `{kind}` placeholder.

use std::fmt::Write;
use std::sync::LazyLock;

use calltrace_foundation::{Function, Object, Value};
use regex::Regex;

use crate::config::{DEFAULT_TEXT_KEEP, DEFAULT_TEXT_LIMIT};
use crate::trace::CallFrame;

/// Placeholder used when a function's name cannot be recovered.
pub const UNKNOWN_NAME: &str = "{?}";

static SOURCE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:fn|function)\s+([^\s(]+)").ok());

// =============================================================================
// Verbosity
// =============================================================================

/// Formatting verbosity toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Enumerate the members of composite arguments.
    pub detailed: bool,
    /// Enumerate composites and disable all truncation.
    pub exhaustive: bool,
}

impl Verbosity {
    /// Neither toggle set.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            detailed: false,
            exhaustive: false,
        }
    }

    /// Composite enumeration with truncation.
    #[must_use]
    pub const fn detailed() -> Self {
        Self {
            detailed: true,
            exhaustive: false,
        }
    }

    /// Composite enumeration without truncation.
    #[must_use]
    pub const fn exhaustive() -> Self {
        Self {
            detailed: false,
            exhaustive: true,
        }
    }

    /// Returns true if composite members should be listed.
    #[must_use]
    pub const fn enumerates(self) -> bool {
        self.detailed || self.exhaustive
    }
}

// =============================================================================
// Value Formatter
// =============================================================================

/// Renders values into bounded, human-readable text.
#[derive(Clone, Debug)]
pub struct ValueFormatter {
    verbosity: Verbosity,
    limit: usize,
    keep: usize,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(Verbosity::plain())
    }
}

impl ValueFormatter {
    /// Creates a formatter with the default truncation limits.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            limit: DEFAULT_TEXT_LIMIT,
            keep: DEFAULT_TEXT_KEEP,
        }
    }

    /// Builder method to set the truncation limits.
    #[must_use]
    pub fn with_limits(mut self, limit: usize, keep: usize) -> Self {
        self.limit = limit;
        self.keep = keep.min(limit);
        self
    }

    /// Returns the verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Replaces the verbosity.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// Formats one value.
    #[must_use]
    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::String(s) => self.quote(s),
            Value::Fn(f) => format!("function {}()", function_name(f)),
            Value::Object(obj) if self.verbosity.enumerates() => self
                .enumerate(obj)
                .unwrap_or_else(|| placeholder(value)),
            Value::Object(_) => placeholder(value),
        }
    }

    /// Formats an argument list, comma separated.
    #[must_use]
    pub fn format_args(&self, args: &[Value]) -> String {
        args.iter()
            .map(|a| self.format(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Truncates `text` to the configured limit unless exhaustive.
    #[must_use]
    pub fn truncate(&self, text: &str) -> String {
        if self.verbosity.exhaustive || text.chars().count() <= self.limit {
            return text.to_string();
        }
        let mut out: String = text.chars().take(self.keep).collect();
        out.push_str("...");
        out
    }

    fn quote(&self, text: &str) -> String {
        format!("'{}'", self.truncate(text))
    }

    /// Lists own and inherited members one level deep. Returns `None` if any
    /// member read fails.
    fn enumerate(&self, obj: &Object) -> Option<String> {
        let mut entries = Vec::new();
        for key in obj.keys() {
            let member = obj.get(&key).ok()?;
            let text = match &member {
                Value::Nil | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {
                    self.format(&member)
                }
                Value::Fn(_) | Value::Object(_) => placeholder(&member),
            };
            entries.push(format!("{key}:{text}"));
        }
        Some(format!("{{{}}}", self.truncate(&entries.join(", "))))
    }
}

fn placeholder(value: &Value) -> String {
    format!("{{{}}}", value.type_name())
}

/// Recovers a display name for a function: its declared name, else a name
/// matched from its source text, else [`UNKNOWN_NAME`].
#[must_use]
pub fn function_name(function: &Function) -> String {
    if let Some(name) = function.name().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    function
        .source()
        .and_then(|source| {
            SOURCE_NAME
                .as_ref()?
                .captures(source)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

// =============================================================================
// Frame Labels
// =============================================================================

/// Prefix marking reconstructed frames in uncolored output.
pub const RECONSTRUCTED_MARK: char = '~';

/// Formats a frame as `id name(args)` followed by any annotation.
///
/// With `color`, the name is bold for entered calls and italic for
/// reconstructed ones. Without it, reconstructed names carry
/// [`RECONSTRUCTED_MARK`].
#[must_use]
pub fn format_frame(frame: &CallFrame, formatter: &ValueFormatter, color: bool) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} ", frame.id);
    match (color, frame.reconstructed) {
        (false, false) => out.push_str(&frame.name),
        (false, true) => {
            out.push(RECONSTRUCTED_MARK);
            out.push_str(&frame.name);
        }
        (true, false) => {
            let _ = write!(out, "\x1b[1m{}\x1b[0m", frame.name);
        }
        (true, true) => {
            let _ = write!(out, "\x1b[3m{}\x1b[0m", frame.name);
        }
    }
    let _ = write!(out, "({})", formatter.format_args(&frame.args));
    if let Some(note) = &frame.annotation {
        let _ = write!(out, "    ***** {note} *****");
    }
    out
}
