//! Error types for the calltrace system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// Result type for calltrace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for calltrace operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an error raised by the traced program itself, carrying a value.
    #[must_use]
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Thrown(value.into()))
    }

    /// Creates a "not callable" error.
    #[must_use]
    pub fn not_callable(name: impl Into<String>, actual: &'static str) -> Self {
        Self::new(ErrorKind::NotCallable {
            name: name.into(),
            actual,
        })
    }

    /// Creates a missing member error.
    #[must_use]
    pub fn member_not_found(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::MemberNotFound(name.into()))
    }

    /// Creates a member access (faulting accessor) error.
    #[must_use]
    pub fn member_access(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MemberAccess {
            name: name.into(),
            message: message.into(),
        })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates an invalid blacklist pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        })
    }

    /// Returns the value carried by a program-level failure, if any.
    #[must_use]
    pub fn thrown_value(&self) -> Option<&Value> {
        match &self.kind {
            ErrorKind::Thrown(value) => Some(value),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err.to_string()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The traced program raised a failure carrying a value.
    #[error("uncaught: {0}")]
    Thrown(Value),

    /// Attempted to call something that is not a function.
    #[error("{name} is not callable (got {actual})")]
    NotCallable {
        /// The member or expression that was called.
        name: String,
        /// The runtime kind of the value found instead.
        actual: &'static str,
    },

    /// Member was not found on an object.
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// Reading a member failed (guarded or faulting accessor).
    #[error("cannot read member {name}: {message}")]
    MemberAccess {
        /// The member name.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// Wrong number of arguments to function.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// A blacklist pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// I/O failure in the host.
    #[error("io error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Qualified name of the callable being executed.
    pub source: Option<String>,
    /// Call stack at the time of the error, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source callable.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
