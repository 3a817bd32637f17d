//! The before/after contract invoked around every instrumented call.

use std::sync::Arc;

use calltrace_foundation::Value;

/// Description of one call reported to [`Advice::before`].
#[derive(Clone, Debug)]
pub struct CallDescriptor {
    /// Qualified name of the callable (`namespace.member`), or the caller's
    /// own name for reconstructed frames.
    pub name: Arc<str>,
    /// Argument values captured at call time.
    pub args: Vec<Value>,
    /// Nesting level at emission time, starting at 1.
    pub depth: u32,
    /// True if the frame was inferred from the call stack rather than
    /// recorded at its entry point. Such frames never get an `after`.
    pub reconstructed: bool,
}

impl CallDescriptor {
    /// Creates a descriptor for a directly entered call.
    #[must_use]
    pub fn entered(name: impl Into<Arc<str>>, args: Vec<Value>, depth: u32) -> Self {
        Self {
            name: name.into(),
            args,
            depth,
            reconstructed: false,
        }
    }

    /// Creates a descriptor for a reconstructed ancestor.
    #[must_use]
    pub fn reconstructed(name: impl Into<Arc<str>>, args: Vec<Value>, depth: u32) -> Self {
        Self {
            name: name.into(),
            args,
            depth,
            reconstructed: true,
        }
    }
}

/// Opaque value returned by `before` and handed back to `after`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AdviceToken(pub u64);

/// Callbacks run around instrumented calls.
///
/// The weaver never invokes advice while another advice callback from the
/// same weaver is running, and instrumented calls made from inside advice
/// bypass instrumentation entirely.
pub trait Advice {
    /// Called before an instrumented call (and once for every newly
    /// discovered reconstructed ancestor).
    fn before(&self, call: &CallDescriptor) -> AdviceToken;

    /// Called after an instrumented call returns normally.
    fn after(&self, _token: AdviceToken, _result: &Value) {}
}

/// Advice that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAdvice;

impl Advice for NoopAdvice {
    fn before(&self, _call: &CallDescriptor) -> AdviceToken {
        AdviceToken::default()
    }
}
