//! Best-effort reconstruction of un-instrumented callers.
//!
//! When an instrumented function runs, the callers between it and the
//! nearest instrumented ancestor were never reported. They are recovered
//! by walking the cooperative call stack outward from the caller.

use std::sync::Arc;

use calltrace_foundation::{Context, Function, Value};

/// Name recorded when the walk hits the ancestor limit.
pub const TOO_DEEP: &str = "*** stack too deep, stopping";

/// Name recorded when a function reappears during the walk.
pub const RECURSION: &str = "*** recursion, stopping";

/// Name used for callers without a declared name.
pub const ANONYMOUS: &str = "<anonymous>";

/// One reconstructed caller.
#[derive(Clone, Debug)]
pub struct AncestorFrame {
    /// Serial number of the invocation on the call stack.
    pub call_id: u64,
    /// The calling function.
    pub function: Function,
    /// Display name (or a sentinel marker).
    pub name: Arc<str>,
    /// Arguments of the invocation.
    pub args: Vec<Value>,
}

impl AncestorFrame {
    /// Returns true if this is a sentinel marking a truncated walk.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        &*self.name == TOO_DEEP || &*self.name == RECURSION
    }
}

/// Collects the un-instrumented callers of the innermost call on `ctx`,
/// outermost first.
///
/// The innermost frame (the instrumented call itself) is skipped. The walk
/// stops at the first woven frame, after `limit` frames (recording a
/// [`TOO_DEEP`] sentinel), or when a function already seen in this walk
/// reappears (recording a [`RECURSION`] sentinel).
#[must_use]
pub fn reconstruct(ctx: &Context, limit: usize) -> Vec<AncestorFrame> {
    let calls = ctx.frames();
    let mut collected: Vec<AncestorFrame> = Vec::new();

    for call in calls.iter().rev().skip(1) {
        if call.function.is_woven() {
            break;
        }

        let sentinel = if collected.len() >= limit {
            Some(TOO_DEEP)
        } else if collected.iter().any(|f| f.function.ptr_eq(&call.function)) {
            Some(RECURSION)
        } else {
            None
        };

        let name: Arc<str> = match sentinel {
            Some(marker) => marker.into(),
            None => call.function.name().unwrap_or(ANONYMOUS).into(),
        };

        collected.push(AncestorFrame {
            call_id: call.id,
            function: call.function.clone(),
            name,
            args: call.args.clone(),
        });

        if sentinel.is_some() {
            break;
        }
    }

    collected.reverse();
    collected
}

/// Returns the length of the common prefix of two walks, comparing
/// invocations rather than functions.
#[must_use]
pub fn common_prefix(previous: &[AncestorFrame], current: &[AncestorFrame]) -> usize {
    previous
        .iter()
        .zip(current)
        .take_while(|(a, b)| a.call_id == b.call_id)
        .count()
}
