//! Integration tests for Layer 2: Console
//!
//! Tests the trace model, value formatting, and tree rendering.

use calltrace_console::Notification;
use calltrace_weaver::CallDescriptor;

mod formatting;
mod model;

/// An entered-call notification.
pub fn call(name: &str, depth: u32) -> Notification {
    Notification::Call(CallDescriptor::entered(name, Vec::new(), depth))
}

/// A reconstructed-caller notification.
pub fn ancestor(name: &str, depth: u32) -> Notification {
    Notification::Call(CallDescriptor::reconstructed(name, Vec::new(), depth))
}
