//! Trace assembly and display for calltrace.
//!
//! This crate provides:
//! - [`TracerAdvice`] - Advice that forwards calls as [`Notification`]s
//! - [`TraceModel`] - The call tree built from notifications
//! - [`TreeRenderer`] - Lazy stack/flat rendering of the tree
//! - [`ValueFormatter`] - Bounded text rendering of argument values
//! - [`TraceConsole`] - The host-facing facade with debounced rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod console;
pub mod debounce;
pub mod format;
pub mod render;
pub mod trace;
pub mod tracer;

pub use config::{ConsoleConfig, DisplayMode};
pub use console::{LatestStatus, NullStatus, StatusSink, TraceConsole, status_text};
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use format::{
    RECONSTRUCTED_MARK, UNKNOWN_NAME, ValueFormatter, Verbosity, format_frame, function_name,
};
pub use render::TreeRenderer;
pub use trace::{CallFrame, FrameId, NotifyOutcome, ROOT, TraceModel};
pub use tracer::{Notification, NotificationSink, TracerAdvice};
