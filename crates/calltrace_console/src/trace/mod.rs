//! The call tree assembled from advice notifications.

pub mod frame;
pub mod model;

pub use frame::{CallFrame, FrameId, ROOT};
pub use model::{NotifyOutcome, TraceModel};
