//! Advice that forwards calls into a trace.

use std::cell::Cell;
use std::rc::Rc;

use calltrace_foundation::Value;
use calltrace_weaver::{Advice, AdviceToken, CallDescriptor};

/// A payload delivered to a [`NotificationSink`].
#[derive(Clone, Debug)]
pub enum Notification {
    /// A call entered (or reconstructed).
    Call(CallDescriptor),
    /// A free-text note for the most recent frames.
    Annotation(String),
}

/// Receiver of trace notifications.
pub trait NotificationSink {
    /// Delivers one notification.
    fn notify(&self, notification: Notification);
}

/// [`Advice`] that reports every call to a sink.
///
/// `after` does nothing; the trace records entries only.
pub struct TracerAdvice {
    sink: Rc<dyn NotificationSink>,
    issued: Cell<u64>,
}

impl TracerAdvice {
    /// Creates advice reporting to `sink`.
    #[must_use]
    pub fn new(sink: Rc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            issued: Cell::new(0),
        }
    }

    /// Pushes a free-text annotation into the trace.
    pub fn annotate(&self, text: impl Into<String>) {
        self.sink.notify(Notification::Annotation(text.into()));
    }

    /// Returns the number of calls reported so far.
    #[must_use]
    pub fn calls_reported(&self) -> u64 {
        self.issued.get()
    }
}

impl Advice for TracerAdvice {
    fn before(&self, call: &CallDescriptor) -> AdviceToken {
        let token = self.issued.get() + 1;
        self.issued.set(token);
        self.sink.notify(Notification::Call(call.clone()));
        AdviceToken(token)
    }
}
