//! Integration tests for Layer 1: Weaver
//!
//! Tests weaving passes and the behaviour of intercepting wrappers.

use std::cell::RefCell;

use calltrace_foundation::Value;
use calltrace_weaver::{Advice, AdviceToken, CallDescriptor};

mod interception;
mod weaving;

/// Advice that records every callback.
#[derive(Default)]
pub struct Recorder {
    pub calls: RefCell<Vec<CallDescriptor>>,
    pub returns: RefCell<Vec<(AdviceToken, Value)>>,
}

impl Recorder {
    /// Names of the reported calls, in order.
    pub fn names(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.name.to_string()).collect()
    }
}

impl Advice for Recorder {
    fn before(&self, call: &CallDescriptor) -> AdviceToken {
        let mut calls = self.calls.borrow_mut();
        calls.push(call.clone());
        AdviceToken(calls.len() as u64)
    }

    fn after(&self, token: AdviceToken, result: &Value) {
        self.returns.borrow_mut().push((token, result.clone()));
    }
}
