//! Cooperative call-context stack.
//!
//! Every call made through [`Context::call`] is pushed on entry and popped
//! on exit, whether the callee returns or fails. The stack is what the
//! weaver walks to reconstruct the un-instrumented callers of an
//! instrumented function.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::function::Function;
use crate::value::Value;

/// One in-progress call.
#[derive(Clone, Debug)]
pub struct ActiveCall {
    /// Serial number of this invocation, unique within its context.
    pub id: u64,
    /// The function being executed.
    pub function: Function,
    /// Arguments it was called with.
    pub args: Vec<Value>,
}

/// Handle to the call stack of one logical thread of execution.
///
/// Cloning the handle shares the stack.
#[derive(Clone, Default)]
pub struct Context {
    state: Rc<ContextState>,
}

#[derive(Default)]
struct ContextState {
    stack: RefCell<Vec<ActiveCall>>,
    next_id: Cell<u64>,
}

/// Pops the frame pushed by [`Context::call`] when dropped.
struct FrameGuard<'a> {
    stack: &'a RefCell<Vec<ActiveCall>>,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl Context {
    /// Creates a context with an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `function` with `this` and `args`, recording the call on the
    /// stack for its duration.
    ///
    /// # Errors
    ///
    /// Propagates the callee's error unchanged.
    pub fn call(&self, function: &Function, this: &Value, args: &[Value]) -> Result<Value> {
        let id = self.state.next_id.get() + 1;
        self.state.next_id.set(id);
        self.state.stack.borrow_mut().push(ActiveCall {
            id,
            function: function.clone(),
            args: args.to_vec(),
        });
        let _guard = FrameGuard {
            stack: &self.state.stack,
        };
        function.invoke(self, this, args)
    }

    /// Calls a value, failing if it is not a function.
    ///
    /// # Errors
    ///
    /// Returns an error if `callee` is not callable, or propagates the
    /// callee's error.
    pub fn call_value(&self, name: &str, callee: &Value, this: &Value, args: &[Value]) -> Result<Value> {
        match callee {
            Value::Fn(function) => self.call(function, this, args),
            other => Err(Error::not_callable(name, other.type_name())),
        }
    }

    /// Looks up `name` on `receiver` and calls it with `receiver` as `this`.
    ///
    /// The lookup happens at call time, so a member replaced by the weaver
    /// is called through its wrapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the member is missing or not callable, or
    /// propagates the callee's error.
    pub fn call_method(&self, receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
        let callee = receiver.get(name)?;
        self.call_value(name, &callee, receiver, args)
    }

    /// Returns the current stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.stack.borrow().len()
    }

    /// Returns a snapshot of the stack, outermost call first.
    #[must_use]
    pub fn frames(&self) -> Vec<ActiveCall> {
        self.state.stack.borrow().clone()
    }
}
