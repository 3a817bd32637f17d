//! Nodes of the call tree.

use std::sync::Arc;

use calltrace_foundation::Value;
use calltrace_weaver::CallDescriptor;

/// Index of a frame in the model's frame sequence. The root is `0`.
pub type FrameId = usize;

/// Identifier of the synthetic root frame.
pub const ROOT: FrameId = 0;

/// One traced invocation or reconstructed caller.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Arrival order, dense from 0 (the root).
    pub id: FrameId,
    /// Qualified name of the callable.
    pub name: Arc<str>,
    /// Arguments captured at call time.
    pub args: Vec<Value>,
    /// Nesting level at emission time; 0 only for the root.
    pub depth: u32,
    /// True if inferred from the call stack rather than entered directly.
    pub reconstructed: bool,
    /// Free-text note attached after creation.
    pub annotation: Option<String>,
    /// The frame this one was attached under. Set once.
    pub parent: Option<FrameId>,
    /// Children in arrival order.
    pub children: Vec<FrameId>,
}

impl CallFrame {
    /// Creates a detached frame.
    #[must_use]
    pub fn new(id: FrameId, name: Arc<str>, args: Vec<Value>, depth: u32, reconstructed: bool) -> Self {
        Self {
            id,
            name,
            args,
            depth,
            reconstructed,
            annotation: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Creates the synthetic root.
    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT, Arc::from(""), Vec::new(), 0, false)
    }

    /// Creates a frame from an advice descriptor.
    #[must_use]
    pub fn from_descriptor(id: FrameId, call: &CallDescriptor) -> Self {
        Self::new(id, Arc::clone(&call.name), call.args.clone(), call.depth, call.reconstructed)
    }

    /// Returns true for the synthetic root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    /// Returns true if any frame was attached under this one.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
