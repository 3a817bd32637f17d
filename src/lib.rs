//! calltrace - Function call tracer with a live call-tree console
//!
//! This crate re-exports all layers of the calltrace system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: calltrace_runtime    - REPL, CLI, demo program
//! Layer 2: calltrace_console    - Trace model, tree renderer, value formatting
//! Layer 1: calltrace_weaver     - Weaving, interception, ancestor reconstruction
//! Layer 0: calltrace_foundation - Core types (Value, Object, Function, Context, Error)
//! ```

pub use calltrace_console as console;
pub use calltrace_foundation as foundation;
pub use calltrace_runtime as runtime;
pub use calltrace_weaver as weaver;
