//! Core value model for calltrace.
//!
//! This crate provides:
//! - [`Value`] - Dynamically typed program data
//! - [`Object`] - Shared composites whose members can be replaced in place
//! - [`Function`] - Callables with names, statics, and a woven marker
//! - [`Context`] - The cooperative call stack every call goes through
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod error;
pub mod function;
pub mod object;
pub mod value;

pub use context::{ActiveCall, Context};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use function::{Function, FunctionBuilder, NativeBody};
pub use object::{Accessor, Object, Slot};
pub use value::Value;
