//! REPL, CLI, and demo program for calltrace.
//!
//! This crate provides:
//! - [`Repl`] - Interactive trace console driven by text commands
//! - [`Session`] - A woven demo program wired to a trace console
//! - [`demo`] - The demo program and its scenarios

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod demo;
pub mod editor;
pub mod repl;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{Command, CommandError, Repl};
pub use session::{Session, SessionConfig};
