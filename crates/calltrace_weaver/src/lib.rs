//! Function interception for calltrace.
//!
//! This crate provides:
//! - [`Weaver`] - Replaces function members of a live object graph with
//!   instrumented wrappers
//! - [`Advice`] - The before/after contract wrappers report to
//! - [`Blacklist`] - Name patterns excluded from weaving
//! - [`stack`] - Reconstruction of un-instrumented callers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod advice;
pub mod blacklist;
pub mod config;
pub mod stack;
pub mod weaver;

pub use advice::{Advice, AdviceToken, CallDescriptor, NoopAdvice};
pub use blacklist::Blacklist;
pub use config::{DEFAULT_ANCESTOR_LIMIT, DEFAULT_MAX_DEPTH, WeaverConfig};
pub use stack::{ANONYMOUS, AncestorFrame, RECURSION, TOO_DEEP};
pub use weaver::{Interception, WeaveReport, Weaver};
