//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Object, Function, Context, and Error.

mod errors;
mod values;
