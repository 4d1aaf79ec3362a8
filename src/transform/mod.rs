//! Transformation module.
//!
//! This module hosts the DSL: configuration, operations, and the executor
//! that applies a pipeline to an input document.

pub mod dsl;

pub use dsl::*;
