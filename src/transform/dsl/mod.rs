//! DSL (Domain Specific Language) for JSON-to-JSON transformation
//!
//! This module provides:
//! - `config`: Pipeline configuration definition (root / pipeline / output)
//! - `operations`: Available transformation operations
//! - `executor`: Execute configurations on input documents
//! - `sigil`: Shape/value sigil parsing
//! - `dates`: Date detection, formatting, and arithmetic
//!
//! ## Usage Flow
//!
//! ```text
//! JSON input + JSON config → executor::execute → JSON output
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use remold::{execute, validate};
//! use serde_json::json;
//!
//! let input = json!({"d": {"k": "v", "x": 1}, "s": "hi"});
//! let config = json!({
//!     "root": {"path": "d"},
//!     "pipeline": [{"op": "drop", "paths": ["x"]}],
//!     "output": {"k": "$working.k", "meta": "$root.s"}
//! });
//!
//! validate(&config).unwrap();
//! assert_eq!(execute(&input, &config), json!({"k": "v", "meta": "hi"}));
//! ```

pub mod config;
pub mod dates;
pub mod executor;
pub mod operations;
pub mod sigil;

// Re-exports for convenience
pub use config::{example_config, OnNull, PipelineConfig, RootConfig};
pub use executor::execute;
pub use operations::{operations_description, Operation};
