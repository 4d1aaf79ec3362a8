//! # Remold - declarative JSON-to-JSON transformation pipelines
//!
//! Remold interprets a JSON-encoded configuration that rewrites one JSON
//! document into another: select a *root* subtree, apply an ordered
//! *pipeline* of operations to it, then assemble the *output* from
//! references to both the transformed subtree and the original input.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ JSON input  │────▶│ Root select │────▶│  Pipeline   │────▶│   Output    │
//! │  + config   │     │ ($working)  │     │  (ops fold) │     │  template   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use remold::execute;
//! use serde_json::json;
//!
//! let input = json!({"events": [{"user_id": "1"}]});
//! let config = json!({
//!     "pipeline": [
//!         {"op": "rename", "mapping": {"events[].user_id": "events[].userId"}}
//!     ]
//! });
//! let output = execute(&input, &config);
//! ```
//!
//! `execute` is total: a malformed configuration never fails the run.
//! Steps that cannot be decoded or applied are identity and the pipeline
//! continues, so a defective configuration produces a well-formed (possibly
//! unchanged) document. Use [`validate`] for strict, located feedback.
//!
//! ## Modules
//!
//! - [`error`] - Error types for the non-total surfaces
//! - [`path`] - Dotted-path parsing and wildcard traversal
//! - [`transform`] - The DSL: config, operations, executor
//! - [`validation`] - Configuration validation

// Core modules
pub mod error;
pub mod path;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationResult};

// =============================================================================
// Re-exports - Path engine
// =============================================================================

pub use path::{parse as parse_path, Segment};

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{
    example_config, execute, operations_description, OnNull, Operation, PipelineConfig,
    RootConfig,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, validate};
