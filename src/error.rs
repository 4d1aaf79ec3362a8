//! Error types for the remold pipeline.
//!
//! The evaluator itself is a total function: malformed operations reduce to
//! identity on their step and never surface here (see the executor module).
//! These types cover the two places an error *is* observable:
//!
//! - [`ConfigError`] - loading a configuration document
//! - [`ValidationError`] - the validator surface
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or decoding a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON, or does not decode into the typed
    /// configuration shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document decoded but is structurally unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A validator rejection: one string naming the first offending step.
///
/// Produced by [`crate::validation::validate`]; the evaluator never returns
/// this (it accepts strictly more configurations than the validator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The underlying message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for the validator surface.
pub type ValidationResult = Result<(), ValidationError>;
