//! Error types for the fnplan deployment planner.
//!
//! This module provides the error hierarchy for every stage of planning:
//! loading and validating the function source, and building the plan.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the fnplan deployment planner.
#[derive(Debug, Error)]
pub enum FnplanError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Duplicate resource definition.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Type of resource (function, region, ...).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A scheduled function has no event trigger to wire its topic into.
    #[error("Function '{function}' has a schedule but no event trigger to receive the schedule topic")]
    ScheduleWithoutEventTrigger {
        /// Fully qualified name of the offending function.
        function: String,
    },

    /// Conflicting operations in plan.
    #[error("Conflicting operations in plan: {message}")]
    ConflictingOperations {
        /// Description of the conflict.
        message: String,
    },
}

/// Result type alias for fnplan operations.
pub type Result<T> = std::result::Result<T, FnplanError>;

impl FnplanError {
    /// Returns true if the error was caused by the input rather than by the environment.
    ///
    /// Input errors will fail again on every retry until the source is fixed.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Config(ConfigError::ValidationError { .. } | ConfigError::DuplicateName { .. })
                | Self::Plan(_)
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a parse error tied to a source location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}

impl PlanError {
    /// Creates a conflicting-operations error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConflictingOperations {
            message: message.into(),
        }
    }
}
