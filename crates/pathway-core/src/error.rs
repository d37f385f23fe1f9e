//! Error types for the navigation library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for task construction and navigation.
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// Two steps in the same list share an identifier
    #[error("Duplicate step identifier '{identifier}' in {scope}")]
    DuplicateIdentifier { identifier: String, scope: String },
    /// Navigation was asked about a step that is not in the list
    #[error("Step with identifier '{identifier}' not found")]
    StepNotFound { identifier: String },
    /// A rule or navigation override names a step that does not exist
    #[error("Skip target '{target}' (from step '{from}') does not name a step")]
    SkipTargetNotFound { target: String, from: String },
    /// Decode dispatch met a type tag with no registered decoder
    #[error("Unknown {kind} type '{tag}'")]
    UnknownType { kind: &'static str, tag: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Operation is not valid for the current state of a task run
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> NavigatorError {
        NavigatorError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl NavigatorError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a step-not-found error.
    pub fn step_not_found(identifier: impl Into<String>) -> Self {
        Self::StepNotFound {
            identifier: identifier.into(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Returns true for errors that signal a task definition problem, as
    /// opposed to a host calling the navigator incorrectly.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::UnknownType { .. }
                | Self::InvalidInput { .. }
                | Self::Serialization { .. }
        )
    }
}

/// Result type alias for navigation operations
pub type Result<T> = std::result::Result<T, NavigatorError>;
