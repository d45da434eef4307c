// Copyright 2025 Cowboy AI, LLC.

//! Error types for workflow operations
//!
//! Queries over an instance never fail: "no relevant history", "no valid
//! transitions" and "view denied" are `Option`/`bool`/empty results. Errors are
//! reserved for commands (start, fire, cancel), template import, and the
//! storage seam.

use thiserror::Error;

/// Errors that can occur in workflow operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// The transition exists but does not leave the instance's current action
    #[error("Transition {transition} is not available from action {action}")]
    TransitionNotAvailable {
        /// Transition that was requested
        transition: String,
        /// Current action of the instance
        action: String,
    },

    /// The member may not perform the operation
    #[error("Authorization error: {member} - {reason}")]
    Unauthorized {
        /// Member that attempted the operation
        member: String,
        /// Why the operation was refused
        reason: String,
    },

    /// Invalid instance state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current status
        from: String,
        /// Attempted target status
        to: String,
    },

    /// The definition graph is inconsistent
    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// A template document is missing its header block
    #[error("Invalid YAML format.")]
    MissingTemplateHeader,

    /// A template document could not be parsed
    #[error("Invalid YAML format. Unable to parse.")]
    TemplateParse {
        /// Parser diagnostic
        detail: String,
    },

    /// Concurrency conflict
    #[error("Concurrency conflict: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Expected version
        expected: u64,
        /// Actual version
        actual: u64,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for WorkflowError {
    fn from(err: serde_yaml::Error) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}

impl WorkflowError {
    /// Create a not-found error for an entity type and id
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an authorization error
    pub fn unauthorized(member: impl ToString, reason: impl Into<String>) -> Self {
        WorkflowError::Unauthorized {
            member: member.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::NotFound { .. })
    }

    /// Check if this is an authorization error
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, WorkflowError::Unauthorized { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::InvalidDefinition(_)
                | WorkflowError::MissingTemplateHeader
                | WorkflowError::TemplateParse { .. }
                | WorkflowError::Configuration(_)
        )
    }

    /// Check if this is a concurrency error
    pub fn is_concurrency_error(&self) -> bool {
        matches!(self, WorkflowError::ConcurrencyConflict { .. })
    }
}
