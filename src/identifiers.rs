// Copyright 2025 Cowboy AI, LLC.

//! Identifier types for workflow definitions, instances, and identities

use crate::entity::EntityId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// Marker types for entity IDs
/// Marker for workflow definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefinitionMarker;

/// Marker for actions (nodes of a definition graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionMarker;

/// Marker for transitions (edges of a definition graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionMarker;

/// Marker for running workflow instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceMarker;

/// Marker for history entries of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionInstanceMarker;

/// Marker for members (users) of the identity directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberMarker;

/// Marker for groups of the identity directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupMarker;

/// Identifies a workflow definition
pub type DefinitionId = EntityId<DefinitionMarker>;
/// Identifies an action within a definition
pub type ActionId = EntityId<ActionMarker>;
/// Identifies a transition between two actions
pub type TransitionId = EntityId<TransitionMarker>;
/// Identifies a running workflow instance
pub type InstanceId = EntityId<InstanceMarker>;
/// Identifies one entry in an instance's history
pub type ActionInstanceId = EntityId<ActionInstanceMarker>;
/// Identifies a member
pub type MemberId = EntityId<MemberMarker>;
/// Identifies a group
pub type GroupId = EntityId<GroupMarker>;

/// A permission code such as `ADMIN` or `APPROVE_CONTENT`
///
/// Codes are compared verbatim; the directory decides who holds them.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Create a permission code
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is empty or only whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for PermissionCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Reference to the content record a workflow instance is bound to
///
/// The engine never loads the record; it only carries the reference so
/// callers can find the instances attached to a page, document, etc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Record type, e.g. `"Page"`
    pub record_type: String,
    /// Record identifier in the owning store
    pub record_id: String,
}

impl RecordRef {
    /// Create a record reference
    pub fn new(record_type: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.record_id)
    }
}
