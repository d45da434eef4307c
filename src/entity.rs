// Copyright 2025 Cowboy AI, LLC.

//! Entity identity and aggregate roots

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// Every persistent object the engine touches (definitions, actions,
/// transitions, instances, members, groups) is addressed by an `EntityId`
/// parameterized with a marker type, so an `ActionId` can never be passed
/// where a `TransitionId` is expected.
///
/// # Examples
///
/// ```rust
/// use cim_approval_workflow::{ActionId, EntityId, TransitionId};
///
/// let action = ActionId::new();
/// let transition = TransitionId::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: ActionId = transition;
///
/// let parsed: ActionId = action.to_string().parse().unwrap();
/// assert_eq!(parsed.as_uuid(), action.as_uuid());
/// # let _ = transition;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

/// Marker trait for aggregate roots
///
/// Aggregate roots are the entry points for modifying aggregates. A workflow
/// instance is the aggregate root for its own history: entries are only ever
/// appended through it, and each append bumps the version used for optimistic
/// concurrency by the instance store.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}
