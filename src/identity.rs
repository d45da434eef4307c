// Copyright 2025 Cowboy AI, LLC.

//! Identity collaborators
//!
//! The engine does not manage members or groups. It reads them through
//! [`IdentityProvider`] and works on a [`Principal`]: the materialized
//! identity and effective permission set of the current user.

use crate::config::EngineConfig;
use crate::identifiers::{GroupId, MemberId, PermissionCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Read contract of the external identity directory
pub trait IdentityProvider: Send + Sync {
    /// Groups the member belongs to
    fn groups_of(&self, member: &MemberId) -> BTreeSet<GroupId>;

    /// Every permission the member holds, directly or through a group
    fn permissions_of(&self, member: &MemberId) -> BTreeSet<PermissionCode>;

    /// Whether the member holds `code` directly or through any of their groups
    fn has_permission(&self, member: &MemberId, code: &PermissionCode) -> bool {
        self.permissions_of(member).contains(code)
    }

    /// Capability that bypasses workflow access control entirely
    fn has_administrative_override(&self, member: &MemberId) -> bool;
}

/// The current user as seen by the authorizers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Member identity
    pub member: MemberId,
    /// Groups the member belongs to
    pub groups: BTreeSet<GroupId>,
    /// Effective permissions (direct and group-derived)
    pub permissions: BTreeSet<PermissionCode>,
    /// Whether an administrative override applies
    pub administrative_override: bool,
}

impl Principal {
    /// A principal with no groups, no permissions, and no override
    pub fn new(member: MemberId) -> Self {
        Self {
            member,
            groups: BTreeSet::new(),
            permissions: BTreeSet::new(),
            administrative_override: false,
        }
    }

    /// Materialize a principal from the identity directory.
    ///
    /// Holding any of the configured override permissions counts as an
    /// administrative override, in addition to the directory's own capability.
    pub fn resolve(provider: &dyn IdentityProvider, member: MemberId, config: &EngineConfig) -> Self {
        let groups = provider.groups_of(&member);
        let permissions = provider.permissions_of(&member);
        let administrative_override = provider.has_administrative_override(&member)
            || permissions.iter().any(|code| config.is_override_code(code));

        debug!(
            member = %member,
            groups = groups.len(),
            permissions = permissions.len(),
            administrative_override,
            "resolved principal"
        );

        Self {
            member,
            groups,
            permissions,
            administrative_override,
        }
    }

    /// Add group memberships
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Add effective permissions
    pub fn with_permissions<P: Into<PermissionCode>>(
        mut self,
        permissions: impl IntoIterator<Item = P>,
    ) -> Self {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Set the administrative override flag
    pub fn with_override(mut self, administrative_override: bool) -> Self {
        self.administrative_override = administrative_override;
        self
    }

    /// Whether the principal is a member of `group`
    pub fn in_group(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }

    /// Whether the principal holds `code`
    pub fn holds(&self, code: &PermissionCode) -> bool {
        self.permissions.contains(code)
    }
}

/// A member of the in-memory directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Member identity
    pub id: MemberId,
    /// First name
    pub first_name: String,
    /// Surname
    pub surname: String,
    /// Permissions granted directly to the member
    pub permissions: BTreeSet<PermissionCode>,
}

impl MemberRecord {
    /// Display name, `"first surname"`
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.surname).trim().to_string()
    }
}

/// A group of the in-memory directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group identity
    pub id: GroupId,
    /// Group title
    pub title: String,
    /// Permissions granted to every member of the group
    pub permissions: BTreeSet<PermissionCode>,
    /// Members of the group
    pub members: BTreeSet<MemberId>,
}

/// In-memory identity directory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    members: HashMap<MemberId, MemberRecord>,
    groups: HashMap<GroupId, GroupRecord>,
    overrides: BTreeSet<MemberId>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member and return its id
    pub fn add_member(&mut self, first_name: impl Into<String>, surname: impl Into<String>) -> MemberId {
        let id = MemberId::new();
        self.members.insert(
            id,
            MemberRecord {
                id,
                first_name: first_name.into(),
                surname: surname.into(),
                permissions: BTreeSet::new(),
            },
        );
        id
    }

    /// Add a group and return its id
    pub fn add_group(&mut self, title: impl Into<String>) -> GroupId {
        let id = GroupId::new();
        self.groups.insert(
            id,
            GroupRecord {
                id,
                title: title.into(),
                permissions: BTreeSet::new(),
                members: BTreeSet::new(),
            },
        );
        id
    }

    /// Put a member into a group; returns false if either is unknown
    pub fn add_to_group(&mut self, member: MemberId, group: GroupId) -> bool {
        if !self.members.contains_key(&member) {
            return false;
        }
        match self.groups.get_mut(&group) {
            Some(record) => {
                record.members.insert(member);
                true
            }
            None => false,
        }
    }

    /// Grant a permission directly to a member; returns false if unknown
    pub fn grant_member(&mut self, member: MemberId, code: impl Into<PermissionCode>) -> bool {
        match self.members.get_mut(&member) {
            Some(record) => {
                record.permissions.insert(code.into());
                true
            }
            None => false,
        }
    }

    /// Grant a permission to a group; returns false if unknown
    pub fn grant_group(&mut self, group: GroupId, code: impl Into<PermissionCode>) -> bool {
        match self.groups.get_mut(&group) {
            Some(record) => {
                record.permissions.insert(code.into());
                true
            }
            None => false,
        }
    }

    /// Give a member the administrative override capability
    pub fn grant_override(&mut self, member: MemberId) {
        self.overrides.insert(member);
    }

    /// Look up a member
    pub fn member(&self, id: &MemberId) -> Option<&MemberRecord> {
        self.members.get(id)
    }

    /// Look up a group
    pub fn group(&self, id: &GroupId) -> Option<&GroupRecord> {
        self.groups.get(id)
    }
}

impl IdentityProvider for InMemoryDirectory {
    fn groups_of(&self, member: &MemberId) -> BTreeSet<GroupId> {
        self.groups
            .values()
            .filter(|group| group.members.contains(member))
            .map(|group| group.id)
            .collect()
    }

    fn permissions_of(&self, member: &MemberId) -> BTreeSet<PermissionCode> {
        let mut permissions = self
            .members
            .get(member)
            .map(|record| record.permissions.clone())
            .unwrap_or_default();
        for group in self.groups.values().filter(|g| g.members.contains(member)) {
            permissions.extend(group.permissions.iter().cloned());
        }
        permissions
    }

    fn has_administrative_override(&self, member: &MemberId) -> bool {
        self.overrides.contains(member)
    }
}
