// Copyright 2025 Cowboy AI, LLC.

//! Workflow definitions: the action/transition graph
//!
//! A definition is a directed graph whose nodes are actions and whose edges
//! are transitions. Transitions are owned by their source action and keep
//! their insertion order; that order is what callers see when listing the
//! transitions available on an instance.

use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{ActionId, DefinitionId, GroupId, MemberId, PermissionCode, TransitionId};
use crate::identity::Principal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Members and groups an assignment targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignees {
    /// Directly assigned members
    #[serde(default)]
    pub members: BTreeSet<MemberId>,
    /// Assigned groups
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl Assignees {
    /// Empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member
    pub fn member(mut self, member: MemberId) -> Self {
        self.members.insert(member);
        self
    }

    /// Add a group
    pub fn group(mut self, group: GroupId) -> Self {
        self.groups.insert(group);
        self
    }

    /// Whether nobody is assigned
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.groups.is_empty()
    }

    /// Whether the principal is assigned directly or through one of their groups
    pub fn includes(&self, principal: &Principal) -> bool {
        self.members.contains(&principal.member)
            || self.groups.iter().any(|group| principal.in_group(group))
    }
}

/// Behavior attached to an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// A plain step with no side effects
    Simple,
    /// Assigns the instance to members and groups
    AssignUsers {
        /// Who the instance is assigned to when this action executes
        assignees: Assignees,
    },
}

impl ActionKind {
    /// Assignment action targeting `assignees`
    pub fn assign(assignees: Assignees) -> Self {
        ActionKind::AssignUsers { assignees }
    }

    /// The variant tag
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::Simple => ActionType::Simple,
            ActionKind::AssignUsers { .. } => ActionType::AssignUsers,
        }
    }

    /// Assignees of an assignment action
    pub fn assignees(&self) -> Option<&Assignees> {
        match self {
            ActionKind::Simple => None,
            ActionKind::AssignUsers { assignees } => Some(assignees),
        }
    }
}

/// Variant tag of an [`ActionKind`], recorded on every history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Plain step
    Simple,
    /// Assignment step
    AssignUsers,
}

impl ActionType {
    /// Whether this is the assignment variant
    pub fn is_assignment(self) -> bool {
        matches!(self, ActionType::AssignUsers)
    }

    /// Name used in template documents
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Simple => "simple",
            ActionType::AssignUsers => "assign_users",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, optionally permission-gated edge between two actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    /// Transition identity
    pub id: TransitionId,
    /// Human-readable title
    pub title: String,
    /// Action the transition leaves
    pub action: ActionId,
    /// Action the transition enters; `None` ends the workflow
    pub next_action: Option<ActionId>,
    /// Permission required to take the transition
    pub required_permission: Option<PermissionCode>,
}

impl WorkflowTransition {
    /// Whether taking this transition ends the workflow
    pub fn is_terminal(&self) -> bool {
        self.next_action.is_none()
    }
}

/// A node in the definition graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAction {
    /// Action identity
    pub id: ActionId,
    /// Owning definition
    pub definition: DefinitionId,
    /// Title, unique within the definition
    pub title: String,
    /// Action behavior
    pub kind: ActionKind,
    /// Outgoing transitions in definition order
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowAction {
    /// Whether the action has no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// A named workflow template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Definition identity
    pub id: DefinitionId,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Position among definitions
    pub sort_order: u32,
    /// Version of the template this definition was imported from
    pub remote_version: u32,
    /// Actions in definition order; the first is the entry action
    pub actions: Vec<WorkflowAction>,
}

/// Read contract of the action graph store
///
/// Accessors return plain ordered slices; nothing is loaded lazily.
pub trait ActionGraph {
    /// Actions of a definition, in definition order
    fn actions_of(&self, definition: &DefinitionId) -> &[WorkflowAction];

    /// Look up an action
    fn action(&self, id: &ActionId) -> Option<&WorkflowAction>;

    /// Outgoing transitions of an action, in definition order
    fn transitions_of(&self, action: &ActionId) -> &[WorkflowTransition] {
        self.action(action)
            .map(|a| a.transitions.as_slice())
            .unwrap_or(&[])
    }
}

impl ActionGraph for WorkflowDefinition {
    fn actions_of(&self, definition: &DefinitionId) -> &[WorkflowAction] {
        if *definition == self.id {
            &self.actions
        } else {
            &[]
        }
    }

    fn action(&self, id: &ActionId) -> Option<&WorkflowAction> {
        self.actions.iter().find(|action| action.id == *id)
    }
}

impl WorkflowDefinition {
    /// The action new instances start on
    pub fn entry_action(&self) -> Option<&WorkflowAction> {
        self.actions.first()
    }

    /// Look up an action by title
    pub fn action_by_title(&self, title: &str) -> Option<&WorkflowAction> {
        self.actions.iter().find(|action| action.title == title)
    }

    /// Look up a transition anywhere in the definition
    pub fn transition(&self, id: &TransitionId) -> Option<&WorkflowTransition> {
        self.actions
            .iter()
            .flat_map(|action| action.transitions.iter())
            .find(|transition| transition.id == *id)
    }

    /// All transitions in definition order
    pub fn transitions(&self) -> impl Iterator<Item = &WorkflowTransition> {
        self.actions.iter().flat_map(|action| action.transitions.iter())
    }
}

struct PendingTransition {
    id: TransitionId,
    title: String,
    action: ActionId,
    next_action: Option<ActionId>,
    required_permission: Option<PermissionCode>,
}

/// Builds a [`WorkflowDefinition`] and validates its graph
///
/// This is the import boundary: a definition produced by [`build`] never has
/// a transition pointing outside of it.
///
/// [`build`]: DefinitionBuilder::build
///
/// # Examples
///
/// ```rust
/// use cim_approval_workflow::{ActionKind, DefinitionBuilder};
///
/// let mut builder = DefinitionBuilder::new("Dummy Workflow Definition");
/// let one = builder.action("Step One", ActionKind::Simple);
/// let two = builder.action("Step Two", ActionKind::Simple);
/// builder.transition(one, "Step One T1", Some(two));
///
/// let definition = builder.build().unwrap();
/// assert_eq!(definition.actions.len(), 2);
/// assert_eq!(definition.actions[0].transitions[0].title, "Step One T1");
/// ```
pub struct DefinitionBuilder {
    id: DefinitionId,
    title: String,
    description: Option<String>,
    sort_order: u32,
    remote_version: u32,
    actions: Vec<(ActionId, String, ActionKind)>,
    transitions: Vec<PendingTransition>,
}

impl DefinitionBuilder {
    /// Start a definition with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: DefinitionId::new(),
            title: title.into(),
            description: None,
            sort_order: 0,
            remote_version: 0,
            actions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Set the description
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sort order
    pub fn sort_order(&mut self, sort_order: u32) -> &mut Self {
        self.sort_order = sort_order;
        self
    }

    /// Set the remote template version
    pub fn remote_version(&mut self, remote_version: u32) -> &mut Self {
        self.remote_version = remote_version;
        self
    }

    /// Append an action
    pub fn action(&mut self, title: impl Into<String>, kind: ActionKind) -> ActionId {
        let id = ActionId::new();
        self.actions.push((id, title.into(), kind));
        id
    }

    /// Append an ungated transition
    pub fn transition(
        &mut self,
        from: ActionId,
        title: impl Into<String>,
        to: Option<ActionId>,
    ) -> TransitionId {
        self.push_transition(from, title.into(), to, None)
    }

    /// Append a transition that requires `permission`
    pub fn gated_transition(
        &mut self,
        from: ActionId,
        title: impl Into<String>,
        to: Option<ActionId>,
        permission: impl Into<PermissionCode>,
    ) -> TransitionId {
        self.push_transition(from, title.into(), to, Some(permission.into()))
    }

    fn push_transition(
        &mut self,
        action: ActionId,
        title: String,
        next_action: Option<ActionId>,
        required_permission: Option<PermissionCode>,
    ) -> TransitionId {
        let id = TransitionId::new();
        self.transitions.push(PendingTransition {
            id,
            title,
            action,
            next_action,
            required_permission,
        });
        id
    }

    /// Validate the graph and produce the definition
    pub fn build(self) -> WorkflowResult<WorkflowDefinition> {
        if self.title.trim().is_empty() {
            return Err(WorkflowError::InvalidDefinition(
                "definition title must not be empty".to_string(),
            ));
        }
        if self.actions.is_empty() {
            return Err(WorkflowError::InvalidDefinition(format!(
                "definition '{}' has no actions",
                self.title
            )));
        }

        let mut titles = HashSet::new();
        for (_, title, _) in &self.actions {
            if !titles.insert(title.as_str()) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "duplicate action title '{title}'"
                )));
            }
        }

        let known: HashSet<ActionId> = self.actions.iter().map(|(id, _, _)| *id).collect();
        for pending in &self.transitions {
            if !known.contains(&pending.action) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "transition '{}' leaves an action outside definition '{}'",
                    pending.title, self.title
                )));
            }
            if let Some(next) = pending.next_action {
                if !known.contains(&next) {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "transition '{}' points outside definition '{}'",
                        pending.title, self.title
                    )));
                }
            }
            if pending
                .required_permission
                .as_ref()
                .is_some_and(PermissionCode::is_blank)
            {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "transition '{}' has a blank permission code",
                    pending.title
                )));
            }
        }

        let definition_id = self.id;
        let mut transitions = self.transitions;
        let actions = self
            .actions
            .into_iter()
            .map(|(id, title, kind)| {
                let (outgoing, rest): (Vec<_>, Vec<_>) =
                    transitions.drain(..).partition(|t| t.action == id);
                transitions = rest;
                WorkflowAction {
                    id,
                    definition: definition_id,
                    title,
                    kind,
                    transitions: outgoing
                        .into_iter()
                        .map(|t| WorkflowTransition {
                            id: t.id,
                            title: t.title,
                            action: t.action,
                            next_action: t.next_action,
                            required_permission: t.required_permission,
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(WorkflowDefinition {
            id: definition_id,
            title: self.title,
            description: self.description,
            sort_order: self.sort_order,
            remote_version: self.remote_version,
            actions,
        })
    }
}
