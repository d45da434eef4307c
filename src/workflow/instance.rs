// Copyright 2025 Cowboy AI, LLC.

//! Running workflow instances and their history

use crate::entity::AggregateRoot;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{
    ActionId, ActionInstanceId, DefinitionId, InstanceId, MemberId, RecordRef, TransitionId,
};
use crate::workflow::definition::{ActionGraph, ActionType, Assignees, WorkflowAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a workflow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStatus {
    /// Workflow is actively running
    Active,

    /// Workflow reached an action with no way forward
    Completed,

    /// Workflow was cancelled
    Cancelled,
}

/// One executed action in an instance's history. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowActionInstance {
    /// Entry identity
    pub id: ActionInstanceId,
    /// Position in the history, starting at zero
    pub sequence: u64,
    /// The definition-time action that was executed
    pub base_action: ActionId,
    /// Variant tag of the base action at execution time
    pub action_type: ActionType,
    /// Members and groups assigned at execution time
    pub assignees: Assignees,
    /// Transition that led to this action, if any
    pub via_transition: Option<TransitionId>,
    /// Member who triggered the execution
    pub executed_by: Option<MemberId>,
    /// Free-text comment left by the member
    pub comment: Option<String>,
    /// When the action executed
    pub executed_at: DateTime<Utc>,
}

impl WorkflowActionInstance {
    /// Resolve the definition-time action this entry executed
    pub fn base_action<'g>(&self, graph: &'g dyn ActionGraph) -> Option<&'g WorkflowAction> {
        graph.action(&self.base_action)
    }
}

/// A running execution of a definition against one content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    id: InstanceId,
    definition: DefinitionId,
    target: RecordRef,
    current_action: ActionId,
    status: InstanceStatus,
    initiator: Option<MemberId>,
    history: Vec<WorkflowActionInstance>,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl WorkflowInstance {
    /// Create an active instance positioned on `entry` with an empty history
    pub fn new(
        definition: DefinitionId,
        entry: ActionId,
        target: RecordRef,
        initiator: Option<MemberId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InstanceId::new(),
            definition,
            target,
            current_action: entry,
            status: InstanceStatus::Active,
            initiator,
            history: Vec::new(),
            started_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Definition this instance executes
    pub fn definition(&self) -> DefinitionId {
        self.definition
    }

    /// Content record the instance is bound to
    pub fn target(&self) -> &RecordRef {
        &self.target
    }

    /// Action the instance is currently on
    pub fn current_action(&self) -> ActionId {
        self.current_action
    }

    /// Instance status
    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    /// Whether transitions may still fire
    pub fn is_active(&self) -> bool {
        matches!(self.status, InstanceStatus::Active)
    }

    /// Member who started the workflow
    pub fn initiator(&self) -> Option<MemberId> {
        self.initiator
    }

    /// Executed actions, oldest first
    pub fn history(&self) -> &[WorkflowActionInstance] {
        &self.history
    }

    /// When the instance was started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the instance last changed
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append an execution of `action` to the history.
    ///
    /// Assignees are snapshotted from the action, so later edits to the
    /// definition never rewrite who was assigned at the time.
    pub fn record_action(
        &mut self,
        action: &WorkflowAction,
        via_transition: Option<TransitionId>,
        executed_by: Option<MemberId>,
        comment: Option<String>,
    ) -> &WorkflowActionInstance {
        let now = Utc::now();
        let executed_at = self
            .history
            .last()
            .map_or(now, |previous| previous.executed_at.max(now));
        self.history.push(WorkflowActionInstance {
            id: ActionInstanceId::new(),
            sequence: self.history.len() as u64,
            base_action: action.id,
            action_type: action.kind.action_type(),
            assignees: action.kind.assignees().cloned().unwrap_or_default(),
            via_transition,
            executed_by,
            comment,
            executed_at,
        });
        self.updated_at = executed_at;
        self.increment_version();
        &self.history[self.history.len() - 1]
    }

    pub(crate) fn move_to(&mut self, action: ActionId) {
        self.current_action = action;
        self.updated_at = Utc::now();
    }

    pub(crate) fn complete(&mut self) -> WorkflowResult<()> {
        self.finish(InstanceStatus::Completed)
    }

    pub(crate) fn cancel(&mut self) -> WorkflowResult<()> {
        self.finish(InstanceStatus::Cancelled)
    }

    fn finish(&mut self, status: InstanceStatus) -> WorkflowResult<()> {
        if !self.is_active() {
            return Err(WorkflowError::InvalidStateTransition {
                from: format!("{:?}", self.status),
                to: format!("{status:?}"),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        self.increment_version();
        Ok(())
    }
}

impl AggregateRoot for WorkflowInstance {
    type Id = InstanceId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}
