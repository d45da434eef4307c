// Copyright 2025 Cowboy AI, LLC.

//! Workflow events
//!
//! Every command on the engine returns the events it produced, in order.

use crate::identifiers::{ActionId, DefinitionId, InstanceId, MemberId, RecordRef, TransitionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events that can occur on a workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// A new workflow instance was started
    WorkflowStarted {
        /// The workflow instance ID
        instance_id: InstanceId,

        /// The workflow definition being used
        definition_id: DefinitionId,

        /// Record the workflow is bound to
        target: RecordRef,

        /// Entry action
        entry_action: ActionId,

        /// Member who started the workflow
        initiator: Option<MemberId>,

        /// When the workflow was started
        started_at: DateTime<Utc>,
    },

    /// A transition was fired
    TransitionFired {
        /// The workflow instance
        instance_id: InstanceId,

        /// Transition that fired
        transition_id: TransitionId,

        /// Action before the transition
        from_action: ActionId,

        /// Action after the transition; `None` for terminal transitions
        to_action: Option<ActionId>,

        /// Member who fired the transition
        member: MemberId,

        /// When the transition fired
        fired_at: DateTime<Utc>,
    },

    /// The workflow ran out of transitions and completed
    WorkflowCompleted {
        /// The workflow instance
        instance_id: InstanceId,

        /// Action the workflow ended on
        final_action: ActionId,

        /// Number of history entries at completion
        history_length: usize,

        /// When the workflow completed
        completed_at: DateTime<Utc>,
    },

    /// The workflow was cancelled
    WorkflowCancelled {
        /// The workflow instance
        instance_id: InstanceId,

        /// Member who cancelled the workflow
        member: MemberId,

        /// Reason for cancellation
        reason: String,

        /// When the workflow was cancelled
        cancelled_at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The instance the event belongs to
    pub fn instance_id(&self) -> InstanceId {
        match self {
            WorkflowEvent::WorkflowStarted { instance_id, .. }
            | WorkflowEvent::TransitionFired { instance_id, .. }
            | WorkflowEvent::WorkflowCompleted { instance_id, .. }
            | WorkflowEvent::WorkflowCancelled { instance_id, .. } => *instance_id,
        }
    }

    /// Event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::WorkflowStarted { .. } => "WorkflowStarted",
            WorkflowEvent::TransitionFired { .. } => "TransitionFired",
            WorkflowEvent::WorkflowCompleted { .. } => "WorkflowCompleted",
            WorkflowEvent::WorkflowCancelled { .. } => "WorkflowCancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip_and_accessors() {
        let instance_id = InstanceId::new();
        let event = WorkflowEvent::WorkflowCancelled {
            instance_id,
            member: MemberId::new(),
            reason: "superseded".to_string(),
            cancelled_at: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: WorkflowEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.instance_id(), instance_id);
        assert_eq!(back.event_type(), "WorkflowCancelled");
    }
}
