// Copyright 2025 Cowboy AI, LLC.

//! Workflow engine
//!
//! Ties the resolvers and authorizers together and implements the commands
//! that move an instance through its definition. Queries are pure; commands
//! re-check authorization against the instance as it is at execution time,
//! so a transition listed earlier cannot be fired after it stopped being
//! valid.

use crate::config::EngineConfig;
use crate::entity::AggregateRoot;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{MemberId, RecordRef, TransitionId};
use crate::identity::Principal;
use crate::workflow::authorization::{Capability, InstanceAuthorizer, TransitionAuthorizer};
use crate::workflow::definition::{ActionGraph, WorkflowDefinition, WorkflowTransition};
use crate::workflow::events::WorkflowEvent;
use crate::workflow::history::HistoryResolver;
use crate::workflow::instance::{WorkflowActionInstance, WorkflowInstance};
use crate::workflow::transitions::ValidTransitionsResolver;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Workflow execution and permission-resolution engine
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    config: EngineConfig,
    history: HistoryResolver,
    instances: InstanceAuthorizer,
    transitions: ValidTransitionsResolver,
}

impl WorkflowEngine {
    /// Engine using the capabilities described by `config`
    pub fn new(config: EngineConfig) -> Self {
        let overrides = vec![Capability::administrative_override(&config)];
        let viewers = vec![Capability::view_all(&config)];
        Self::with_capabilities(config, overrides, viewers)
    }

    /// Engine with explicitly injected capabilities
    pub fn with_capabilities(
        config: EngineConfig,
        overrides: Vec<Capability>,
        viewers: Vec<Capability>,
    ) -> Self {
        Self {
            history: HistoryResolver::new(),
            instances: InstanceAuthorizer::new(overrides.clone(), viewers),
            transitions: ValidTransitionsResolver::new(
                TransitionAuthorizer::new(overrides),
            ),
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Most recent history entry that assigned the principal
    pub fn most_recent_relevant_action<'i>(
        &self,
        instance: &'i WorkflowInstance,
        principal: &Principal,
    ) -> Option<&'i WorkflowActionInstance> {
        self.history.for_instance(instance, principal)
    }

    /// Whether the principal may view the instance
    pub fn can_view(&self, instance: &WorkflowInstance, principal: &Principal) -> bool {
        self.instances.can_view(instance, principal)
    }

    /// Whether the principal may act on the instance
    pub fn can_act(&self, instance: &WorkflowInstance, principal: &Principal) -> bool {
        self.instances.can_act(instance, principal)
    }

    /// Transitions the principal may take from the current action.
    ///
    /// With `require_assignment_to_transition` set, a principal who may not
    /// act on the instance gets none, matching what [`fire`](Self::fire)
    /// accepts.
    pub fn valid_transitions<'g>(
        &self,
        instance: &WorkflowInstance,
        graph: &'g dyn ActionGraph,
        principal: &Principal,
    ) -> Vec<&'g WorkflowTransition> {
        if self.config.require_assignment_to_transition
            && !self.instances.can_act(instance, principal)
        {
            debug!(
                instance_id = %instance.id(),
                member = %principal.member,
                "no transitions: member may not act on the workflow"
            );
            return Vec::new();
        }
        self.transitions.valid_transitions(instance, graph, principal)
    }

    /// Start a workflow on a record.
    ///
    /// The entry action is executed immediately, so an assignment entry
    /// action makes its assignees able to view and act on the new instance.
    pub fn start(
        &self,
        definition: &WorkflowDefinition,
        target: RecordRef,
        initiator: Option<MemberId>,
    ) -> WorkflowResult<(WorkflowInstance, Vec<WorkflowEvent>)> {
        let entry = definition.entry_action().ok_or_else(|| {
            WorkflowError::InvalidDefinition(format!(
                "definition '{}' has no entry action",
                definition.title
            ))
        })?;

        let mut instance = WorkflowInstance::new(definition.id, entry.id, target, initiator);
        instance.record_action(entry, None, initiator, None);

        let mut events = vec![WorkflowEvent::WorkflowStarted {
            instance_id: instance.id(),
            definition_id: definition.id,
            target: instance.target().clone(),
            entry_action: entry.id,
            initiator,
            started_at: instance.started_at(),
        }];

        if entry.is_terminal() {
            instance.complete()?;
            events.push(completed(&instance));
        }

        info!(
            instance_id = %instance.id(),
            definition = %definition.title,
            target = %instance.target(),
            "workflow started"
        );
        Ok((instance, events))
    }

    /// Fire `transition` on behalf of the principal.
    ///
    /// Fails with [`WorkflowError::NotFound`] when the transition is not part
    /// of the instance's definition, [`WorkflowError::TransitionNotAvailable`]
    /// when it does not leave the current action, and
    /// [`WorkflowError::Unauthorized`] when it is not valid for the principal
    /// at this moment.
    pub fn fire(
        &self,
        instance: &mut WorkflowInstance,
        graph: &dyn ActionGraph,
        principal: &Principal,
        transition: TransitionId,
        comment: Option<String>,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        if !instance.is_active() {
            return Err(WorkflowError::InvalidStateTransition {
                from: format!("{:?}", instance.status()),
                to: "Active".to_string(),
            });
        }

        let edge = graph
            .actions_of(&instance.definition())
            .iter()
            .flat_map(|action| action.transitions.iter())
            .find(|t| t.id == transition)
            .ok_or_else(|| WorkflowError::not_found("WorkflowTransition", transition))?;

        if edge.action != instance.current_action() {
            return Err(WorkflowError::TransitionNotAvailable {
                transition: edge.title.clone(),
                action: instance.current_action().to_string(),
            });
        }

        if self.config.require_assignment_to_transition && !self.instances.can_act(instance, principal) {
            warn!(
                instance_id = %instance.id(),
                member = %principal.member,
                transition = %edge.title,
                "transition refused: member is not assigned to the workflow"
            );
            return Err(WorkflowError::unauthorized(
                principal.member,
                "not assigned to this workflow",
            ));
        }

        if !self.transitions.is_valid(instance, graph, principal, &transition) {
            warn!(
                instance_id = %instance.id(),
                member = %principal.member,
                transition = %edge.title,
                "transition refused: missing permission"
            );
            let reason = match &edge.required_permission {
                Some(code) => format!("requires permission {code}"),
                None => "transition is not valid".to_string(),
            };
            return Err(WorkflowError::unauthorized(principal.member, reason));
        }

        let from_action = instance.current_action();
        let mut events = vec![WorkflowEvent::TransitionFired {
            instance_id: instance.id(),
            transition_id: transition,
            from_action,
            to_action: edge.next_action,
            member: principal.member,
            fired_at: Utc::now(),
        }];

        match edge.next_action {
            Some(next_id) => {
                let next = graph
                    .action(&next_id)
                    .ok_or_else(|| WorkflowError::not_found("WorkflowAction", next_id))?;
                instance.record_action(next, Some(transition), Some(principal.member), comment);
                instance.move_to(next_id);
                if next.is_terminal() {
                    instance.complete()?;
                    events.push(completed(instance));
                }
            }
            None => {
                instance.complete()?;
                events.push(completed(instance));
            }
        }

        info!(
            instance_id = %instance.id(),
            member = %principal.member,
            transition = %edge.title,
            status = ?instance.status(),
            "transition fired"
        );
        Ok(events)
    }

    /// Cancel an active instance
    pub fn cancel(
        &self,
        instance: &mut WorkflowInstance,
        principal: &Principal,
        reason: impl Into<String>,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        if !self.instances.can_act(instance, principal) {
            warn!(
                instance_id = %instance.id(),
                member = %principal.member,
                "cancellation refused"
            );
            return Err(WorkflowError::unauthorized(
                principal.member,
                "not allowed to cancel this workflow",
            ));
        }
        instance.cancel()?;
        let reason = reason.into();
        info!(instance_id = %instance.id(), member = %principal.member, %reason, "workflow cancelled");
        Ok(vec![WorkflowEvent::WorkflowCancelled {
            instance_id: instance.id(),
            member: principal.member,
            reason,
            cancelled_at: instance.updated_at(),
        }])
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn completed(instance: &WorkflowInstance) -> WorkflowEvent {
    WorkflowEvent::WorkflowCompleted {
        instance_id: instance.id(),
        final_action: instance.current_action(),
        history_length: instance.history().len(),
        completed_at: instance.updated_at(),
    }
}
