// Copyright 2025 Cowboy AI, LLC.

//! Valid-transition resolution
//!
//! An instance is a state machine whose states are actions. Its transition
//! function is the outgoing edge set of the current action, filtered per
//! caller by the [`TransitionAuthorizer`].

use crate::identifiers::TransitionId;
use crate::identity::Principal;
use crate::workflow::authorization::TransitionAuthorizer;
use crate::workflow::definition::{ActionGraph, WorkflowTransition};
use crate::workflow::instance::WorkflowInstance;

/// Lists the transitions a principal may take from an instance's current action
#[derive(Debug, Clone)]
pub struct ValidTransitionsResolver {
    authorizer: TransitionAuthorizer,
}

impl ValidTransitionsResolver {
    /// Create a resolver around a transition authorizer
    pub fn new(authorizer: TransitionAuthorizer) -> Self {
        Self { authorizer }
    }

    /// The authorizer used for filtering
    pub fn authorizer(&self) -> &TransitionAuthorizer {
        &self.authorizer
    }

    /// Authorized outgoing transitions of the current action, in definition
    /// order. Finished instances have none.
    pub fn valid_transitions<'g>(
        &self,
        instance: &WorkflowInstance,
        graph: &'g dyn ActionGraph,
        principal: &Principal,
    ) -> Vec<&'g WorkflowTransition> {
        if !instance.is_active() {
            return Vec::new();
        }
        graph
            .transitions_of(&instance.current_action())
            .iter()
            .filter(|transition| self.authorizer.may_transition(transition, principal))
            .collect()
    }

    /// Whether `transition` is currently among the valid transitions
    pub fn is_valid(
        &self,
        instance: &WorkflowInstance,
        graph: &dyn ActionGraph,
        principal: &Principal,
        transition: &TransitionId,
    ) -> bool {
        self.valid_transitions(instance, graph, principal)
            .iter()
            .any(|t| t.id == *transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::identifiers::{MemberId, RecordRef};
    use crate::workflow::definition::{ActionKind, DefinitionBuilder, WorkflowDefinition};

    fn resolver() -> ValidTransitionsResolver {
        ValidTransitionsResolver::new(TransitionAuthorizer::from_config(&EngineConfig::default()))
    }

    fn start(definition: &WorkflowDefinition) -> WorkflowInstance {
        WorkflowInstance::new(
            definition.id,
            definition.actions[0].id,
            RecordRef::new("Page", "1"),
            None,
        )
    }

    #[test]
    fn test_terminal_action_has_no_transitions() {
        let mut builder = DefinitionBuilder::new("Single");
        builder.action("Only", ActionKind::Simple);
        let definition = builder.build().unwrap();
        let instance = start(&definition);
        let admin = Principal::new(MemberId::new()).with_override(true);

        assert!(resolver().valid_transitions(&instance, &definition, &admin).is_empty());
    }

    #[test]
    fn test_unpermitted_member_gets_empty_set() {
        let mut builder = DefinitionBuilder::new("Gated");
        let one = builder.action("One", ActionKind::Simple);
        let two = builder.action("Two", ActionKind::Simple);
        builder.gated_transition(one, "Up", Some(two), "Permission1");
        builder.gated_transition(one, "Down", Some(two), "Permission2");
        let definition = builder.build().unwrap();
        let instance = start(&definition);

        let nobody = Principal::new(MemberId::new());
        assert!(resolver().valid_transitions(&instance, &definition, &nobody).is_empty());
    }

    #[test]
    fn test_order_follows_definition_not_permissions() {
        let mut builder = DefinitionBuilder::new("Ordered");
        let one = builder.action("One", ActionKind::Simple);
        let two = builder.action("Two", ActionKind::Simple);
        let open = builder.transition(one, "Zzz open", Some(two));
        let gated = builder.gated_transition(one, "Aaa gated", Some(two), "Permission1");
        let other = builder.gated_transition(one, "Mmm other", None, "Permission2");
        let definition = builder.build().unwrap();
        let instance = start(&definition);

        let principal = Principal::new(MemberId::new()).with_permissions(["Permission1"]);
        let ids: Vec<_> = resolver()
            .valid_transitions(&instance, &definition, &principal)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![open, gated]);
        assert!(!resolver().is_valid(&instance, &definition, &principal, &other));
    }

    #[test]
    fn test_cancelled_instance_has_no_transitions() {
        let mut builder = DefinitionBuilder::new("Cancelled");
        let one = builder.action("One", ActionKind::Simple);
        builder.transition(one, "Done", None);
        let definition = builder.build().unwrap();
        let mut instance = start(&definition);
        instance.cancel().unwrap();

        let admin = Principal::new(MemberId::new()).with_override(true);
        assert!(resolver().valid_transitions(&instance, &definition, &admin).is_empty());
    }
}
