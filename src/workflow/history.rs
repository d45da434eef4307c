// Copyright 2025 Cowboy AI, LLC.

//! History resolution
//!
//! Answers "what is the most recent action on this instance that concerned
//! this member?". History is scanned newest-first and the scan stops at the
//! first hit, so a newer relevant entry always wins over an older one no
//! matter how the member was assigned.

use crate::identity::Principal;
use crate::workflow::definition::ActionType;
use crate::workflow::instance::{WorkflowActionInstance, WorkflowInstance};

/// Finds history entries relevant to a principal
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryResolver;

impl HistoryResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Most recent assignment entry naming the principal directly or
    /// through one of their groups
    pub fn most_recent_relevant_action<'h>(
        &self,
        history: &'h [WorkflowActionInstance],
        principal: &Principal,
    ) -> Option<&'h WorkflowActionInstance> {
        self.most_recent_of_type(history, ActionType::AssignUsers, principal)
    }

    /// Most recent entry of `action_type` relevant to the principal
    pub fn most_recent_of_type<'h>(
        &self,
        history: &'h [WorkflowActionInstance],
        action_type: ActionType,
        principal: &Principal,
    ) -> Option<&'h WorkflowActionInstance> {
        history
            .iter()
            .rev()
            .find(|entry| entry.action_type == action_type && Self::is_relevant(entry, principal))
    }

    /// [`most_recent_relevant_action`](Self::most_recent_relevant_action) over an instance
    pub fn for_instance<'i>(
        &self,
        instance: &'i WorkflowInstance,
        principal: &Principal,
    ) -> Option<&'i WorkflowActionInstance> {
        self.most_recent_relevant_action(instance.history(), principal)
    }

    /// Whether the entry assigned the principal directly or through a group.
    /// Only assignment entries can be relevant.
    pub fn is_relevant(entry: &WorkflowActionInstance, principal: &Principal) -> bool {
        entry.action_type.is_assignment() && entry.assignees.includes(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{GroupId, MemberId, RecordRef};
    use crate::workflow::definition::{ActionKind, Assignees, DefinitionBuilder, WorkflowDefinition};

    fn instance_with(definition: &WorkflowDefinition, titles: &[&str]) -> WorkflowInstance {
        let mut instance = WorkflowInstance::new(
            definition.id,
            definition.actions[0].id,
            RecordRef::new("Page", "1"),
            None,
        );
        for title in titles {
            let action = definition.action_by_title(title).unwrap();
            instance.record_action(action, None, None, None);
        }
        instance
    }

    #[test]
    fn test_empty_history_has_no_relevant_action() {
        let principal = Principal::new(MemberId::new());
        assert!(HistoryResolver::new()
            .most_recent_relevant_action(&[], &principal)
            .is_none());
    }

    #[test]
    fn test_no_partial_match_on_foreign_group_and_member() {
        let principal = Principal::new(MemberId::new()).with_groups([GroupId::new()]);
        let mut builder = DefinitionBuilder::new("Foreign");
        builder.action(
            "Assign",
            ActionKind::assign(Assignees::new().group(GroupId::new()).member(MemberId::new())),
        );
        let definition = builder.build().unwrap();
        let instance = instance_with(&definition, &["Assign"]);

        assert!(HistoryResolver::new().for_instance(&instance, &principal).is_none());
    }

    #[test]
    fn test_newer_group_assignment_beats_older_direct_assignment() {
        let member = MemberId::new();
        let group = GroupId::new();
        let principal = Principal::new(member).with_groups([group]);

        let mut builder = DefinitionBuilder::new("Recency");
        builder.action("AssignA", ActionKind::assign(Assignees::new().member(member)));
        builder.action("AssignB", ActionKind::assign(Assignees::new().group(group)));
        let definition = builder.build().unwrap();
        let instance = instance_with(&definition, &["AssignA", "AssignB"]);

        let found = HistoryResolver::new().for_instance(&instance, &principal).unwrap();
        assert_eq!(found.base_action(&definition).unwrap().title, "AssignB");
        assert_eq!(found.sequence, 1);
    }

    #[test]
    fn test_simple_actions_are_never_relevant() {
        let member = MemberId::new();
        let principal = Principal::new(member);
        let mut builder = DefinitionBuilder::new("Simple");
        builder.action("Assign", ActionKind::assign(Assignees::new().member(member)));
        builder.action("Review", ActionKind::Simple);
        let definition = builder.build().unwrap();
        let instance = instance_with(&definition, &["Assign", "Review"]);

        let resolver = HistoryResolver::new();
        let found = resolver.for_instance(&instance, &principal).unwrap();
        assert_eq!(found.sequence, 0);
        assert!(resolver
            .most_recent_of_type(instance.history(), ActionType::Simple, &principal)
            .is_none());
    }
}
