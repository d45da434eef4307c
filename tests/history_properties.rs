// Copyright 2025 Cowboy AI, LLC.

//! Property tests for history resolution and transition filtering

use cim_approval_workflow::{
    ActionKind, Assignees, DefinitionBuilder, EngineConfig, GroupId, HistoryResolver, MemberId,
    Principal, RecordRef, WorkflowDefinition, WorkflowEngine, WorkflowInstance,
};
use proptest::prelude::*;

const TITLES: [&str; 4] = ["Simple", "Direct", "Group", "Other"];

struct Graph {
    definition: WorkflowDefinition,
    principal: Principal,
}

fn graph() -> Graph {
    let member = MemberId::new();
    let group = GroupId::new();

    let mut builder = DefinitionBuilder::new("Property Workflow");
    builder.action(TITLES[0], ActionKind::Simple);
    builder.action(TITLES[1], ActionKind::assign(Assignees::new().member(member)));
    builder.action(TITLES[2], ActionKind::assign(Assignees::new().group(group)));
    builder.action(TITLES[3], ActionKind::assign(Assignees::new().member(MemberId::new())));

    Graph {
        definition: builder.build().unwrap(),
        principal: Principal::new(member).with_groups([group]),
    }
}

fn replay(definition: &WorkflowDefinition, steps: &[usize]) -> WorkflowInstance {
    let entry = definition.entry_action().unwrap();
    let mut instance =
        WorkflowInstance::new(definition.id, entry.id, RecordRef::new("Page", "p"), None);
    for step in steps {
        instance.record_action(&definition.actions[*step], None, None, None);
    }
    instance
}

proptest! {
    #[test]
    fn most_recent_assignment_wins(steps in proptest::collection::vec(0usize..4, 0..40)) {
        let g = graph();
        let instance = replay(&g.definition, &steps);

        let expected = steps.iter().rposition(|step| *step == 1 || *step == 2);
        let found = HistoryResolver::new()
            .most_recent_relevant_action(instance.history(), &g.principal)
            .map(|entry| entry.sequence as usize);
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn no_relevant_entry_means_no_view(steps in proptest::collection::vec(prop_oneof![Just(0usize), Just(3usize)], 0..20)) {
        let g = graph();
        let instance = replay(&g.definition, &steps);
        let engine = WorkflowEngine::default();

        prop_assert!(engine.most_recent_relevant_action(&instance, &g.principal).is_none());
        prop_assert!(!engine.can_view(&instance, &g.principal));
    }

    #[test]
    fn valid_transitions_keep_definition_order(
        gates in proptest::collection::vec(proptest::option::of(0usize..3), 1..8),
        held in proptest::collection::btree_set(0usize..3, 0..3),
    ) {
        let codes = ["P0", "P1", "P2"];
        let mut builder = DefinitionBuilder::new("Gated");
        let from = builder.action("From", ActionKind::Simple);
        let to = builder.action("To", ActionKind::Simple);
        for (index, gate) in gates.iter().enumerate() {
            let title = format!("T{index}");
            match gate {
                Some(code) => builder.gated_transition(from, title, Some(to), codes[*code]),
                None => builder.transition(from, title, Some(to)),
            };
        }
        let definition = builder.build().unwrap();
        let instance = replay(&definition, &[]);

        let principal = Principal::new(MemberId::new())
            .with_permissions(held.iter().map(|code| codes[*code]));
        let engine = WorkflowEngine::new(EngineConfig {
            require_assignment_to_transition: false,
            ..EngineConfig::default()
        });
        let titles: Vec<String> = engine
            .valid_transitions(&instance, &definition, &principal)
            .into_iter()
            .map(|transition| transition.title.clone())
            .collect();

        let expected: Vec<String> = gates
            .iter()
            .enumerate()
            .filter(|(_, gate)| gate.map_or(true, |code| held.contains(&code)))
            .map(|(index, _)| format!("T{index}"))
            .collect();
        prop_assert_eq!(titles, expected);
    }
}
