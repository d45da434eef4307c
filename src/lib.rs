// Copyright 2025 Cowboy AI, LLC.

//! # CIM Approval Workflow
//!
//! Permission-resolution kernel for approval workflows bound to domain records.
//!
//! This crate answers two questions about a running workflow instance:
//! - **Visibility**: may a principal see the instance at all?
//! - **Transitions**: which transitions out of the current action may the
//!   principal take?
//!
//! Both answers derive from the instance's append-only history of executed
//! actions. The most recent assignment that names the principal, directly or
//! through a group, is what grants access; transitions are then filtered by
//! the permission each one requires.
//!
//! ## Building blocks
//!
//! - **Definitions**: graphs of actions joined by permission-gated transitions
//! - **Instances**: aggregates carrying the current action and history
//! - **Resolvers**: history lookup, instance authorization, transition filtering
//! - **Engine**: starts instances and fires transitions after re-validation
//! - **Service**: async facade with per-instance single-writer semantics
//! - **Templates**: YAML import and export of definitions
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: Phantom-typed ids keep members, groups, and actions apart
//! 2. **Injected Capabilities**: Administrative override and view-all are
//!    predicates supplied by the host, never hard-coded
//! 3. **Re-validation**: Firing a transition repeats every check the listing made

#![warn(missing_docs)]

pub mod config;
mod entity;
mod errors;
mod identifiers;
pub mod identity;
pub mod service;
pub mod template;
pub mod workflow;

pub use config::{EngineConfig, TemplateSettings};
pub use entity::{AggregateRoot, EntityId};
pub use errors::{WorkflowError, WorkflowResult};
pub use identifiers::{
    ActionId, ActionInstanceId, ActionInstanceMarker, ActionMarker, DefinitionId,
    DefinitionMarker, GroupId, GroupMarker, InstanceId, InstanceMarker, MemberId, MemberMarker,
    PermissionCode, RecordRef, TransitionId, TransitionMarker,
};
pub use identity::{GroupRecord, IdentityProvider, InMemoryDirectory, MemberRecord, Principal};
pub use service::{InMemoryInstanceStore, InstanceStore, WorkflowService};
pub use template::{
    template_schema, ActionTemplate, ImportedTemplates, TemplateDocument, TemplateExporter,
    TemplateImporter, TransitionTarget, WorkflowTemplate,
};
pub use workflow::{
    ActionGraph, ActionKind, ActionType, Assignees, Capability, DefinitionBuilder,
    HistoryResolver, InstanceAuthorizer, InstanceStatus, TransitionAuthorizer,
    ValidTransitionsResolver, WorkflowAction, WorkflowActionInstance, WorkflowDefinition,
    WorkflowEngine, WorkflowEvent, WorkflowInstance, WorkflowTransition,
};
