// Copyright 2025 Cowboy AI, LLC.

//! Transition and instance authorization
//!
//! Administrative capabilities are injected as [`Capability`] checks rather
//! than hard-wired, so a host application can plug in its own notion of
//! "bypass workflow access control". Any capability that answers `true` is
//! sufficient; no precedence between capabilities is modeled.

use crate::config::EngineConfig;
use crate::entity::AggregateRoot;
use crate::identity::Principal;
use crate::workflow::definition::WorkflowTransition;
use crate::workflow::history::HistoryResolver;
use crate::workflow::instance::WorkflowInstance;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An injected capability check over a principal
#[derive(Clone)]
pub struct Capability {
    name: &'static str,
    check: Arc<dyn Fn(&Principal) -> bool + Send + Sync>,
}

impl Capability {
    /// Wrap a capability check
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            check: Arc::new(check),
        }
    }

    /// Administrative override from configuration: the principal's own
    /// override flag or any configured override permission
    pub fn administrative_override(config: &EngineConfig) -> Self {
        let config = config.clone();
        Self::new("administrative_override", move |principal| {
            principal.administrative_override
                || principal
                    .permissions
                    .iter()
                    .any(|code| config.is_override_code(code))
        })
    }

    /// View-everything capability from configuration
    pub fn view_all(config: &EngineConfig) -> Self {
        let config = config.clone();
        Self::new("view_all", move |principal| {
            principal
                .permissions
                .iter()
                .any(|code| config.is_view_code(code))
        })
    }

    /// A capability nobody holds
    pub fn never() -> Self {
        Self::new("never", |_| false)
    }

    /// Capability name, for logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluate the capability
    pub fn allows(&self, principal: &Principal) -> bool {
        (self.check)(principal)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability").field("name", &self.name).finish()
    }
}

/// Decides whether a principal may take a transition
#[derive(Debug, Clone)]
pub struct TransitionAuthorizer {
    overrides: Vec<Capability>,
}

impl TransitionAuthorizer {
    /// Authorizer with the given override capabilities
    pub fn new(overrides: Vec<Capability>) -> Self {
        Self { overrides }
    }

    /// Authorizer using the configured administrative override
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(vec![Capability::administrative_override(config)])
    }

    /// Whether the principal may take `transition`.
    ///
    /// An ungated transition is allowed for anyone; whether that someone may
    /// act on the owning instance is the caller's decision. A gated transition
    /// needs its permission, held directly or through a group.
    pub fn may_transition(&self, transition: &WorkflowTransition, principal: &Principal) -> bool {
        if let Some(capability) = self.overrides.iter().find(|c| c.allows(principal)) {
            debug!(
                transition = %transition.id,
                member = %principal.member,
                capability = capability.name(),
                "transition allowed by override"
            );
            return true;
        }
        match &transition.required_permission {
            None => true,
            Some(code) => principal.holds(code),
        }
    }

    /// Whether any override capability applies
    pub fn has_override(&self, principal: &Principal) -> bool {
        self.overrides.iter().any(|c| c.allows(principal))
    }
}

/// Decides whether a principal may view or act on an instance
#[derive(Debug, Clone)]
pub struct InstanceAuthorizer {
    overrides: Vec<Capability>,
    viewers: Vec<Capability>,
    history: HistoryResolver,
}

impl InstanceAuthorizer {
    /// Authorizer with override capabilities (view and act) and viewer
    /// capabilities (view only)
    pub fn new(overrides: Vec<Capability>, viewers: Vec<Capability>) -> Self {
        Self {
            overrides,
            viewers,
            history: HistoryResolver::new(),
        }
    }

    /// Authorizer using the configured capabilities
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            vec![Capability::administrative_override(config)],
            vec![Capability::view_all(config)],
        )
    }

    /// A principal may view an instance if a capability says so, or if they
    /// have at some point been assigned on it, directly or through a group.
    pub fn can_view(&self, instance: &WorkflowInstance, principal: &Principal) -> bool {
        if self
            .overrides
            .iter()
            .chain(self.viewers.iter())
            .any(|c| c.allows(principal))
        {
            return true;
        }
        self.is_assignee(instance, principal)
    }

    /// Like [`can_view`](Self::can_view), but view-only capabilities do not count
    pub fn can_act(&self, instance: &WorkflowInstance, principal: &Principal) -> bool {
        if self.overrides.iter().any(|c| c.allows(principal)) {
            return true;
        }
        self.is_assignee(instance, principal)
    }

    fn is_assignee(&self, instance: &WorkflowInstance, principal: &Principal) -> bool {
        let found = self.history.for_instance(instance, principal).is_some();
        debug!(
            instance_id = %instance.id(),
            member = %principal.member,
            assigned = found,
            "checked instance assignment history"
        );
        found
    }
}
