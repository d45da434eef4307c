// Copyright 2025 Cowboy AI, LLC.

//! Workflow service
//!
//! Async facade over the engine for hosts that keep instances in a store.
//! Writers to one instance are serialized: each command takes a per-instance
//! lock, reloads the instance, re-validates, and saves with the version it
//! loaded. Readers take no instance lock and only ever see whole instances.

use crate::config::EngineConfig;
use crate::entity::AggregateRoot;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{DefinitionId, InstanceId, MemberId, RecordRef, TransitionId};
use crate::identity::{IdentityProvider, Principal};
use crate::workflow::{
    WorkflowActionInstance, WorkflowDefinition, WorkflowEngine, WorkflowEvent, WorkflowInstance,
    WorkflowTransition,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Storage seam for workflow instances
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Load an instance
    async fn load(&self, id: &InstanceId) -> WorkflowResult<WorkflowInstance>;

    /// Save an instance.
    ///
    /// With `expected_version = None` the instance must be new; otherwise the
    /// stored version must equal `expected_version`.
    async fn save(
        &self,
        instance: &WorkflowInstance,
        expected_version: Option<u64>,
    ) -> WorkflowResult<()>;

    /// All stored instances
    async fn list(&self) -> WorkflowResult<Vec<WorkflowInstance>>;

    /// Instances bound to a record
    async fn for_record(&self, record: &RecordRef) -> WorkflowResult<Vec<WorkflowInstance>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|instance| instance.target() == record)
            .collect())
    }
}

/// In-memory instance store
#[derive(Debug, Default, Clone)]
pub struct InMemoryInstanceStore {
    instances: Arc<RwLock<HashMap<InstanceId, WorkflowInstance>>>,
}

impl InMemoryInstanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn load(&self, id: &InstanceId) -> WorkflowResult<WorkflowInstance> {
        self.instances
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found("WorkflowInstance", id))
    }

    async fn save(
        &self,
        instance: &WorkflowInstance,
        expected_version: Option<u64>,
    ) -> WorkflowResult<()> {
        let mut instances = self.instances.write().await;
        let stored = instances.get(&instance.id()).map(|stored| stored.version());
        match (expected_version, stored) {
            (None, None) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (expected, actual) => {
                return Err(WorkflowError::ConcurrencyConflict {
                    expected: expected.unwrap_or(0),
                    actual: actual.unwrap_or(0),
                });
            }
        }
        instances.insert(instance.id(), instance.clone());
        Ok(())
    }

    async fn list(&self) -> WorkflowResult<Vec<WorkflowInstance>> {
        Ok(self.instances.read().await.values().cloned().collect())
    }
}

/// Workflow service over a definition registry, an instance store, and an
/// identity directory
pub struct WorkflowService {
    engine: WorkflowEngine,
    definitions: RwLock<HashMap<DefinitionId, Arc<WorkflowDefinition>>>,
    store: Arc<dyn InstanceStore>,
    identity: Arc<dyn IdentityProvider>,
    writers: Mutex<HashMap<InstanceId, Arc<Mutex<()>>>>,
}

impl WorkflowService {
    /// Create a service
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn InstanceStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::with_engine(WorkflowEngine::new(config), store, identity)
    }

    /// Create a service around a preconfigured engine
    pub fn with_engine(
        engine: WorkflowEngine,
        store: Arc<dyn InstanceStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            engine,
            definitions: RwLock::new(HashMap::new()),
            store,
            identity,
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// The engine
    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Make a definition available to new instances
    pub async fn register_definition(&self, definition: WorkflowDefinition) -> DefinitionId {
        let id = definition.id;
        info!(definition_id = %id, title = %definition.title, "definition registered");
        self.definitions.write().await.insert(id, Arc::new(definition));
        id
    }

    /// Look up a registered definition
    pub async fn definition(&self, id: &DefinitionId) -> WorkflowResult<Arc<WorkflowDefinition>> {
        self.definitions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found("WorkflowDefinition", id))
    }

    /// Resolve the principal for a member
    pub fn principal(&self, member: MemberId) -> Principal {
        Principal::resolve(self.identity.as_ref(), member, self.engine.config())
    }

    /// Start a workflow on a record
    pub async fn start_workflow(
        &self,
        definition: &DefinitionId,
        target: RecordRef,
        initiator: MemberId,
    ) -> WorkflowResult<(InstanceId, Vec<WorkflowEvent>)> {
        let definition = self.definition(definition).await?;
        let (instance, events) = self.engine.start(&definition, target, Some(initiator))?;
        self.store.save(&instance, None).await?;
        Ok((instance.id(), events))
    }

    /// Fire a transition on behalf of a member
    pub async fn transition(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
        transition: TransitionId,
        comment: Option<String>,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        let lock = self.writer(instance_id).await;
        let guard = Arc::clone(&lock).lock_owned().await;
        let result = self
            .fire_locked(instance_id, member, transition, comment)
            .await;
        drop(guard);
        self.release(instance_id, lock).await;
        result
    }

    async fn fire_locked(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
        transition: TransitionId,
        comment: Option<String>,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        let mut instance = self.store.load(instance_id).await?;
        let loaded_version = instance.version();
        let definition = self.definition(&instance.definition()).await?;
        let principal = self.principal(member);

        let events =
            self.engine
                .fire(&mut instance, definition.as_ref(), &principal, transition, comment)?;
        self.store.save(&instance, Some(loaded_version)).await?;
        Ok(events)
    }

    /// Cancel an instance on behalf of a member
    pub async fn cancel(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
        reason: impl Into<String>,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        let reason = reason.into();
        let lock = self.writer(instance_id).await;
        let guard = Arc::clone(&lock).lock_owned().await;
        let result = self.cancel_locked(instance_id, member, reason).await;
        drop(guard);
        self.release(instance_id, lock).await;
        result
    }

    async fn cancel_locked(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
        reason: String,
    ) -> WorkflowResult<Vec<WorkflowEvent>> {
        let mut instance = self.store.load(instance_id).await?;
        let loaded_version = instance.version();
        let principal = self.principal(member);

        let events = self.engine.cancel(&mut instance, &principal, reason)?;
        self.store.save(&instance, Some(loaded_version)).await?;
        Ok(events)
    }

    /// Whether a member may view an instance
    pub async fn can_view(&self, instance_id: &InstanceId, member: MemberId) -> WorkflowResult<bool> {
        let instance = self.store.load(instance_id).await?;
        Ok(self.engine.can_view(&instance, &self.principal(member)))
    }

    /// Transitions a member may currently take
    pub async fn valid_transitions(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
    ) -> WorkflowResult<Vec<WorkflowTransition>> {
        let instance = self.store.load(instance_id).await?;
        let definition = self.definition(&instance.definition()).await?;
        let principal = self.principal(member);
        Ok(self
            .engine
            .valid_transitions(&instance, definition.as_ref(), &principal)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Most recent history entry that assigned a member
    pub async fn most_recent_relevant_action(
        &self,
        instance_id: &InstanceId,
        member: MemberId,
    ) -> WorkflowResult<Option<WorkflowActionInstance>> {
        let instance = self.store.load(instance_id).await?;
        let principal = self.principal(member);
        Ok(self
            .engine
            .most_recent_relevant_action(&instance, &principal)
            .cloned())
    }

    /// Instances a member may view
    pub async fn visible_instances(&self, member: MemberId) -> WorkflowResult<Vec<WorkflowInstance>> {
        let principal = self.principal(member);
        let visible: Vec<_> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|instance| self.engine.can_view(instance, &principal))
            .collect();
        debug!(member = %member, count = visible.len(), "listed visible instances");
        Ok(visible)
    }

    /// Writer lock of an instance, registered in the map until released
    async fn writer(&self, instance_id: &InstanceId) -> Arc<Mutex<()>> {
        let mut writers = self.writers.lock().await;
        Arc::clone(
            writers
                .entry(*instance_id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drop the writer lock from the map once no other command holds or
    /// waits on it. `lock` must no longer be locked by the caller.
    async fn release(&self, instance_id: &InstanceId, lock: Arc<Mutex<()>>) {
        let mut writers = self.writers.lock().await;
        // the map entry and `lock` are the only references left
        if Arc::strong_count(&lock) == 2 {
            writers.remove(instance_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryDirectory;
    use crate::workflow::{ActionKind, Assignees, DefinitionBuilder, InstanceStatus};

    struct Fixture {
        service: Arc<WorkflowService>,
        definition: DefinitionId,
        approve: TransitionId,
        reviewer: MemberId,
        outsider: MemberId,
    }

    async fn fixture() -> Fixture {
        let mut directory = InMemoryDirectory::new();
        let reviewer = directory.add_member("Approver", "Member01");
        let outsider = directory.add_member("Outside", "Member");
        let reviewers = directory.add_group("Approvers");
        directory.add_to_group(reviewer, reviewers);

        let mut builder = DefinitionBuilder::new("Review");
        let assign = builder.action("Assign", ActionKind::assign(Assignees::new().group(reviewers)));
        let approved = builder.action("Approved", ActionKind::Simple);
        let approve = builder.transition(assign, "Approve", Some(approved));

        let service = Arc::new(WorkflowService::new(
            EngineConfig::default(),
            Arc::new(InMemoryInstanceStore::new()),
            Arc::new(directory),
        ));
        let definition = service.register_definition(builder.build().unwrap()).await;
        Fixture {
            service,
            definition,
            approve,
            reviewer,
            outsider,
        }
    }

    #[tokio::test]
    async fn test_start_and_transition() {
        let f = fixture().await;
        let (id, events) = f
            .service
            .start_workflow(&f.definition, RecordRef::new("Page", "1"), f.outsider)
            .await
            .unwrap();
        assert_eq!(events[0].event_type(), "WorkflowStarted");

        assert!(f.service.can_view(&id, f.reviewer).await.unwrap());
        assert!(!f.service.can_view(&id, f.outsider).await.unwrap());
        assert_eq!(f.service.valid_transitions(&id, f.reviewer).await.unwrap().len(), 1);

        f.service.transition(&id, f.reviewer, f.approve, None).await.unwrap();
        let events = f.service.transition(&id, f.reviewer, f.approve, None).await;
        assert!(events.is_err());
        assert_eq!(f.service.visible_instances(f.reviewer).await.unwrap().len(), 1);
        assert!(f.service.visible_instances(f.outsider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outsider_is_offered_no_transitions() {
        let f = fixture().await;
        let (id, _) = f
            .service
            .start_workflow(&f.definition, RecordRef::new("Page", "1"), f.reviewer)
            .await
            .unwrap();

        assert!(!f.service.can_view(&id, f.outsider).await.unwrap());
        assert!(f.service.valid_transitions(&id, f.outsider).await.unwrap().is_empty());
        let err = f
            .service
            .transition(&id, f.outsider, f.approve, None)
            .await
            .unwrap_err();
        assert!(err.is_authorization_error());
    }

    #[tokio::test]
    async fn test_writer_locks_are_released() {
        let f = fixture().await;
        for page in 0..10 {
            let (id, _) = f
                .service
                .start_workflow(&f.definition, RecordRef::new("Page", page.to_string()), f.reviewer)
                .await
                .unwrap();
            f.service.cancel(&id, f.reviewer, "withdrawn").await.unwrap();
        }
        for _ in 0..10 {
            let err = f
                .service
                .transition(&InstanceId::new(), f.reviewer, f.approve, None)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        assert!(f.service.writers.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_instance_is_not_found() {
        let f = fixture().await;
        let err = f.service.can_view(&InstanceId::new(), f.reviewer).await.unwrap_err();
        assert!(err.is_not_found());
        let err = f
            .service
            .start_workflow(&DefinitionId::new(), RecordRef::new("Page", "1"), f.reviewer)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fires_produce_one_next_state() {
        let f = fixture().await;
        let (id, _) = f
            .service
            .start_workflow(&f.definition, RecordRef::new("Page", "1"), f.reviewer)
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&f.service);
                let (id, reviewer, approve) = (id, f.reviewer, f.approve);
                tokio::spawn(async move { service.transition(&id, reviewer, approve, None).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);
        assert!(f.service.writers.lock().await.is_empty());

        let history = f.service.most_recent_relevant_action(&id, f.reviewer).await.unwrap();
        assert_eq!(history.map(|entry| entry.sequence), Some(0));
    }

    #[tokio::test]
    async fn test_cancel_through_service() {
        let f = fixture().await;
        let (id, _) = f
            .service
            .start_workflow(&f.definition, RecordRef::new("Page", "2"), f.reviewer)
            .await
            .unwrap();

        assert!(f.service.cancel(&id, f.outsider, "no").await.unwrap_err().is_authorization_error());
        f.service.cancel(&id, f.reviewer, "withdrawn").await.unwrap();

        let store_view = f.service.visible_instances(f.reviewer).await.unwrap();
        assert_eq!(store_view[0].status(), InstanceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_store_rejects_stale_versions() {
        let store = InMemoryInstanceStore::new();
        let instance = WorkflowInstance::new(
            DefinitionId::new(),
            crate::identifiers::ActionId::new(),
            RecordRef::new("Page", "3"),
            None,
        );
        store.save(&instance, None).await.unwrap();

        let err = store.save(&instance, None).await.unwrap_err();
        assert!(err.is_concurrency_error());
        let err = store.save(&instance, Some(7)).await.unwrap_err();
        assert_eq!(err, WorkflowError::ConcurrencyConflict { expected: 7, actual: 0 });

        store.save(&instance, Some(0)).await.unwrap();
        let found = store.for_record(&RecordRef::new("Page", "3")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
