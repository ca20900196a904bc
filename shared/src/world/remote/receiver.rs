use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::{
    ops::{OutboundMessage, StatusCode, WorkerOp},
    world::{
        authority::Authority,
        identity::{GlobalRef, IdentityCache, IdentityConfig, LocalId},
        liveness::{LivenessToken, ObjectLiveness},
        object_model::{ObjectKey, ObjectModel},
        payload::{ComponentData, FieldData, Payload, ResolvedPayload},
        remote::{
            deferred_resolver::{CallKey, DeferredResolver, FieldKey, ReadyField},
            error::ReceiverError,
            object_event::ObjectEvent,
            op_batcher::OpBatcher,
        },
    },
    CommandIndex, ComponentId, EntityId, RequestId, ROOT_OFFSET,
};

/// Applies incoming ops to the local object model.
///
/// Owns the identity cache, the deferred resolver and the critical-section
/// batcher. After every applied op (or every flushed critical section) the
/// references that became resolvable are replayed.
pub struct Receiver<O: ObjectKey> {
    cache: IdentityCache<O>,
    resolver: DeferredResolver<O>,
    batcher: OpBatcher,
    authority: HashMap<(EntityId, ComponentId), Authority>,
    liveness: ObjectLiveness<O>,
    events: Vec<ObjectEvent<O>>,
    outgoing: Vec<OutboundMessage>,
}

impl<O: ObjectKey> Receiver<O> {
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_cache(IdentityCache::new(config))
    }

    pub fn with_cache(cache: IdentityCache<O>) -> Self {
        Self {
            cache,
            resolver: DeferredResolver::new(),
            batcher: OpBatcher::new(),
            authority: HashMap::new(),
            liveness: ObjectLiveness::new(),
            events: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    // Incoming

    pub fn receive_ops<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        ops: Vec<WorkerOp>,
    ) -> Result<(), ReceiverError> {
        for op in ops {
            self.receive_op(model, op)?;
        }
        Ok(())
    }

    pub fn receive_op<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        op: WorkerOp,
    ) -> Result<(), ReceiverError> {
        match op {
            WorkerOp::CriticalSection(true) => {
                self.batcher.open();
                Ok(())
            }
            WorkerOp::CriticalSection(false) => {
                let ops = self.batcher.close();
                if !ops.is_empty() {
                    info!("Flushing critical section of {} ops", ops.len());
                }
                for op in ops {
                    self.apply_op(model, op)?;
                }
                self.resolve_new_identities(model)
            }
            op => {
                let Some(op) = self.batcher.buffer(op) else {
                    return Ok(());
                };
                self.apply_op(model, op)?;
                self.resolve_new_identities(model)
            }
        }
    }

    fn apply_op<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        op: WorkerOp,
    ) -> Result<(), ReceiverError> {
        match op {
            WorkerOp::AddEntity { entity_id } => self.add_entity(model, entity_id),
            WorkerOp::RemoveEntity { entity_id } => {
                self.remove_entity(model, entity_id);
                Ok(())
            }
            WorkerOp::AddComponent { entity_id, data } => {
                self.add_component(model, entity_id, data)
            }
            WorkerOp::RemoveComponent {
                entity_id,
                component_id,
            } => {
                self.remove_component(model, entity_id, component_id);
                Ok(())
            }
            WorkerOp::ComponentUpdate { entity_id, update } => {
                self.update_component(model, entity_id, update)
            }
            WorkerOp::AuthorityChange {
                entity_id,
                component_id,
                authority,
            } => {
                self.change_authority(model, entity_id, component_id, authority);
                Ok(())
            }
            WorkerOp::CommandRequest {
                request_id,
                entity_id,
                component_id,
                command_index,
                payload,
            } => self.receive_command(
                model,
                request_id,
                entity_id,
                component_id,
                command_index,
                payload,
            ),
            other => {
                warn!("Receiver does not handle {} ops, skipping", other.name());
                Ok(())
            }
        }
    }

    // Lifecycle

    fn add_entity<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        entity_id: EntityId,
    ) -> Result<(), ReceiverError> {
        if !entity_id.is_valid() {
            warn!("Skipping AddEntity for invalid entity id {}", entity_id);
            return Ok(());
        }
        if self.cache.has_entity(&entity_id) {
            warn!("Entity {} added twice, skipping", entity_id);
            return Ok(());
        }
        let Some(object) = model.spawn_entity_object(entity_id) else {
            warn!("Object model declined to spawn entity {}", entity_id);
            return Ok(());
        };

        self.bind_entity(model, object, entity_id)?;
        info!("Entity {} received as {:?}", entity_id, object);
        self.events.push(ObjectEvent::Spawned { entity_id, object });
        Ok(())
    }

    /// Binds a local object and its current sub-objects to `entity_id`.
    ///
    /// References that became resolvable are replayed by the next call to
    /// `resolve_new_identities`.
    pub fn bind_entity<M: ObjectModel<O>>(
        &mut self,
        model: &M,
        object: O,
        entity_id: EntityId,
    ) -> Result<LocalId, ReceiverError> {
        let subobjects = model.subobject_offsets(&object);
        let local_id = self.cache.assign_for_entity(object, entity_id, &subobjects)?;
        self.liveness.token(object);
        Ok(local_id)
    }

    fn remove_entity<M: ObjectModel<O>>(&mut self, model: &mut M, entity_id: EntityId) {
        let Some(object) = self.cache.entity_root(&entity_id) else {
            warn!("Skipping RemoveEntity for unknown entity {}", entity_id);
            return;
        };

        for removed in self.cache.remove(&entity_id) {
            self.resolver.forget_object(&removed);
            self.liveness.invalidate(&removed);
        }
        self.authority.retain(|(id, _), _| *id != entity_id);
        model.destroy_object(&object);

        info!("Entity {} removed", entity_id);
        self.events.push(ObjectEvent::Despawned { entity_id, object });
    }

    fn add_component<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        entity_id: EntityId,
        data: ComponentData,
    ) -> Result<(), ReceiverError> {
        let Some(object) = self.entity_object(entity_id, "AddComponent") else {
            return Ok(());
        };
        let component_id = data.component_id;
        if let Err(err) = model.add_component(&object, component_id) {
            warn!("Skipping AddComponent on entity {}: {}", entity_id, err);
            return Ok(());
        }

        for (subobject, offset) in model.subobject_offsets(&object) {
            if self.cache.local_id_of(&subobject).is_none() {
                self.cache.assign_for_subobject(subobject, entity_id, offset)?;
            }
        }
        for field in data.fields {
            self.apply_field(model, object, component_id, field)?;
        }

        self.events.push(ObjectEvent::ComponentAdded {
            entity_id,
            object,
            component_id,
        });
        Ok(())
    }

    fn remove_component<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        entity_id: EntityId,
        component_id: ComponentId,
    ) {
        let Some(object) = self.entity_object(entity_id, "RemoveComponent") else {
            return;
        };
        model.remove_component(&object, component_id);
        self.resolver.forget_component(&object, component_id);
        self.authority.remove(&(entity_id, component_id));
        self.events.push(ObjectEvent::ComponentRemoved {
            entity_id,
            object,
            component_id,
        });
    }

    fn update_component<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        entity_id: EntityId,
        update: ComponentData,
    ) -> Result<(), ReceiverError> {
        let Some(object) = self.entity_object(entity_id, "ComponentUpdate") else {
            return Ok(());
        };
        let component_id = update.component_id;
        for field in update.fields {
            self.apply_field(model, object, component_id, field)?;
        }
        self.events.push(ObjectEvent::ComponentUpdated {
            entity_id,
            object,
            component_id,
        });
        Ok(())
    }

    fn change_authority<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        entity_id: EntityId,
        component_id: ComponentId,
        authority: Authority,
    ) {
        let Some(object) = self.entity_object(entity_id, "AuthorityChange") else {
            return;
        };
        debug!(
            "Authority over component {} of entity {} is now {:?}",
            component_id, entity_id, authority
        );
        self.authority.insert((entity_id, component_id), authority);
        model.on_authority_change(&object, component_id, authority);
        self.events.push(ObjectEvent::AuthorityChanged {
            entity_id,
            object,
            component_id,
            authority,
        });
    }

    // Fields

    fn apply_field<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        object: O,
        component_id: ComponentId,
        field: FieldData,
    ) -> Result<(), ReceiverError> {
        let FieldData { field_id, payload } = field;
        let unresolved = self.unresolved_refs(model, &payload)?;
        let resolved = self.resolve_payload(&payload);
        let key = FieldKey {
            object,
            component_id,
            field_id,
        };
        // always queued, so a newer value supersedes an older deferred one
        self.resolver.queue_field(key, payload, unresolved);

        if let Err(err) = model.apply_field(&object, component_id, field_id, resolved) {
            warn!(
                "Skipping field {} of component {} on {:?}: {}",
                field_id, component_id, object, err
            );
        }
        Ok(())
    }

    fn apply_ready_field<M: ObjectModel<O>>(&mut self, model: &mut M, ready: ReadyField<O>) {
        let ReadyField {
            key,
            payload,
            complete,
        } = ready;
        let resolved = self.resolve_payload(&payload);
        let applied = model.apply_field(&key.object, key.component_id, key.field_id, resolved);
        if let Err(err) = applied {
            warn!("Skipping deferred field {:?}: {}", key, err);
            return;
        }
        if complete {
            self.events.push(ObjectEvent::FieldResolved {
                object: key.object,
                component_id: key.component_id,
                field_id: key.field_id,
            });
        }
    }

    // Commands

    fn receive_command<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        request_id: RequestId,
        entity_id: EntityId,
        component_id: ComponentId,
        command_index: CommandIndex,
        payload: Payload,
    ) -> Result<(), ReceiverError> {
        let Some(target) = self.entity_object(entity_id, "CommandRequest") else {
            self.outgoing.push(OutboundMessage::CommandResponse {
                request_id,
                status: StatusCode::NotFound,
                payload: Payload::default(),
            });
            return Ok(());
        };

        let key = CallKey {
            target,
            component_id,
            command_index,
        };
        let unresolved = self.unresolved_refs(model, &payload)?;
        if unresolved.is_empty() && !self.resolver.has_queued_calls(&key) {
            self.dispatch_call(model, key, request_id, payload);
        } else {
            debug!(
                "Deferring command request {} on {:?}: {} unresolved references",
                request_id,
                key,
                unresolved.len()
            );
            self.resolver
                .enqueue_call(key, request_id, payload, unresolved);
        }
        Ok(())
    }

    fn dispatch_call<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        key: CallKey<O>,
        request_id: RequestId,
        payload: Payload,
    ) {
        let resolved = self.resolve_payload(&payload);
        match model.invoke_command(&key.target, key.component_id, key.command_index, resolved) {
            Ok(response) => {
                self.outgoing.push(OutboundMessage::CommandResponse {
                    request_id,
                    status: StatusCode::Success,
                    payload: response,
                });
                self.events.push(ObjectEvent::CommandDispatched {
                    object: key.target,
                    component_id: key.component_id,
                    command_index: key.command_index,
                    request_id,
                });
            }
            Err(err) => {
                warn!("Command request {} on {:?} failed: {}", request_id, key, err);
                self.outgoing.push(OutboundMessage::CommandResponse {
                    request_id,
                    status: StatusCode::ApplicationError,
                    payload: Payload::default(),
                });
            }
        }
    }

    // Resolution

    /// Replays deferred fields and calls waiting on identities registered
    /// since the last call.
    ///
    /// A newly registered entity also retries the awaited path refs named
    /// under it. Whatever those load is registered in turn and picked up by
    /// the next pass.
    pub fn resolve_new_identities<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
    ) -> Result<(), ReceiverError> {
        loop {
            let registered = self.cache.take_newly_registered();
            if registered.is_empty() {
                return Ok(());
            }
            for global_ref in registered {
                if !global_ref.is_path() {
                    for path_ref in self.resolver.paths_anchored_on(&global_ref) {
                        if let Err(err) = self.lookup_or_load(model, &path_ref) {
                            warn!("Cannot load {} under {}: {}", path_ref, global_ref, err);
                        }
                    }
                }

                let resolution = self.resolver.resolve(&global_ref);
                if resolution.is_empty() {
                    continue;
                }
                debug!(
                    "{} released {} fields and {} calls",
                    global_ref,
                    resolution.fields.len(),
                    resolution.calls.len()
                );
                for ready in resolution.fields {
                    self.apply_ready_field(model, ready);
                }
                for ready in resolution.calls {
                    let call = ready.call;
                    self.dispatch_call(model, ready.key, call.request_id, call.payload);
                }
            }
        }
    }

    fn unresolved_refs<M: ObjectModel<O>>(
        &mut self,
        model: &M,
        payload: &Payload,
    ) -> Result<HashSet<GlobalRef>, ReceiverError> {
        let mut unresolved = HashSet::new();
        for global_ref in &payload.refs {
            if self.lookup_or_load(model, global_ref)?.is_none() {
                unresolved.insert(self.cache.normalize(global_ref));
            }
        }
        Ok(unresolved)
    }

    fn lookup_or_load<M: ObjectModel<O>>(
        &mut self,
        model: &M,
        global_ref: &GlobalRef,
    ) -> Result<Option<O>, ReceiverError> {
        if let Some(object) = self.cache.object_of_global(global_ref) {
            return Ok(Some(object));
        }
        if !global_ref.is_path() {
            return Ok(None);
        }

        // name every link of the outer chain, outermost first
        let chain: Vec<&GlobalRef> = global_ref.outer_chain().collect();
        let mut outer: Option<O> = None;
        for link in chain.into_iter().rev() {
            if let Some(object) = self.cache.object_of_global(link) {
                outer = Some(object);
                continue;
            }
            let GlobalRef::Path { path, .. } = link else {
                return Ok(None);
            };
            let Some(object) = model.find_static_object(path, outer.as_ref()) else {
                return Ok(None);
            };
            self.cache.assign_for_static_path(object, model)?;
            debug!("Loaded stably named object {:?} for {}", object, link);
            outer = Some(object);
        }
        Ok(outer)
    }

    fn resolve_payload(&self, payload: &Payload) -> ResolvedPayload<O> {
        ResolvedPayload {
            bytes: payload.bytes.clone(),
            objects: payload
                .refs
                .iter()
                .map(|global_ref| self.cache.object_of_global(global_ref))
                .collect(),
        }
    }

    fn entity_object(&self, entity_id: EntityId, op_name: &str) -> Option<O> {
        let object = self.cache.entity_root(&entity_id);
        if object.is_none() {
            warn!("Skipping {} for unknown entity {}", op_name, entity_id);
        }
        object
    }

    // Local notifications

    /// Forgets an object the host destroyed. Returns every object whose
    /// identity was removed as a consequence.
    pub fn on_object_destroyed(&mut self, object: &O) -> Vec<O> {
        if let Some(GlobalRef::Entity { entity_id, offset }) = self.cache.global_ref_of(object) {
            if *offset == ROOT_OFFSET {
                let entity_id = *entity_id;
                self.authority.retain(|(id, _), _| *id != entity_id);
            }
        }

        let mut removed = self.cache.remove_object(object);
        if !removed.contains(object) {
            removed.push(*object);
        }
        for removed_object in &removed {
            self.resolver.forget_object(removed_object);
            self.liveness.invalidate(removed_object);
        }
        removed
    }

    // Accessors

    pub fn cache(&self) -> &IdentityCache<O> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut IdentityCache<O> {
        &mut self.cache
    }

    pub fn resolver(&self) -> &DeferredResolver<O> {
        &self.resolver
    }

    pub fn is_in_critical_section(&self) -> bool {
        self.batcher.is_open()
    }

    pub fn authority(&self, entity_id: &EntityId, component_id: ComponentId) -> Authority {
        self.authority
            .get(&(*entity_id, component_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn has_authority(&self, entity_id: &EntityId, component_id: ComponentId) -> bool {
        self.authority(entity_id, component_id).is_authoritative()
    }

    pub fn liveness_token(&mut self, object: O) -> LivenessToken<O> {
        self.liveness.token(object)
    }

    pub fn is_alive(&self, token: &LivenessToken<O>) -> bool {
        self.liveness.is_alive(token)
    }

    pub fn take_events(&mut self) -> Vec<ObjectEvent<O>> {
        std::mem::take(&mut self.events)
    }

    pub fn take_outgoing(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outgoing)
    }
}
