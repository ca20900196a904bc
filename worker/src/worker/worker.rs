use std::{collections::BTreeSet, time::Duration};

use log::{debug, error, info, log, warn};

use spindle_shared::{
    ChannelId, CommandIndex, ComponentData, ComponentId, EntityId, EntityQuery, LivenessToken,
    LocalId, ObjectKey, ObjectModel, OutboundMessage, Payload, PendingRequests, Receiver,
    ReplicationConfig, ReplicationReport, ReplicationScheduler, RequestId, StatusCode, WorkerOp,
};

use crate::{
    error::SpindleWorkerError,
    events::WorkerEvent,
    transport::Transport,
    worker::{
        command_retry::{CommandId, CommandRetry, OutgoingCommand},
        entity_pool::EntityPool,
        replication_source::{ChannelSink, ReplicationSource},
        worker_config::WorkerConfig,
    },
};

/// What to do when the completion of a request arrives
pub(crate) enum Continuation<O> {
    ReserveEntityIds,
    CreateEntity { object: O },
    DeleteEntity { entity_id: EntityId },
    EntityQuery,
    Command(OutgoingCommand),
}

/// A Worker binds a local object model to the fabric. All of its state is
/// mutated from the tick that calls `receive_ops` and `send_all_updates`.
pub struct Worker<O: ObjectKey, T: Transport> {
    config: WorkerConfig,
    transport: T,
    receiver: Receiver<O>,
    scheduler: ReplicationScheduler<O>,
    requests: PendingRequests<O, Continuation<O>>,
    entity_pool: EntityPool,
    command_retry: CommandRetry,
    next_command_id: CommandId,
    channels: BTreeSet<ChannelId>,
    events: Vec<WorkerEvent<O>>,
}

impl<O: ObjectKey, T: Transport> Worker<O, T> {
    pub fn new(config: WorkerConfig, transport: T) -> Self {
        let receiver = Receiver::new(&config.identity);
        let scheduler = ReplicationScheduler::new(config.replication.clone());
        let command_retry =
            CommandRetry::new(config.command_retry_attempts, config.command_retry_backoff);

        Self {
            config,
            transport,
            receiver,
            scheduler,
            requests: PendingRequests::new(),
            entity_pool: EntityPool::new(),
            command_retry,
            next_command_id: 1,
            channels: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    // Incoming

    /// Drains every op batch the transport has received and applies it
    pub fn receive_ops<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        now: Duration,
    ) -> Result<(), SpindleWorkerError> {
        while let Some(batch) = self.transport.receive_batch()? {
            debug!("Received batch of {} ops", batch.len());
            for op in batch {
                self.receive_op(model, op, now)?;
            }
            self.collect_receiver_output()?;
        }
        Ok(())
    }

    fn receive_op<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        op: WorkerOp,
        now: Duration,
    ) -> Result<(), SpindleWorkerError> {
        match op {
            WorkerOp::LogMessage { level, message } => {
                let level: log::Level = level.into();
                log!(level, "Fabric: {}", message);
                Ok(())
            }
            op if op.request_id().is_some() => self.complete_request(model, op, now),
            op => Ok(self.receiver.receive_op(model, op)?),
        }
    }

    fn collect_receiver_output(&mut self) -> Result<(), SpindleWorkerError> {
        for message in self.receiver.take_outgoing() {
            self.transport.send(self.config.control_channel, message)?;
        }
        self.events.extend(
            self.receiver
                .take_events()
                .into_iter()
                .map(WorkerEvent::Object),
        );
        Ok(())
    }

    // Completions

    fn complete_request<M: ObjectModel<O>>(
        &mut self,
        model: &mut M,
        op: WorkerOp,
        now: Duration,
    ) -> Result<(), SpindleWorkerError> {
        let Some(request_id) = op.request_id() else {
            return Ok(());
        };
        let Some(pending) = self.requests.take(&request_id) else {
            warn!("{} for unknown request {}, skipping", op.name(), request_id);
            return Ok(());
        };
        if let Some(owner) = &pending.owner {
            if !self.receiver.is_alive(owner) {
                debug!(
                    "{} for request {} arrived after {:?} was destroyed, ignoring",
                    op.name(),
                    request_id,
                    owner.object()
                );
                return Ok(());
            }
        }

        match (pending.continuation, op) {
            (
                Continuation::ReserveEntityIds,
                WorkerOp::ReserveEntityIdsResponse {
                    status,
                    first_entity_id,
                    count,
                    message,
                    ..
                },
            ) => {
                if status.is_success() {
                    self.entity_pool
                        .reservation_completed(request_id, first_entity_id, count);
                } else {
                    warn!("Entity id reservation failed ({:?}): {}", status, message);
                    self.entity_pool.reservation_failed(request_id);
                }
            }
            (
                Continuation::CreateEntity { object },
                WorkerOp::CreateEntityResponse {
                    status,
                    entity_id,
                    message,
                    ..
                },
            ) => match (status, entity_id) {
                (StatusCode::Success, Some(entity_id)) => {
                    self.receiver.bind_entity(model, object, entity_id)?;
                    self.receiver.resolve_new_identities(model)?;
                    info!("Created entity {} for {:?}", entity_id, object);
                    self.events
                        .push(WorkerEvent::EntityCreated { object, entity_id });
                }
                (status, _) => {
                    warn!(
                        "Creating entity for {:?} failed ({:?}): {}",
                        object, status, message
                    );
                    self.events.push(WorkerEvent::CreateEntityFailed {
                        object,
                        status,
                        message,
                    });
                }
            },
            (
                Continuation::DeleteEntity { entity_id },
                WorkerOp::DeleteEntityResponse { status, message, .. },
            ) => {
                if !status.is_success() {
                    warn!(
                        "Deleting entity {} failed ({:?}): {}",
                        entity_id, status, message
                    );
                }
                self.events
                    .push(WorkerEvent::EntityDeleted { entity_id, status });
            }
            (
                Continuation::EntityQuery,
                WorkerOp::EntityQueryResponse {
                    status,
                    entities,
                    message,
                    ..
                },
            ) => {
                if !status.is_success() {
                    warn!("Entity query {} failed ({:?}): {}", request_id, status, message);
                }
                self.events.push(WorkerEvent::QueryResponse {
                    request_id,
                    status,
                    entities,
                });
            }
            (
                Continuation::Command(command),
                WorkerOp::CommandResponse {
                    status,
                    payload,
                    message,
                    ..
                },
            ) => self.complete_command(command, status, payload, message, now),
            (_, op) => {
                warn!(
                    "{} does not match the request {} it answers, skipping",
                    op.name(),
                    request_id
                );
            }
        }
        Ok(())
    }

    fn complete_command(
        &mut self,
        command: OutgoingCommand,
        status: StatusCode,
        payload: Payload,
        message: String,
        now: Duration,
    ) {
        let command_id = command.command_id;
        if status.is_success() || !status.is_retryable() {
            if !status.is_success() {
                warn!("Command {} failed ({:?}): {}", command_id, status, message);
            }
            self.events.push(WorkerEvent::CommandResponse {
                command_id,
                status,
                payload,
            });
            return;
        }

        let attempts = command.attempts;
        match self.command_retry.schedule(command, now) {
            Ok(due) => {
                warn!(
                    "Command {} failed ({:?}): {}. Retrying at {:?} (attempt {}/{})",
                    command_id,
                    status,
                    message,
                    due,
                    attempts + 1,
                    self.command_retry.max_attempts()
                );
            }
            Err(_) => {
                error!(
                    "Command {} failed too many times ({} attempts), dropping it: {:?} {}",
                    command_id, attempts, status, message
                );
            }
        }
    }

    // Requests

    /// Asks the fabric to create an entity for `object`. The identity is bound
    /// when the completion arrives, unless `object` was destroyed meanwhile.
    pub fn create_entity(
        &mut self,
        object: O,
        components: Vec<ComponentData>,
    ) -> Result<RequestId, SpindleWorkerError> {
        let owner = self.receiver.liveness_token(object);
        let entity_id = self.entity_pool.take();
        self.send_request(
            Continuation::CreateEntity { object },
            Some(owner),
            move |request_id| OutboundMessage::CreateEntity {
                request_id,
                entity_id,
                components,
            },
        )
    }

    /// Deletes the entity bound to `object`. Replicated objects have the
    /// deletion scheduled ahead of updates on their channel.
    pub fn delete_entity(&mut self, object: &O) -> Result<bool, SpindleWorkerError> {
        if self.scheduler.is_tracked(object) {
            return Ok(self.scheduler.queue_deletion(object));
        }
        let Some(entity_id) = self
            .receiver
            .cache()
            .global_ref_of(object)
            .filter(|global_ref| global_ref.is_entity_root())
            .and_then(|global_ref| global_ref.entity_id())
        else {
            warn!("Cannot delete {:?}: it is not bound to an entity", object);
            return Ok(false);
        };
        self.send_request(
            Continuation::DeleteEntity { entity_id },
            None,
            |request_id| OutboundMessage::DeleteEntity {
                request_id,
                entity_id,
            },
        )?;
        Ok(true)
    }

    pub fn query(&mut self, query: EntityQuery) -> Result<RequestId, SpindleWorkerError> {
        self.send_request(Continuation::EntityQuery, None, move |request_id| {
            OutboundMessage::EntityQuery { request_id, query }
        })
    }

    /// Sends a command to an entity. Failures with a retryable status are
    /// resent with backoff, up to the configured number of attempts; a command
    /// that runs out of attempts is dropped with an error log.
    pub fn send_command(
        &mut self,
        entity_id: EntityId,
        component_id: ComponentId,
        command_index: CommandIndex,
        payload: Payload,
    ) -> Result<CommandId, SpindleWorkerError> {
        let command_id = self.next_command_id;
        self.next_command_id += 1;
        self.dispatch_command(OutgoingCommand {
            command_id,
            entity_id,
            component_id,
            command_index,
            payload,
            attempts: 0,
        })?;
        Ok(command_id)
    }

    fn dispatch_command(
        &mut self,
        mut command: OutgoingCommand,
    ) -> Result<(), SpindleWorkerError> {
        command.attempts += 1;
        let entity_id = command.entity_id;
        let component_id = command.component_id;
        let command_index = command.command_index;
        let payload = command.payload.clone();
        self.send_request(
            Continuation::Command(command),
            None,
            move |request_id| OutboundMessage::CommandRequest {
                request_id,
                entity_id,
                component_id,
                command_index,
                payload,
            },
        )?;
        Ok(())
    }

    /// Sends a request on the control channel. A request the transport
    /// refuses leaves nothing pending.
    fn send_request(
        &mut self,
        continuation: Continuation<O>,
        owner: Option<LivenessToken<O>>,
        message: impl FnOnce(RequestId) -> OutboundMessage,
    ) -> Result<RequestId, SpindleWorkerError> {
        let request_id = self.requests.insert(continuation, owner);
        if let Err(err) = self
            .transport
            .send(self.config.control_channel, message(request_id))
        {
            self.requests.take(&request_id);
            return Err(err.into());
        }
        Ok(request_id)
    }

    // Outgoing

    /// Sends due command retries, refills the entity id pool, then runs one
    /// replication pass per channel
    pub fn send_all_updates<S: ReplicationSource<O>>(
        &mut self,
        source: &mut S,
        now: Duration,
    ) -> Result<Vec<(ChannelId, ReplicationReport)>, SpindleWorkerError> {
        for command in self.command_retry.take_due(now) {
            self.dispatch_command(command)?;
        }

        if self.config.entity_pool_size > 0
            && self
                .entity_pool
                .needs_refill(self.config.entity_pool_refill_threshold)
        {
            let count = self.config.entity_pool_size;
            let request_id = self.send_request(Continuation::ReserveEntityIds, None, |request_id| {
                OutboundMessage::ReserveEntityIds { request_id, count }
            })?;
            self.entity_pool.reservation_sent(request_id);
        }

        let mut reports = Vec::new();
        let channels: Vec<ChannelId> = self.channels.iter().copied().collect();
        for channel in channels {
            let mut sink = ChannelSink {
                channel,
                transport: &mut self.transport,
                receiver: &self.receiver,
                requests: &mut self.requests,
                source: &mut *source,
                error: None,
            };
            let report = self.scheduler.replicate(now, channel, &mut sink);
            if let Some(err) = sink.error {
                return Err(err.into());
            }
            reports.push((channel, report));
        }

        self.transport.end_tick();
        Ok(reports)
    }

    pub fn start_replicating(&mut self, object: O, channel: ChannelId, now: Duration) {
        let config = self.config.replication.clone();
        self.start_replicating_with(object, channel, &config, now);
    }

    pub fn start_replicating_with(
        &mut self,
        object: O,
        channel: ChannelId,
        config: &ReplicationConfig,
        now: Duration,
    ) {
        self.channels.insert(channel);
        self.scheduler.track(object, channel, config, now);
    }

    pub fn stop_replicating(&mut self, object: &O) -> bool {
        self.scheduler.untrack(object)
    }

    pub fn mark_dirty(&mut self, object: &O) -> bool {
        self.scheduler.mark_dirty(object)
    }

    pub fn set_dormant(&mut self, object: &O) -> bool {
        self.scheduler.set_dormant(object)
    }

    pub fn wake(&mut self, object: &O) -> bool {
        self.scheduler.wake(object)
    }

    pub fn set_priority_multiplier(&mut self, object: &O, multiplier: f64) -> bool {
        self.scheduler.set_priority_multiplier(object, multiplier)
    }

    /// Stops replicating everything on `channel`
    pub fn close_channel(&mut self, channel: ChannelId) -> Vec<O> {
        self.channels.remove(&channel);
        self.scheduler.close_channel(channel)
    }

    // Local notifications

    /// The host destroyed `object`: forget its identity, deferred work and
    /// replication state. Completions still in flight for it become no-ops.
    pub fn on_object_destroyed(&mut self, object: &O) {
        for removed in self.receiver.on_object_destroyed(object) {
            self.scheduler.untrack(&removed);
        }
    }

    // Accessors

    pub fn take_events(&mut self) -> Vec<WorkerEvent<O>> {
        std::mem::take(&mut self.events)
    }

    pub fn receiver(&self) -> &Receiver<O> {
        &self.receiver
    }

    pub fn scheduler(&self) -> &ReplicationScheduler<O> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ReplicationScheduler<O> {
        &mut self.scheduler
    }

    pub fn local_id_of(&self, object: &O) -> Option<LocalId> {
        self.receiver.cache().local_id_of(object)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn pending_request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn pending_retry_count(&self) -> usize {
        self.command_retry.len()
    }

    pub fn entity_pool_len(&self) -> usize {
        self.entity_pool.len()
    }
}
