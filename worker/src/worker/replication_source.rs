use log::trace;

use spindle_shared::{
    ChannelId, ComponentData, EntityId, GlobalRef, ObjectKey, OutboundMessage, PendingRequests,
    Receiver, ReplicationSink, ROOT_OFFSET,
};

use crate::{
    transport::{Transport, TransportError},
    worker::worker::Continuation,
};

/// The host's view of what changed on its replicated objects
pub trait ReplicationSource<O> {
    /// Returns, and clears, the changed state of `object`
    fn take_dirty_components(&mut self, object: &O) -> Vec<ComponentData>;

    fn should_go_dormant(&self, _object: &O) -> bool {
        false
    }
}

/// Adapts one transport channel to the scheduler
pub(crate) struct ChannelSink<'a, O: ObjectKey, T: Transport, S: ReplicationSource<O>> {
    pub channel: ChannelId,
    pub transport: &'a mut T,
    pub receiver: &'a Receiver<O>,
    pub requests: &'a mut PendingRequests<O, Continuation<O>>,
    pub source: &'a mut S,
    pub error: Option<TransportError>,
}

impl<O: ObjectKey, T: Transport, S: ReplicationSource<O>> ChannelSink<'_, O, T, S> {
    fn entity_of(&self, object: &O) -> Option<EntityId> {
        match self.receiver.cache().global_ref_of(object) {
            Some(GlobalRef::Entity { entity_id, offset }) if *offset == ROOT_OFFSET => {
                Some(*entity_id)
            }
            _ => None,
        }
    }

    fn send(&mut self, message: OutboundMessage) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.transport.send(self.channel, message) {
            Ok(()) => true,
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }
}

impl<O: ObjectKey, T: Transport, S: ReplicationSource<O>> ReplicationSink<O>
    for ChannelSink<'_, O, T, S>
{
    fn is_saturated(&self) -> bool {
        self.error.is_some() || self.transport.is_saturated(self.channel)
    }

    fn send_object(&mut self, object: &O) -> bool {
        let Some(entity_id) = self.entity_of(object) else {
            return false;
        };
        for update in self.source.take_dirty_components(object) {
            if !self.receiver.has_authority(&entity_id, update.component_id) {
                trace!(
                    "Dropping update of component {} on entity {} without authority",
                    update.component_id,
                    entity_id
                );
                continue;
            }
            if !self.send(OutboundMessage::ComponentUpdate { entity_id, update }) {
                return false;
            }
        }
        true
    }

    fn send_deletion(&mut self, object: &O) {
        let Some(entity_id) = self.entity_of(object) else {
            trace!("{:?} was never bound to an entity, nothing to delete", object);
            return;
        };
        let request_id = self
            .requests
            .insert(Continuation::DeleteEntity { entity_id }, None);
        let sent = self.send(OutboundMessage::DeleteEntity {
            request_id,
            entity_id,
        });
        if !sent {
            self.requests.take(&request_id);
        }
    }

    fn should_go_dormant(&self, object: &O) -> bool {
        self.source.should_go_dormant(object)
    }
}
