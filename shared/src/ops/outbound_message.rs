use crate::{
    ops::StatusCode,
    world::payload::{ComponentData, Payload},
    CommandIndex, ComponentId, EntityId, RequestId,
};

/// Entity query constraints understood by the fabric
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityQuery {
    Entity(EntityId),
    Component(ComponentId),
}

/// Message sent from this worker to the fabric
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    ComponentUpdate {
        entity_id: EntityId,
        update: ComponentData,
    },
    CommandRequest {
        request_id: RequestId,
        entity_id: EntityId,
        component_id: ComponentId,
        command_index: CommandIndex,
        payload: Payload,
    },
    CommandResponse {
        request_id: RequestId,
        status: StatusCode,
        payload: Payload,
    },
    ReserveEntityIds {
        request_id: RequestId,
        count: u32,
    },
    CreateEntity {
        request_id: RequestId,
        entity_id: Option<EntityId>,
        components: Vec<ComponentData>,
    },
    DeleteEntity {
        request_id: RequestId,
        entity_id: EntityId,
    },
    EntityQuery {
        request_id: RequestId,
        query: EntityQuery,
    },
}

impl OutboundMessage {
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            OutboundMessage::ComponentUpdate { .. } => None,
            OutboundMessage::CommandRequest { request_id, .. }
            | OutboundMessage::CommandResponse { request_id, .. }
            | OutboundMessage::ReserveEntityIds { request_id, .. }
            | OutboundMessage::CreateEntity { request_id, .. }
            | OutboundMessage::DeleteEntity { request_id, .. }
            | OutboundMessage::EntityQuery { request_id, .. } => Some(*request_id),
        }
    }
}
