use crate::{
    ops::{LogLevel, StatusCode},
    world::{
        authority::Authority,
        payload::{ComponentData, Payload},
    },
    CommandIndex, ComponentId, EntityId, RequestId,
};

/// One event delivered by the fabric. Ops arrive in ordered batches, once per
/// tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerOp {
    // Lifecycle
    AddEntity {
        entity_id: EntityId,
    },
    RemoveEntity {
        entity_id: EntityId,
    },
    AddComponent {
        entity_id: EntityId,
        data: ComponentData,
    },
    RemoveComponent {
        entity_id: EntityId,
        component_id: ComponentId,
    },
    ComponentUpdate {
        entity_id: EntityId,
        update: ComponentData,
    },
    AuthorityChange {
        entity_id: EntityId,
        component_id: ComponentId,
        authority: Authority,
    },

    // Commands
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
        message: String,
    },

    /// `true` opens a critical section, `false` closes it
    CriticalSection(bool),

    // Request completions
    ReserveEntityIdsResponse {
        request_id: RequestId,
        status: StatusCode,
        first_entity_id: Option<EntityId>,
        count: u32,
        message: String,
    },
    CreateEntityResponse {
        request_id: RequestId,
        status: StatusCode,
        entity_id: Option<EntityId>,
        message: String,
    },
    DeleteEntityResponse {
        request_id: RequestId,
        status: StatusCode,
        entity_id: EntityId,
        message: String,
    },
    EntityQueryResponse {
        request_id: RequestId,
        status: StatusCode,
        entities: Vec<EntityId>,
        message: String,
    },

    LogMessage {
        level: LogLevel,
        message: String,
    },
}

impl WorkerOp {
    /// Ops that change which entities and components exist, or who owns them
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            WorkerOp::AddEntity { .. }
                | WorkerOp::RemoveEntity { .. }
                | WorkerOp::AddComponent { .. }
                | WorkerOp::AuthorityChange { .. }
        )
    }

    /// Completions of requests this worker issued
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            WorkerOp::CommandResponse { request_id, .. }
            | WorkerOp::ReserveEntityIdsResponse { request_id, .. }
            | WorkerOp::CreateEntityResponse { request_id, .. }
            | WorkerOp::DeleteEntityResponse { request_id, .. }
            | WorkerOp::EntityQueryResponse { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            WorkerOp::AddEntity { entity_id }
            | WorkerOp::RemoveEntity { entity_id }
            | WorkerOp::AddComponent { entity_id, .. }
            | WorkerOp::RemoveComponent { entity_id, .. }
            | WorkerOp::ComponentUpdate { entity_id, .. }
            | WorkerOp::AuthorityChange { entity_id, .. }
            | WorkerOp::CommandRequest { entity_id, .. } => Some(*entity_id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkerOp::AddEntity { .. } => "AddEntity",
            WorkerOp::RemoveEntity { .. } => "RemoveEntity",
            WorkerOp::AddComponent { .. } => "AddComponent",
            WorkerOp::RemoveComponent { .. } => "RemoveComponent",
            WorkerOp::ComponentUpdate { .. } => "ComponentUpdate",
            WorkerOp::AuthorityChange { .. } => "AuthorityChange",
            WorkerOp::CommandRequest { .. } => "CommandRequest",
            WorkerOp::CommandResponse { .. } => "CommandResponse",
            WorkerOp::CriticalSection(_) => "CriticalSection",
            WorkerOp::ReserveEntityIdsResponse { .. } => "ReserveEntityIdsResponse",
            WorkerOp::CreateEntityResponse { .. } => "CreateEntityResponse",
            WorkerOp::DeleteEntityResponse { .. } => "DeleteEntityResponse",
            WorkerOp::EntityQueryResponse { .. } => "EntityQueryResponse",
            WorkerOp::LogMessage { .. } => "LogMessage",
        }
    }
}
