use spindle_shared::{EntityId, ObjectEvent, Payload, RequestId, StatusCode};

use crate::worker::CommandId;

/// Everything that happened during a worker tick, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerEvent<O> {
    /// A change applied to the local object model by an incoming op
    Object(ObjectEvent<O>),
    EntityCreated {
        object: O,
        entity_id: EntityId,
    },
    CreateEntityFailed {
        object: O,
        status: StatusCode,
        message: String,
    },
    EntityDeleted {
        entity_id: EntityId,
        status: StatusCode,
    },
    QueryResponse {
        request_id: RequestId,
        status: StatusCode,
        entities: Vec<EntityId>,
    },
    /// Outcome of an outgoing command that succeeded or failed for good.
    /// Commands that exhaust their retries are dropped without one.
    CommandResponse {
        command_id: CommandId,
        status: StatusCode,
        payload: Payload,
    },
}
