use crate::{
    world::authority::Authority, CommandIndex, ComponentId, EntityId, FieldId, RequestId,
};

/// Changes applied to the local object model, in the order they happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectEvent<O> {
    Spawned {
        entity_id: EntityId,
        object: O,
    },
    Despawned {
        entity_id: EntityId,
        object: O,
    },
    ComponentAdded {
        entity_id: EntityId,
        object: O,
        component_id: ComponentId,
    },
    ComponentUpdated {
        entity_id: EntityId,
        object: O,
        component_id: ComponentId,
    },
    ComponentRemoved {
        entity_id: EntityId,
        object: O,
        component_id: ComponentId,
    },
    /// A field that was waiting on unresolved references now has all of them
    FieldResolved {
        object: O,
        component_id: ComponentId,
        field_id: FieldId,
    },
    CommandDispatched {
        object: O,
        component_id: ComponentId,
        command_index: CommandIndex,
        request_id: RequestId,
    },
    AuthorityChanged {
        entity_id: EntityId,
        object: O,
        component_id: ComponentId,
        authority: Authority,
    },
}

impl<O: Copy> ObjectEvent<O> {
    pub fn object(&self) -> O {
        match self {
            Self::Spawned { object, .. }
            | Self::Despawned { object, .. }
            | Self::ComponentAdded { object, .. }
            | Self::ComponentUpdated { object, .. }
            | Self::ComponentRemoved { object, .. }
            | Self::FieldResolved { object, .. }
            | Self::CommandDispatched { object, .. }
            | Self::AuthorityChanged { object, .. } => *object,
        }
    }
}
