use std::{fmt::Debug, hash::Hash};

use thiserror::Error;

use crate::{
    world::{
        authority::Authority,
        payload::{Payload, ResolvedPayload},
    },
    CommandIndex, ComponentId, EntityId, FieldId, Offset,
};

/// Handle type of an object in the host's object model
pub trait ObjectKey: Copy + Eq + Hash + Debug {}
impl<T: Copy + Eq + Hash + Debug> ObjectKey for T {}

/// Structure used to name stably-named objects: every object may live inside
/// an outer object, and has a name unique within that outer.
pub trait ObjectNaming<O> {
    fn outer(&self, object: &O) -> Option<O>;
    fn path_name(&self, object: &O) -> String;
}

/// The host's object model, as seen by the receiving side
pub trait ObjectModel<O: ObjectKey>: ObjectNaming<O> {
    /// Creates the local representation of a newly visible entity. Returning
    /// `None` rejects the entity.
    fn spawn_entity_object(&mut self, entity_id: EntityId) -> Option<O>;

    /// Offset-addressable sub-objects currently owned by `object`
    fn subobject_offsets(&self, object: &O) -> Vec<(O, Offset)>;

    fn destroy_object(&mut self, object: &O);

    fn add_component(&mut self, object: &O, component_id: ComponentId)
        -> Result<(), ObjectModelError>;

    fn remove_component(&mut self, object: &O, component_id: ComponentId);

    fn apply_field(
        &mut self,
        object: &O,
        component_id: ComponentId,
        field_id: FieldId,
        payload: ResolvedPayload<O>,
    ) -> Result<(), ObjectModelError>;

    fn invoke_command(
        &mut self,
        object: &O,
        component_id: ComponentId,
        command_index: CommandIndex,
        payload: ResolvedPayload<O>,
    ) -> Result<Payload, ObjectModelError>;

    fn on_authority_change(
        &mut self,
        _object: &O,
        _component_id: ComponentId,
        _authority: Authority,
    ) {
    }

    /// Finds an already loaded stably-named object by name inside `outer`
    fn find_static_object(&self, _path: &str, _outer: Option<&O>) -> Option<O> {
        None
    }
}

/// Failures reported by the object model while applying incoming data
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectModelError {
    #[error("Object {object} has no component {component_id}")]
    UnknownComponent {
        object: String,
        component_id: ComponentId,
    },

    #[error("Component {component_id} of object {object} has no field {field_id}")]
    UnknownField {
        object: String,
        component_id: ComponentId,
        field_id: FieldId,
    },

    #[error("Component {component_id} of object {object} has no command {command_index}")]
    UnknownCommand {
        object: String,
        component_id: ComponentId,
        command_index: CommandIndex,
    },

    #[error("Malformed payload for object {object}: {reason}")]
    MalformedPayload { object: String, reason: String },
}
