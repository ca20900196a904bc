use std::collections::HashMap;

use crate::{
    world::{
        authority::Authority,
        object_model::{ObjectModel, ObjectModelError, ObjectNaming},
        payload::{Payload, ResolvedPayload},
    },
    CommandIndex, ComponentId, EntityId, FieldId, Offset,
};


type Object = u32;

/// Object model that records every call made into it
#[derive(Default)]
struct RecordingModel {
    next_object: Object,
    roots: HashMap<Object, EntityId>,
    subobjects: HashMap<Object, Vec<(Object, Offset)>>,
    names: HashMap<Object, (Option<Object>, String)>,
    calls: Vec<String>,
    applied: Vec<(Object, ComponentId, FieldId, ResolvedPayload<Object>)>,
    invoked: Vec<(Object, CommandIndex, Vec<u8>)>,
    failing_commands: bool,
}

impl RecordingModel {
    fn add_static(&mut self, outer: Option<Object>, name: &str) -> Object {
        self.next_object += 1;
        let object = 10_000 + self.next_object;
        self.names.insert(object, (outer, name.to_string()));
        object
    }

    fn applied_objects(&self, object: Object) -> Vec<Vec<Option<Object>>> {
        self.applied
            .iter()
            .filter(|(target, ..)| *target == object)
            .map(|(_, _, _, payload)| payload.objects.clone())
            .collect()
    }
}

impl ObjectNaming<Object> for RecordingModel {
    fn outer(&self, object: &Object) -> Option<Object> {
        self.names.get(object).and_then(|(outer, _)| *outer)
    }

    fn path_name(&self, object: &Object) -> String {
        self.names
            .get(object)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| format!("Object{}", object))
    }
}

impl ObjectModel<Object> for RecordingModel {
    fn spawn_entity_object(&mut self, entity_id: EntityId) -> Option<Object> {
        self.calls.push(format!("spawn {}", entity_id));
        self.next_object += 1;
        let object = self.next_object;
        self.roots.insert(object, entity_id);
        Some(object)
    }

    fn subobject_offsets(&self, object: &Object) -> Vec<(Object, Offset)> {
        self.subobjects.get(object).cloned().unwrap_or_default()
    }

    fn destroy_object(&mut self, object: &Object) {
        if let Some(entity_id) = self.roots.remove(object) {
            self.calls.push(format!("destroy {}", entity_id));
        }
        self.subobjects.remove(object);
    }

    fn add_component(
        &mut self,
        object: &Object,
        component_id: ComponentId,
    ) -> Result<(), ObjectModelError> {
        let Some(entity_id) = self.roots.get(object) else {
            return Err(ObjectModelError::UnknownComponent {
                object: format!("{:?}", object),
                component_id,
            });
        };
        self.calls.push(format!("add {} {}", entity_id, component_id));
        self.subobjects
            .entry(*object)
            .or_default()
            .push((object * 1000 + component_id, component_id));
        Ok(())
    }

    fn remove_component(&mut self, object: &Object, component_id: ComponentId) {
        self.calls.push(format!("remove {:?} {}", object, component_id));
    }

    fn apply_field(
        &mut self,
        object: &Object,
        component_id: ComponentId,
        field_id: FieldId,
        payload: ResolvedPayload<Object>,
    ) -> Result<(), ObjectModelError> {
        self.applied.push((*object, component_id, field_id, payload));
        Ok(())
    }

    fn invoke_command(
        &mut self,
        object: &Object,
        component_id: ComponentId,
        command_index: CommandIndex,
        payload: ResolvedPayload<Object>,
    ) -> Result<Payload, ObjectModelError> {
        if self.failing_commands {
            return Err(ObjectModelError::UnknownCommand {
                object: format!("{:?}", object),
                component_id,
                command_index,
            });
        }
        self.invoked.push((*object, command_index, payload.bytes.clone()));
        Ok(Payload::from_bytes(payload.bytes))
    }

    fn on_authority_change(
        &mut self,
        object: &Object,
        component_id: ComponentId,
        authority: Authority,
    ) {
        let entity_id = self.roots.get(object).copied().unwrap_or(EntityId::new(0));
        self.calls
            .push(format!("authority {} {} {:?}", entity_id, component_id, authority));
    }

    fn find_static_object(&self, path: &str, outer: Option<&Object>) -> Option<Object> {
        self.names
            .iter()
            .find(|(_, (object_outer, name))| name == path && object_outer.as_ref() == outer)
            .map(|(object, _)| *object)
    }
}
