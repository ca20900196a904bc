use crate::{world::identity::GlobalRef, ComponentId, FieldId};

/// Serialized value of a field or command argument list, together with the
/// object references the serialization layer extracted from it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub refs: Vec<GlobalRef>,
}

impl Payload {
    pub fn new(bytes: Vec<u8>, refs: Vec<GlobalRef>) -> Self {
        Self { bytes, refs }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            refs: Vec::new(),
        }
    }

    pub fn has_refs(&self) -> bool {
        !self.refs.is_empty()
    }
}

/// A `Payload` whose references were looked up locally. Slots that could not
/// be resolved are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPayload<O> {
    pub bytes: Vec<u8>,
    pub objects: Vec<Option<O>>,
}

impl<O> ResolvedPayload<O> {
    pub fn is_fully_resolved(&self) -> bool {
        self.objects.iter().all(Option::is_some)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldData {
    pub field_id: FieldId,
    pub payload: Payload,
}

impl FieldData {
    pub fn new(field_id: FieldId, payload: Payload) -> Self {
        Self { field_id, payload }
    }
}

/// Initial or updated state of one component
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentData {
    pub component_id: ComponentId,
    pub fields: Vec<FieldData>,
}

impl ComponentData {
    pub fn new(component_id: ComponentId, fields: Vec<FieldData>) -> Self {
        Self {
            component_id,
            fields,
        }
    }

    pub fn empty(component_id: ComponentId) -> Self {
        Self::new(component_id, Vec::new())
    }
}
