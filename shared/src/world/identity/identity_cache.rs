use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{
    world::{
        identity::{
            error::IdentityError,
            global_ref::GlobalRef,
            local_id::{IdNamespace, LocalId, LocalIdGenerator},
            path_remapper::{PathRemapper, SessionPrefixRemapper},
        },
        object_model::{ObjectKey, ObjectNaming},
    },
    EntityId, Offset, ROOT_OFFSET,
};

/// Configuration of the identity cache
#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    /// Session-local prefixes stripped from every path segment before a
    /// stably-named reference is stored or looked up
    pub session_path_prefixes: Vec<String>,
}

/// Bidirectional map between process-local object handles and distributed
/// references.
///
/// Every object that has been resolved owns exactly one `LocalId`, and every
/// `LocalId` maps to at most one `GlobalRef` and back. Attempting to break
/// that bijection is reported as an `IdentityError`.
pub struct IdentityCache<O: ObjectKey> {
    generator: LocalIdGenerator,
    object_to_local: HashMap<O, LocalId>,
    local_to_object: HashMap<LocalId, O>,
    local_to_global: HashMap<LocalId, GlobalRef>,
    global_to_local: HashMap<GlobalRef, LocalId>,
    entity_offsets: HashMap<EntityId, HashSet<Offset>>,
    remapper: Box<dyn PathRemapper>,
    newly_registered: Vec<GlobalRef>,
}

impl<O: ObjectKey> IdentityCache<O> {
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_remapper(Box::new(SessionPrefixRemapper::new(
            config.session_path_prefixes.clone(),
        )))
    }

    pub fn with_remapper(remapper: Box<dyn PathRemapper>) -> Self {
        Self {
            generator: LocalIdGenerator::new(),
            object_to_local: HashMap::new(),
            local_to_object: HashMap::new(),
            local_to_global: HashMap::new(),
            global_to_local: HashMap::new(),
            entity_offsets: HashMap::new(),
            remapper,
            newly_registered: Vec::new(),
        }
    }

    // Assign

    /// Binds `object` to the root of `entity_id` and each sub-object to its
    /// offset inside that entity. Returns the existing root handle if the
    /// entity is already bound to `object`.
    pub fn assign_for_entity(
        &mut self,
        object: O,
        entity_id: EntityId,
        subobjects: &[(O, Offset)],
    ) -> Result<LocalId, IdentityError> {
        if !entity_id.is_valid() {
            return Err(IdentityError::InvalidEntityId {
                entity_id: entity_id.value(),
            });
        }

        let root_ref = GlobalRef::entity(entity_id);
        if let Some(existing_local) = self.global_to_local.get(&root_ref) {
            let existing_local = *existing_local;
            if self.local_to_object.get(&existing_local) != Some(&object) {
                return Err(IdentityError::ConflictingGlobalRef {
                    global_ref: root_ref.to_string(),
                    existing: format!("{:?}", existing_local),
                    requested: format!("{:?}", object),
                });
            }
            return Ok(existing_local);
        }

        let mut bindings = vec![(object, root_ref.clone())];
        for (subobject, offset) in subobjects {
            if *offset == ROOT_OFFSET {
                warn!(
                    "Ignoring sub-object {:?} of entity {} declared at the root offset",
                    subobject, entity_id
                );
                continue;
            }
            bindings.push((*subobject, GlobalRef::subobject(entity_id, *offset)));
        }
        // nothing is written unless every binding fits
        self.check_bindings(&bindings)?;

        let local_id = self.bind(object, root_ref, IdNamespace::Dynamic)?;
        debug!(
            "Registered {:?} for object {:?} as entity {}",
            local_id, object, entity_id
        );
        for (subobject, global_ref) in bindings.into_iter().skip(1) {
            let sub_local = self.bind(subobject, global_ref, IdNamespace::Dynamic)?;
            debug!(
                "Registered {:?} for sub-object {:?} of entity {}",
                sub_local, subobject, entity_id
            );
        }

        Ok(local_id)
    }

    /// Binds a single sub-object to `offset` inside an entity
    pub fn assign_for_subobject(
        &mut self,
        subobject: O,
        entity_id: EntityId,
        offset: Offset,
    ) -> Result<LocalId, IdentityError> {
        let sub_local = self.bind(
            subobject,
            GlobalRef::subobject(entity_id, offset),
            IdNamespace::Dynamic,
        )?;
        debug!(
            "Registered {:?} for sub-object {:?} at offset {} of entity {}",
            sub_local, subobject, offset, entity_id
        );
        Ok(sub_local)
    }

    /// Names a stably-named object by its path relative to its outer chain.
    ///
    /// Ancestors without a record are named on the way, outermost first. The
    /// walk stops at the first ancestor that already has a record.
    pub fn assign_for_static_path<N: ObjectNaming<O> + ?Sized>(
        &mut self,
        object: O,
        naming: &N,
    ) -> Result<LocalId, IdentityError> {
        let mut unnamed = Vec::new();
        let mut visited = HashSet::new();
        let mut outer_ref: Option<GlobalRef> = None;
        let mut current = Some(object);

        while let Some(next) = current {
            if !visited.insert(next) {
                warn!(
                    "Outer chain of {:?} loops back to {:?}, treating {:?} as outermost",
                    object,
                    next,
                    unnamed.last()
                );
                break;
            }
            if let Some(global_ref) = self.global_ref_of(&next) {
                outer_ref = Some(global_ref.clone());
                break;
            }
            unnamed.push(next);
            current = naming.outer(&next);
        }

        let mut bindings = Vec::with_capacity(unnamed.len());
        for unnamed_object in unnamed.iter().rev() {
            let path = self.remapper.remap(&naming.path_name(unnamed_object));
            let global_ref = GlobalRef::Path {
                path,
                outer: outer_ref.take().map(Box::new),
            };
            outer_ref = Some(global_ref.clone());
            bindings.push((*unnamed_object, global_ref));
        }
        self.check_bindings(&bindings)?;

        for (unnamed_object, global_ref) in bindings {
            let local_id = self.bind(unnamed_object, global_ref.clone(), IdNamespace::Static)?;
            debug!(
                "Registered {:?} for stably named object {:?} as {}",
                local_id, unnamed_object, global_ref
            );
        }

        // every object on the chain now has a handle
        match self.object_to_local.get(&object) {
            Some(local_id) => Ok(*local_id),
            None => Ok(self.get_or_assign_local_id(object, IdNamespace::Static)),
        }
    }

    // Lookup

    pub fn lookup_by_local(&self, local_id: &LocalId) -> Option<&GlobalRef> {
        self.local_to_global.get(local_id)
    }

    /// Soft lookup: a miss is `None`, never an error
    pub fn lookup_by_global(&self, global_ref: &GlobalRef) -> Option<LocalId> {
        match global_ref {
            GlobalRef::Entity { .. } => self.global_to_local.get(global_ref).copied(),
            GlobalRef::Path { .. } => {
                let normalized = self.normalize(global_ref);
                self.global_to_local.get(&normalized).copied()
            }
        }
    }

    pub fn object_of(&self, local_id: &LocalId) -> Option<O> {
        self.local_to_object.get(local_id).copied()
    }

    pub fn local_id_of(&self, object: &O) -> Option<LocalId> {
        self.object_to_local.get(object).copied()
    }

    pub fn global_ref_of(&self, object: &O) -> Option<&GlobalRef> {
        let local_id = self.object_to_local.get(object)?;
        self.local_to_global.get(local_id)
    }

    pub fn object_of_global(&self, global_ref: &GlobalRef) -> Option<O> {
        let local_id = self.lookup_by_global(global_ref)?;
        self.object_of(&local_id)
    }

    pub fn entity_root(&self, entity_id: &EntityId) -> Option<O> {
        self.object_of_global(&GlobalRef::entity(*entity_id))
    }

    pub fn has_entity(&self, entity_id: &EntityId) -> bool {
        self.entity_offsets.contains_key(entity_id)
    }

    /// Returns `global_ref` with every path segment network-normalized
    pub fn normalize(&self, global_ref: &GlobalRef) -> GlobalRef {
        let mut normalized = global_ref.clone();
        let remapper = &self.remapper;
        normalized.map_paths(&|path| remapper.remap(path));
        normalized
    }

    // Remove

    /// Removes the records of an entity and all of its sub-objects, returning
    /// the objects that were bound to them
    pub fn remove(&mut self, entity_id: &EntityId) -> Vec<O> {
        let mut removed = Vec::new();
        let Some(offsets) = self.entity_offsets.remove(entity_id) else {
            return removed;
        };

        let mut offsets: Vec<Offset> = offsets.into_iter().collect();
        offsets.sort_unstable();
        for offset in offsets {
            let global_ref = GlobalRef::subobject(*entity_id, offset);
            if let Some(object) = self.remove_record(&global_ref) {
                removed.push(object);
            }
        }
        debug!("Removed {} identities of entity {}", removed.len(), entity_id);
        removed
    }

    /// Forgets a single object. Removing an entity's root object cascades to
    /// the whole entity.
    pub fn remove_object(&mut self, object: &O) -> Vec<O> {
        let Some(local_id) = self.object_to_local.get(object).copied() else {
            return Vec::new();
        };
        match self.local_to_global.get(&local_id).cloned() {
            Some(GlobalRef::Entity { entity_id, offset }) if offset == ROOT_OFFSET => {
                self.remove(&entity_id)
            }
            Some(global_ref) => {
                if let GlobalRef::Entity { entity_id, offset } = &global_ref {
                    let mut emptied = false;
                    if let Some(offsets) = self.entity_offsets.get_mut(entity_id) {
                        offsets.remove(offset);
                        emptied = offsets.is_empty();
                    }
                    if emptied {
                        self.entity_offsets.remove(entity_id);
                    }
                }
                self.remove_record(&global_ref).into_iter().collect()
            }
            None => {
                self.object_to_local.remove(object);
                self.local_to_object.remove(&local_id);
                vec![*object]
            }
        }
    }

    /// Drains the references whose records were created since the last call
    pub fn take_newly_registered(&mut self) -> Vec<GlobalRef> {
        std::mem::take(&mut self.newly_registered)
    }

    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocalId, &GlobalRef)> {
        self.local_to_global.iter()
    }

    // Private

    /// Fails if any `(object, ref)` pair would break the bijection, either
    /// against existing records or against an earlier pair in `bindings`
    fn check_bindings(&self, bindings: &[(O, GlobalRef)]) -> Result<(), IdentityError> {
        let mut staged_refs: HashMap<O, &GlobalRef> = HashMap::new();
        let mut staged_objects: HashMap<&GlobalRef, O> = HashMap::new();

        for (object, global_ref) in bindings {
            let bound_ref = staged_refs
                .get(object)
                .copied()
                .or_else(|| self.global_ref_of(object));
            if let Some(existing) = bound_ref {
                if existing != global_ref {
                    return Err(IdentityError::ConflictingLocalId {
                        local_id: match self.object_to_local.get(object) {
                            Some(local_id) => format!("{:?}", local_id),
                            None => format!("{:?}", object),
                        },
                        existing: existing.to_string(),
                        requested: global_ref.to_string(),
                    });
                }
            }

            let bound_object = staged_objects.get(global_ref).copied().or_else(|| {
                self.global_to_local
                    .get(global_ref)
                    .and_then(|local_id| self.local_to_object.get(local_id).copied())
            });
            if let Some(existing) = bound_object {
                if existing != *object {
                    return Err(IdentityError::ConflictingGlobalRef {
                        global_ref: global_ref.to_string(),
                        existing: format!("{:?}", existing),
                        requested: format!("{:?}", object),
                    });
                }
            }

            staged_refs.insert(*object, global_ref);
            staged_objects.insert(global_ref, *object);
        }
        Ok(())
    }

    /// Binds `object` to `global_ref`. The handle is only created once the
    /// pair is known to fit.
    fn bind(
        &mut self,
        object: O,
        global_ref: GlobalRef,
        namespace: IdNamespace,
    ) -> Result<LocalId, IdentityError> {
        self.check_bindings(std::slice::from_ref(&(object, global_ref.clone())))?;
        let local_id = self.get_or_assign_local_id(object, namespace);
        self.register(local_id, global_ref)?;
        Ok(local_id)
    }

    fn get_or_assign_local_id(&mut self, object: O, namespace: IdNamespace) -> LocalId {
        if let Some(local_id) = self.object_to_local.get(&object) {
            return *local_id;
        }
        let local_id = self.generator.generate(namespace);
        self.object_to_local.insert(object, local_id);
        self.local_to_object.insert(local_id, object);
        local_id
    }

    fn register(&mut self, local_id: LocalId, global_ref: GlobalRef) -> Result<(), IdentityError> {
        if let Some(existing) = self.local_to_global.get(&local_id) {
            if existing == &global_ref {
                return Ok(());
            }
            return Err(IdentityError::ConflictingLocalId {
                local_id: format!("{:?}", local_id),
                existing: existing.to_string(),
                requested: global_ref.to_string(),
            });
        }
        if let Some(existing) = self.global_to_local.get(&global_ref) {
            return Err(IdentityError::ConflictingGlobalRef {
                global_ref: global_ref.to_string(),
                existing: format!("{:?}", existing),
                requested: format!("{:?}", local_id),
            });
        }

        if let GlobalRef::Entity { entity_id, offset } = &global_ref {
            self.entity_offsets
                .entry(*entity_id)
                .or_default()
                .insert(*offset);
        }
        self.local_to_global.insert(local_id, global_ref.clone());
        self.global_to_local.insert(global_ref.clone(), local_id);
        self.newly_registered.push(global_ref);
        Ok(())
    }

    fn remove_record(&mut self, global_ref: &GlobalRef) -> Option<O> {
        let local_id = self.global_to_local.remove(global_ref)?;
        self.local_to_global.remove(&local_id);
        let object = self.local_to_object.remove(&local_id)?;
        self.object_to_local.remove(&object);
        Some(object)
    }
}
