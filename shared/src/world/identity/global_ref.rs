use std::fmt;

use crate::{EntityId, Offset, ROOT_OFFSET};

/// Distributed identifier for an object.
///
/// `Entity` addresses a fabric-visible entity or one of its offset-addressable
/// sub-objects. `Path` addresses a stably-named, non-replicated object by its
/// name relative to an outer object, recursively.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum GlobalRef {
    Entity {
        entity_id: EntityId,
        offset: Offset,
    },
    Path {
        path: String,
        outer: Option<Box<GlobalRef>>,
    },
}

impl GlobalRef {
    pub fn entity(entity_id: EntityId) -> Self {
        Self::Entity {
            entity_id,
            offset: ROOT_OFFSET,
        }
    }

    pub fn subobject(entity_id: EntityId, offset: Offset) -> Self {
        Self::Entity { entity_id, offset }
    }

    pub fn path(path: impl Into<String>, outer: Option<GlobalRef>) -> Self {
        Self::Path {
            path: path.into(),
            outer: outer.map(Box::new),
        }
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Entity { entity_id, .. } => Some(*entity_id),
            Self::Path { .. } => None,
        }
    }

    pub fn is_entity_root(&self) -> bool {
        matches!(self, Self::Entity { offset, .. } if *offset == ROOT_OFFSET)
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Self::Path { .. })
    }

    /// Iterates this ref followed by each outer ref, innermost first.
    pub fn outer_chain(&self) -> OuterChain<'_> {
        OuterChain { next: Some(self) }
    }

    /// The entity ref a path ref is ultimately named under, if any
    pub fn entity_anchor(&self) -> Option<&GlobalRef> {
        if !self.is_path() {
            return None;
        }
        self.outer_chain()
            .last()
            .filter(|outermost| !outermost.is_path())
    }

    /// Applies `remap` to every path component along the outer chain.
    pub(crate) fn map_paths(&mut self, remap: &dyn Fn(&str) -> String) {
        let mut iterator = self;
        loop {
            match iterator {
                GlobalRef::Entity { .. } => return,
                GlobalRef::Path { path, outer } => {
                    *path = remap(path);
                    match outer {
                        Some(next) => iterator = next.as_mut(),
                        None => return,
                    }
                }
            }
        }
    }
}

pub struct OuterChain<'a> {
    next: Option<&'a GlobalRef>,
}

impl<'a> Iterator for OuterChain<'a> {
    type Item = &'a GlobalRef;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = match current {
            GlobalRef::Path {
                outer: Some(outer), ..
            } => Some(outer.as_ref()),
            _ => None,
        };
        Some(current)
    }
}

impl fmt::Debug for GlobalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for GlobalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { entity_id, offset } => {
                write!(f, "(entity {}, offset {})", entity_id, offset)
            }
            Self::Path { path, outer } => match outer {
                Some(outer) => write!(f, "{}.{}", outer, path),
                None => write!(f, "{}", path),
            },
        }
    }
}
