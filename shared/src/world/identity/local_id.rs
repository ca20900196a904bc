use std::fmt;

/// Which of the two disjoint `LocalId` namespaces a handle belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IdNamespace {
    /// Handles for objects bound to fabric entities created at runtime.
    Dynamic,
    /// Handles for well-known, path-addressed objects.
    Static,
}

impl IdNamespace {
    fn bit(&self) -> u64 {
        match self {
            IdNamespace::Dynamic => 0,
            IdNamespace::Static => 1,
        }
    }
}

// LocalId
/// Opaque, process-local handle for an object.
///
/// The low bit selects the namespace, so a dynamic and a static handle can
/// never compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u64);

impl LocalId {
    pub(crate) fn compose(index: u64, namespace: IdNamespace) -> Self {
        Self((index << 1) | namespace.bit())
    }

    pub fn namespace(&self) -> IdNamespace {
        if self.0 & 1 == 1 {
            IdNamespace::Static
        } else {
            IdNamespace::Dynamic
        }
    }

    pub fn is_static(&self) -> bool {
        self.namespace() == IdNamespace::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.namespace() == IdNamespace::Dynamic
    }

    pub fn index(&self) -> u64 {
        self.0 >> 1
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            IdNamespace::Dynamic => write!(f, "LocalId(dyn:{})", self.index()),
            IdNamespace::Static => write!(f, "LocalId(static:{})", self.index()),
        }
    }
}

// LocalIdGenerator
pub(crate) struct LocalIdGenerator {
    next_dynamic: u64,
    next_static: u64,
}

impl LocalIdGenerator {
    pub fn new() -> Self {
        Self {
            next_dynamic: 0,
            next_static: 0,
        }
    }

    pub fn generate(&mut self, namespace: IdNamespace) -> LocalId {
        let counter = match namespace {
            IdNamespace::Dynamic => &mut self.next_dynamic,
            IdNamespace::Static => &mut self.next_static,
        };
        // index 0 is never issued
        *counter += 1;
        LocalId::compose(*counter, namespace)
    }
}
