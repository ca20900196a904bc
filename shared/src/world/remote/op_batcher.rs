use log::warn;

use crate::ops::WorkerOp;

/// Buffers ops received inside a critical section and releases them in a
/// fixed, dependency-respecting order when the section closes:
///
/// 1. `RemoveEntity`
/// 2. `AddEntity`
/// 3. `AddComponent`, ascending by component id
/// 4. `AuthorityChange`
/// 5. every other op, in arrival order
pub struct OpBatcher {
    open: bool,
    removed_entities: Vec<WorkerOp>,
    added_entities: Vec<WorkerOp>,
    added_components: Vec<WorkerOp>,
    authority_changes: Vec<WorkerOp>,
    held: Vec<WorkerOp>,
}

impl OpBatcher {
    pub fn new() -> Self {
        Self {
            open: false,
            removed_entities: Vec::new(),
            added_entities: Vec::new(),
            added_components: Vec::new(),
            authority_changes: Vec::new(),
            held: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        if self.open {
            warn!("Critical section opened while one is already open, continuing to buffer");
        }
        self.open = true;
    }

    /// Buffers `op`. Returns it back if no critical section is open.
    pub fn buffer(&mut self, op: WorkerOp) -> Option<WorkerOp> {
        if !self.open {
            return Some(op);
        }
        match op {
            WorkerOp::RemoveEntity { .. } => self.removed_entities.push(op),
            WorkerOp::AddEntity { .. } => self.added_entities.push(op),
            WorkerOp::AddComponent { .. } => self.added_components.push(op),
            WorkerOp::AuthorityChange { .. } => self.authority_changes.push(op),
            WorkerOp::CriticalSection(_) => {
                warn!("Ignoring nested critical section marker");
            }
            _ => self.held.push(op),
        }
        None
    }

    /// Closes the critical section and returns its ops in application order.
    /// Closing a section that was never opened yields nothing.
    pub fn close(&mut self) -> Vec<WorkerOp> {
        if !self.open {
            warn!("Critical section closed without being opened");
            return Vec::new();
        }
        self.open = false;

        // stable, so ops on the same component keep arrival order
        self.added_components.sort_by_key(|op| match op {
            WorkerOp::AddComponent { data, .. } => data.component_id,
            _ => 0,
        });

        let mut ops = Vec::with_capacity(self.len());
        ops.append(&mut self.removed_entities);
        ops.append(&mut self.added_entities);
        ops.append(&mut self.added_components);
        ops.append(&mut self.authority_changes);
        ops.append(&mut self.held);
        ops
    }

    pub fn len(&self) -> usize {
        self.removed_entities.len()
            + self.added_entities.len()
            + self.added_components.len()
            + self.authority_changes.len()
            + self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OpBatcher {
    fn default() -> Self {
        Self::new()
    }
}
