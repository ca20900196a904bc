use std::collections::{hash_map::Entry, HashMap, HashSet, VecDeque};

use log::trace;

use crate::{
    world::{identity::GlobalRef, object_model::ObjectKey, payload::Payload},
    CommandIndex, ComponentId, FieldId, RequestId,
};

/// A field of a component on a local object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey<O> {
    pub object: O,
    pub component_id: ComponentId,
    pub field_id: FieldId,
}

/// A command on a local object. Calls sharing a key execute in receipt order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallKey<O> {
    pub target: O,
    pub component_id: ComponentId,
    pub command_index: CommandIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Consumer<O> {
    Field(FieldKey<O>),
    Call(CallKey<O>),
}

struct PendingField {
    payload: Payload,
    waiting: HashSet<GlobalRef>,
}

/// A received command held back until its arguments resolve and every
/// earlier call with the same key has run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredCall {
    pub request_id: RequestId,
    pub payload: Payload,
    waiting: HashSet<GlobalRef>,
}

impl DeferredCall {
    pub fn is_ready(&self) -> bool {
        self.waiting.is_empty()
    }
}

/// A buffered field payload to decode again. `complete` is set once none of
/// its references remain unresolved.
pub struct ReadyField<O> {
    pub key: FieldKey<O>,
    pub payload: Payload,
    pub complete: bool,
}

pub struct ReadyCall<O> {
    pub key: CallKey<O>,
    pub call: DeferredCall,
}

/// Work released by the registration of one reference
pub struct Resolution<O> {
    pub fields: Vec<ReadyField<O>>,
    pub calls: Vec<ReadyCall<O>>,
}

impl<O> Resolution<O> {
    fn empty() -> Self {
        Self {
            fields: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.calls.is_empty()
    }
}

/// Tracks incoming field values and commands that reference objects not yet
/// known locally, and releases them once those objects appear
pub struct DeferredResolver<O: ObjectKey> {
    ref_waiters: HashMap<GlobalRef, HashSet<Consumer<O>>>,
    // awaited path refs keyed by the entity ref their outer chain ends at
    anchored_paths: HashMap<GlobalRef, HashSet<GlobalRef>>,
    pending_fields: HashMap<FieldKey<O>, PendingField>,
    call_queues: HashMap<CallKey<O>, VecDeque<DeferredCall>>,
}

impl<O: ObjectKey> DeferredResolver<O> {
    pub fn new() -> Self {
        Self {
            ref_waiters: HashMap::new(),
            anchored_paths: HashMap::new(),
            pending_fields: HashMap::new(),
            call_queues: HashMap::new(),
        }
    }

    // Fields

    /// Records the latest value of a field and the references it still
    /// waits on. Any earlier buffered value for the same field is superseded.
    pub fn queue_field(
        &mut self,
        key: FieldKey<O>,
        payload: Payload,
        unresolved: HashSet<GlobalRef>,
    ) {
        if let Some(superseded) = self.pending_fields.remove(&key) {
            for global_ref in &superseded.waiting {
                self.remove_waiter(global_ref, &Consumer::Field(key));
            }
        }
        if unresolved.is_empty() {
            return;
        }

        for global_ref in &unresolved {
            self.add_waiter(global_ref, Consumer::Field(key));
        }
        trace!(
            "Field {:?} waits on {} unresolved references",
            key,
            unresolved.len()
        );
        self.pending_fields.insert(
            key,
            PendingField {
                payload,
                waiting: unresolved,
            },
        );
    }

    pub fn is_field_pending(&self, key: &FieldKey<O>) -> bool {
        self.pending_fields.contains_key(key)
    }

    // Calls

    /// True if earlier calls with this key are still held back, in which case
    /// a new call must queue behind them even if fully resolved
    pub fn has_queued_calls(&self, key: &CallKey<O>) -> bool {
        self.call_queues
            .get(key)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }

    pub fn enqueue_call(
        &mut self,
        key: CallKey<O>,
        request_id: RequestId,
        payload: Payload,
        unresolved: HashSet<GlobalRef>,
    ) {
        for global_ref in &unresolved {
            self.add_waiter(global_ref, Consumer::Call(key));
        }
        trace!(
            "Call {:?} (request {}) queued behind {} unresolved references",
            key,
            request_id,
            unresolved.len()
        );
        self.call_queues
            .entry(key)
            .or_default()
            .push_back(DeferredCall {
                request_id,
                payload,
                waiting: unresolved,
            });
    }

    // Resolution

    /// Releases everything waiting on `global_ref`. Each waiting consumer is
    /// released once; calls come out in receipt order per key.
    pub fn resolve(&mut self, global_ref: &GlobalRef) -> Resolution<O> {
        let Some(consumers) = self.ref_waiters.remove(global_ref) else {
            return Resolution::empty();
        };
        self.unanchor(global_ref);

        let mut resolution = Resolution::empty();
        let mut field_keys = Vec::new();
        let mut call_keys = Vec::new();
        for consumer in consumers {
            match consumer {
                Consumer::Field(key) => field_keys.push(key),
                Consumer::Call(key) => call_keys.push(key),
            }
        }

        for key in field_keys {
            let Entry::Occupied(mut entry) = self.pending_fields.entry(key) else {
                continue;
            };
            entry.get_mut().waiting.remove(global_ref);
            if entry.get().waiting.is_empty() {
                let pending = entry.remove();
                resolution.fields.push(ReadyField {
                    key,
                    payload: pending.payload,
                    complete: true,
                });
            } else {
                resolution.fields.push(ReadyField {
                    key,
                    payload: entry.get().payload.clone(),
                    complete: false,
                });
            }
        }

        for key in call_keys {
            if let Some(queue) = self.call_queues.get_mut(&key) {
                for call in queue.iter_mut() {
                    call.waiting.remove(global_ref);
                }
            }
            self.drain_ready_calls(key, &mut resolution.calls);
        }

        resolution
    }

    /// Pops calls from the front of the queue for `key` while they have no
    /// outstanding references
    fn drain_ready_calls(&mut self, key: CallKey<O>, ready: &mut Vec<ReadyCall<O>>) {
        let Some(queue) = self.call_queues.get_mut(&key) else {
            return;
        };
        while queue.front().map(DeferredCall::is_ready).unwrap_or(false) {
            if let Some(call) = queue.pop_front() {
                ready.push(ReadyCall { key, call });
            }
        }
        if queue.is_empty() {
            self.call_queues.remove(&key);
        }
    }

    // Cleanup

    /// Discards everything buffered for `object`
    pub fn forget_object(&mut self, object: &O) {
        let field_keys: Vec<FieldKey<O>> = self
            .pending_fields
            .keys()
            .filter(|key| key.object == *object)
            .copied()
            .collect();
        for key in field_keys {
            self.forget_field(&key);
        }

        let call_keys: Vec<CallKey<O>> = self
            .call_queues
            .keys()
            .filter(|key| key.target == *object)
            .copied()
            .collect();
        for key in call_keys {
            self.forget_calls(&key);
        }
    }

    /// Discards buffered values for one component of `object`
    pub fn forget_component(&mut self, object: &O, component_id: ComponentId) {
        let field_keys: Vec<FieldKey<O>> = self
            .pending_fields
            .keys()
            .filter(|key| key.object == *object && key.component_id == component_id)
            .copied()
            .collect();
        for key in field_keys {
            self.forget_field(&key);
        }
    }

    fn forget_field(&mut self, key: &FieldKey<O>) {
        if let Some(pending) = self.pending_fields.remove(key) {
            for global_ref in &pending.waiting {
                self.remove_waiter(global_ref, &Consumer::Field(*key));
            }
        }
    }

    fn forget_calls(&mut self, key: &CallKey<O>) {
        if let Some(queue) = self.call_queues.remove(key) {
            for call in queue {
                for global_ref in &call.waiting {
                    self.remove_waiter(global_ref, &Consumer::Call(*key));
                }
            }
        }
    }

    /// Awaited path refs whose outer chain ends at `anchor`. They may load
    /// once `anchor` is registered.
    pub fn paths_anchored_on(&self, anchor: &GlobalRef) -> Vec<GlobalRef> {
        self.anchored_paths
            .get(anchor)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn add_waiter(&mut self, global_ref: &GlobalRef, consumer: Consumer<O>) {
        self.ref_waiters
            .entry(global_ref.clone())
            .or_default()
            .insert(consumer);
        if let Some(anchor) = global_ref.entity_anchor() {
            self.anchored_paths
                .entry(anchor.clone())
                .or_default()
                .insert(global_ref.clone());
        }
    }

    fn unanchor(&mut self, global_ref: &GlobalRef) {
        let Some(anchor) = global_ref.entity_anchor() else {
            return;
        };
        let mut emptied = false;
        if let Some(paths) = self.anchored_paths.get_mut(anchor) {
            paths.remove(global_ref);
            emptied = paths.is_empty();
        }
        if emptied {
            self.anchored_paths.remove(anchor);
        }
    }

    fn remove_waiter(&mut self, global_ref: &GlobalRef, consumer: &Consumer<O>) {
        let mut emptied = false;
        if let Some(consumers) = self.ref_waiters.get_mut(global_ref) {
            consumers.remove(consumer);
            emptied = consumers.is_empty();
        }
        if emptied {
            self.ref_waiters.remove(global_ref);
            self.unanchor(global_ref);
        }
    }

    pub fn pending_field_count(&self) -> usize {
        self.pending_fields.len()
    }

    pub fn queued_call_count(&self) -> usize {
        self.call_queues.values().map(VecDeque::len).sum()
    }

    pub fn awaited_ref_count(&self) -> usize {
        self.ref_waiters.len()
    }
}

impl<O: ObjectKey> Default for DeferredResolver<O> {
    fn default() -> Self {
        Self::new()
    }
}
