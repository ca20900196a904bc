use std::collections::HashMap;

use crate::{world::liveness::LivenessToken, RequestId};

pub struct PendingRequest<O, C> {
    pub continuation: C,
    /// Liveness of the object that issued the request, if any
    pub owner: Option<LivenessToken<O>>,
}

/// Continuations of in-flight requests, keyed by correlation id
pub struct PendingRequests<O, C> {
    next_request_id: RequestId,
    pending: HashMap<RequestId, PendingRequest<O, C>>,
}

impl<O, C> PendingRequests<O, C> {
    pub fn new() -> Self {
        Self {
            next_request_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Reserves a fresh correlation id for `continuation`
    pub fn insert(&mut self, continuation: C, owner: Option<LivenessToken<O>>) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        self.pending.insert(
            request_id,
            PendingRequest {
                continuation,
                owner,
            },
        );
        request_id
    }

    /// Removes and returns the continuation for `request_id`. A second
    /// completion for the same id finds nothing.
    pub fn take(&mut self, request_id: &RequestId) -> Option<PendingRequest<O, C>> {
        self.pending.remove(request_id)
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<O, C> Default for PendingRequests<O, C> {
    fn default() -> Self {
        Self::new()
    }
}
