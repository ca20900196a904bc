use std::collections::VecDeque;

use log::{debug, warn};

use spindle_shared::{EntityId, RequestId};

/// Entity ids reserved in advance, so objects can be created without waiting
/// for the fabric to pick an id
pub struct EntityPool {
    ids: VecDeque<EntityId>,
    reservation_in_flight: Option<RequestId>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self {
            ids: VecDeque::new(),
            reservation_in_flight: None,
        }
    }

    pub fn needs_refill(&self, threshold: u32) -> bool {
        self.reservation_in_flight.is_none() && self.ids.len() < threshold as usize
    }

    pub fn reservation_sent(&mut self, request_id: RequestId) {
        self.reservation_in_flight = Some(request_id);
    }

    /// Adds `count` consecutive ids starting at `first`
    pub fn reservation_completed(
        &mut self,
        request_id: RequestId,
        first: Option<EntityId>,
        count: u32,
    ) {
        if self.reservation_in_flight == Some(request_id) {
            self.reservation_in_flight = None;
        }
        let Some(first) = first else {
            warn!("Entity id reservation {} returned no ids", request_id);
            return;
        };
        for offset in 0..i64::from(count) {
            self.ids.push_back(EntityId::new(first.value() + offset));
        }
        debug!("Reserved {} entity ids starting at {}", count, first);
    }

    pub fn reservation_failed(&mut self, request_id: RequestId) {
        if self.reservation_in_flight == Some(request_id) {
            self.reservation_in_flight = None;
        }
    }

    pub fn take(&mut self) -> Option<EntityId> {
        self.ids.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
