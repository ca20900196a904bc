/// In-memory transport for worker tests.
/// Routes op batches and outbound messages without threads or I/O.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use spindle_shared::{ChannelId, OutboundMessage, WorkerOp};
use spindle_worker::transport::{Transport, TransportError};

#[derive(Default)]
struct LocalState {
    incoming: VecDeque<Vec<WorkerOp>>,
    sent: Vec<(ChannelId, OutboundMessage)>,
    disconnected: bool,
}

fn lock(state: &Mutex<LocalState>) -> MutexGuard<'_, LocalState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker side of the connection
pub struct LocalTransport {
    state: Arc<Mutex<LocalState>>,
    budget_per_tick: Option<usize>,
    sent_this_tick: HashMap<ChannelId, usize>,
}

/// Fabric side of the connection, driven by the test
#[derive(Clone)]
pub struct LocalFabric {
    state: Arc<Mutex<LocalState>>,
}

impl LocalTransport {
    pub fn new() -> (Self, LocalFabric) {
        let state = Arc::new(Mutex::new(LocalState::default()));
        (
            Self {
                state: state.clone(),
                budget_per_tick: None,
                sent_this_tick: HashMap::new(),
            },
            LocalFabric { state },
        )
    }

    /// Saturates a channel after `budget` messages in one tick
    pub fn with_budget_per_tick(mut self, budget: usize) -> Self {
        self.budget_per_tick = Some(budget);
        self
    }
}

impl Transport for LocalTransport {
    fn receive_batch(&mut self) -> Result<Option<Vec<WorkerOp>>, TransportError> {
        let mut state = lock(&self.state);
        if let Some(batch) = state.incoming.pop_front() {
            return Ok(Some(batch));
        }
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        Ok(None)
    }

    fn send(&mut self, channel: ChannelId, message: OutboundMessage) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        *self.sent_this_tick.entry(channel).or_default() += 1;
        state.sent.push((channel, message));
        Ok(())
    }

    fn is_saturated(&self, channel: ChannelId) -> bool {
        match self.budget_per_tick {
            Some(budget) => self.sent_this_tick.get(&channel).copied().unwrap_or(0) >= budget,
            None => false,
        }
    }

    fn end_tick(&mut self) {
        self.sent_this_tick.clear();
    }
}

impl LocalFabric {
    /// Queues one ordered op batch for the worker's next receive
    pub fn push_ops(&self, batch: Vec<WorkerOp>) {
        lock(&self.state).incoming.push_back(batch);
    }

    /// Returns every message the worker sent since the last call
    pub fn take_sent(&self) -> Vec<(ChannelId, OutboundMessage)> {
        std::mem::take(&mut lock(&self.state).sent)
    }

    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }
}
