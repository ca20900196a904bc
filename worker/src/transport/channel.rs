use std::collections::HashMap;

use smol::channel::{self, Receiver, Sender, TryRecvError};

use spindle_shared::{ChannelId, OutboundMessage, WorkerOp};

use super::{Transport, TransportError};

/// Tick-side half of an in-process connection. Op batches produced on any
/// thread by a `FabricEndpoint` are drained here without blocking.
pub struct ChannelTransport {
    op_receiver: Receiver<Vec<WorkerOp>>,
    message_sender: Sender<(ChannelId, OutboundMessage)>,
    budget_per_tick: Option<usize>,
    sent_this_tick: HashMap<ChannelId, usize>,
}

/// Fabric-side half of an in-process connection. Cloneable and `Send`, so
/// network I/O can run on a background thread.
#[derive(Clone)]
pub struct FabricEndpoint {
    op_sender: Sender<Vec<WorkerOp>>,
    message_receiver: Receiver<(ChannelId, OutboundMessage)>,
}

impl ChannelTransport {
    pub fn unbounded() -> (Self, FabricEndpoint) {
        let (op_sender, op_receiver) = channel::unbounded();
        let (message_sender, message_receiver) = channel::unbounded();
        (
            Self {
                op_receiver,
                message_sender,
                budget_per_tick: None,
                sent_this_tick: HashMap::new(),
            },
            FabricEndpoint {
                op_sender,
                message_receiver,
            },
        )
    }

    /// Reports a channel as saturated once `budget` messages were sent on it
    /// during the current tick
    pub fn with_budget_per_tick(mut self, budget: usize) -> Self {
        self.budget_per_tick = Some(budget);
        self
    }
}

impl Transport for ChannelTransport {
    fn receive_batch(&mut self) -> Result<Option<Vec<WorkerOp>>, TransportError> {
        match self.op_receiver.try_recv() {
            Ok(batch) => Ok(Some(batch)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(TransportError::Disconnected),
        }
    }

    fn send(&mut self, channel: ChannelId, message: OutboundMessage) -> Result<(), TransportError> {
        *self.sent_this_tick.entry(channel).or_default() += 1;
        self.message_sender
            .try_send((channel, message))
            .map_err(|err| TransportError::SendFailed {
                channel,
                message: format!("{:?}", err.into_inner().1),
            })
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

impl FabricEndpoint {
    pub fn send_ops(&self, batch: Vec<WorkerOp>) -> Result<(), TransportError> {
        self.op_sender
            .send_blocking(batch)
            .map_err(|_| TransportError::Disconnected)
    }

    /// Returns the next message the worker sent, if any
    pub fn try_recv_message(&self) -> Option<(ChannelId, OutboundMessage)> {
        self.message_receiver.try_recv().ok()
    }

    pub fn drain_messages(&self) -> Vec<(ChannelId, OutboundMessage)> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv_message() {
            messages.push(message);
        }
        messages
    }
}
