use thiserror::Error;

use spindle_shared::{ChannelId, OutboundMessage, WorkerOp};

/// Connection between a worker and the fabric.
///
/// Implementations never block: `receive_batch` returns `None` when no batch
/// is waiting.
pub trait Transport {
    /// Returns the next ordered op batch, if one arrived
    fn receive_batch(&mut self) -> Result<Option<Vec<WorkerOp>>, TransportError>;

    fn send(&mut self, channel: ChannelId, message: OutboundMessage) -> Result<(), TransportError>;

    /// Backpressure signal for `channel`; not an error
    fn is_saturated(&self, channel: ChannelId) -> bool;

    /// Called once at the end of every outbound pass
    fn end_tick(&mut self) {}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport is disconnected from the fabric")]
    Disconnected,

    #[error("Failed to send {message} on channel {channel}")]
    SendFailed { channel: ChannelId, message: String },
}

cfg_if! {
    if #[cfg(feature = "transport_channel")] {
        mod channel;
        pub use channel::{ChannelTransport, FabricEndpoint};
    }
}
