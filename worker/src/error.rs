use thiserror::Error;

use spindle_shared::ReceiverError;

use crate::transport::TransportError;

/// Failures that stop a worker tick
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpindleWorkerError {
    /// The identity mapping was corrupted by the incoming op stream
    #[error("{0}")]
    Identity(#[from] ReceiverError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}
