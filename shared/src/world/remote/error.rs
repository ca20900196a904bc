use thiserror::Error;

use crate::world::identity::IdentityError;

/// Failures that abort processing of incoming ops.
///
/// Malformed ops are logged and skipped, never reported here. Only a broken
/// identity mapping stops the receiver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReceiverError {
    #[error("Identity invariant violated: {0}")]
    Identity(#[from] IdentityError),
}
