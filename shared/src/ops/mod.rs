mod outbound_message;
mod status_code;
mod worker_op;

pub use outbound_message::{EntityQuery, OutboundMessage};
pub use status_code::{LogLevel, StatusCode};
pub use worker_op::WorkerOp;
