mod deferred_resolver;
mod error;
mod object_event;
mod op_batcher;
mod receiver;

#[cfg(test)]
mod tests;

pub use deferred_resolver::{
    CallKey, DeferredCall, DeferredResolver, FieldKey, ReadyCall, ReadyField, Resolution,
};
pub use error::ReceiverError;
pub use object_event::ObjectEvent;
pub use op_batcher::OpBatcher;
pub use receiver::Receiver;
