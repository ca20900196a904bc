//! # Spindle Worker
//! Drives a local object model from the op batches a simulation fabric
//! delivers each tick, resumes asynchronous requests when their completions
//! arrive, and replicates dirty objects back out under channel backpressure.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use spindle_shared::{
        Authority, ChannelId, CommandIndex, ComponentData, ComponentId, EntityId, EntityQuery,
        FieldData, FieldId, GlobalRef, LocalId, ObjectEvent, ObjectKey, ObjectModel,
        ObjectModelError, ObjectNaming, Offset, OutboundMessage, Payload, ReplicationConfig,
        ReplicationReport, RequestId, ResolvedPayload, StatusCode, WorkerOp,
    };
}

mod error;
mod events;
mod worker;

pub use error::SpindleWorkerError;
pub use events::WorkerEvent;
pub use worker::{CommandId, ReplicationSource, Worker, WorkerConfig};
