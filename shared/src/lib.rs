//! # Spindle Shared
//! Identity resolution, deferred reference resolution, critical-section op
//! batching and replication scheduling for workers of a partitioned
//! simulation fabric.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod ops;
mod request;
mod types;
mod world;

pub use ops::{EntityQuery, LogLevel, OutboundMessage, StatusCode, WorkerOp};
pub use request::{PendingRequest, PendingRequests};
pub use types::{
    ChannelId, CommandIndex, ComponentId, EntityId, FieldId, Offset, RequestId, ROOT_OFFSET,
};
pub use world::{
    authority::Authority,
    host::{
        DirtyObjectRecord, ReplicationConfig, ReplicationReport, ReplicationScheduler,
        ReplicationSink,
    },
    identity::{
        GlobalRef, IdNamespace, IdentityCache, IdentityConfig, IdentityError, LocalId,
        OuterChain, PathRemapper, SessionPrefixRemapper,
    },
    liveness::{LivenessToken, ObjectLiveness},
    object_model::{ObjectKey, ObjectModel, ObjectModelError, ObjectNaming},
    payload::{ComponentData, FieldData, Payload, ResolvedPayload},
    remote::{
        CallKey, DeferredCall, DeferredResolver, FieldKey, ObjectEvent, OpBatcher, ReadyCall,
        ReadyField, Receiver, ReceiverError, Resolution,
    },
};
