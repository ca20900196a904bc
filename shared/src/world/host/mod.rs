mod dirty_object_record;
mod replication_config;
mod replication_scheduler;


pub use dirty_object_record::DirtyObjectRecord;
pub use replication_config::ReplicationConfig;
pub use replication_scheduler::{ReplicationReport, ReplicationScheduler, ReplicationSink};
