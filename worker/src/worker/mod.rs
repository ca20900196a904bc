mod command_retry;
mod entity_pool;
mod replication_source;
mod worker;
mod worker_config;

pub use command_retry::CommandId;
pub use replication_source::ReplicationSource;
pub use worker::Worker;
pub use worker_config::WorkerConfig;
