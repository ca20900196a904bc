use std::time::Duration;

use spindle_shared::{ChannelId, ReplicationReport};
use spindle_worker::{SpindleWorkerError, Worker, WorkerConfig};

use crate::{LocalFabric, LocalTransport, TestEntity, TestWorld};

pub type TestWorker = Worker<TestEntity, LocalTransport>;

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Worker over a fresh local transport. The entity id pool is disabled so
/// tests only see the requests they make.
pub fn test_worker() -> (TestWorker, LocalFabric) {
    let config = WorkerConfig {
        entity_pool_size: 0,
        ..WorkerConfig::default()
    };
    let (transport, fabric) = LocalTransport::new();
    (Worker::new(config, transport), fabric)
}

/// Runs one full worker tick: apply incoming ops, then send outgoing state
pub fn tick(
    worker: &mut TestWorker,
    world: &mut TestWorld,
    now: Duration,
) -> Result<Vec<(ChannelId, ReplicationReport)>, SpindleWorkerError> {
    worker.receive_ops(world, now)?;
    worker.send_all_updates(world, now)
}
