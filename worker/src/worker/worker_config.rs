use std::{default::Default, time::Duration};

use spindle_shared::{ChannelId, IdentityConfig, ReplicationConfig};

/// Contains Config properties which will be used by the Worker
#[derive(Clone)]
pub struct WorkerConfig {
    /// Used to normalize stably-named object paths
    pub identity: IdentityConfig,
    /// Frequency band applied to objects replicated without their own
    pub replication: ReplicationConfig,
    /// Channel carrying requests, command responses and entity lifecycle
    /// messages
    pub control_channel: ChannelId,
    /// Number of entity ids reserved per reservation request. 0 disables the
    /// pool and lets the fabric pick ids at creation.
    pub entity_pool_size: u32,
    /// A new reservation is requested once fewer ids than this remain
    pub entity_pool_refill_threshold: u32,
    /// Total attempts for an outgoing command failing with a retryable status
    pub command_retry_attempts: u32,
    /// Wait before the first retry, doubled for each further attempt
    pub command_retry_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            replication: ReplicationConfig::default(),
            control_channel: 0,
            entity_pool_size: 3000,
            entity_pool_refill_threshold: 1000,
            command_retry_attempts: 5,
            command_retry_backoff: Duration::from_millis(100),
        }
    }
}
