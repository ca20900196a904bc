use std::time::Duration;

use crate::{world::host::replication_config::ReplicationConfig, ChannelId};

/// Scheduling state of one replicated object. All times are offsets from the
/// start of the simulation.
#[derive(Clone, Debug)]
pub struct DirtyObjectRecord {
    channel: ChannelId,
    tracked_at: Duration,
    last_sent: Option<Duration>,
    next_eligible: Duration,
    optimal_interval: Duration,
    min_interval: Duration,
    max_interval: Duration,
    priority_multiplier: f64,
    priority: f64,
    creation_order: u64,
    pub(crate) dirty: bool,
    pub(crate) dormant: bool,
    pub(crate) pending_update: bool,
    pub(crate) pending_deletion: bool,
}

impl DirtyObjectRecord {
    pub(crate) fn new(
        channel: ChannelId,
        config: &ReplicationConfig,
        now: Duration,
        creation_order: u64,
    ) -> Self {
        let min_interval = config.min_interval();
        Self {
            channel,
            tracked_at: now,
            last_sent: None,
            next_eligible: now,
            optimal_interval: min_interval,
            min_interval,
            max_interval: config.max_interval(),
            priority_multiplier: config.priority_multiplier,
            priority: 0.0,
            creation_order,
            dirty: true,
            dormant: false,
            pending_update: true,
            pending_deletion: false,
        }
    }

    pub(crate) fn reconfigure(&mut self, channel: ChannelId, config: &ReplicationConfig) {
        self.channel = channel;
        self.min_interval = config.min_interval();
        self.max_interval = config.max_interval();
        self.priority_multiplier = config.priority_multiplier;
    }

    /// Grows with the time since the last send, measured in units of the
    /// minimum interval, scaled by the multiplier
    pub fn priority_at(&self, now: Duration) -> f64 {
        let elapsed = self.elapsed_at(now);
        let intervals = if self.min_interval.is_zero() {
            elapsed.as_secs_f64()
        } else {
            elapsed.as_secs_f64() / self.min_interval.as_secs_f64()
        };
        self.priority_multiplier * intervals
    }

    pub(crate) fn is_eligible(&self, now: Duration) -> bool {
        self.pending_update || now >= self.next_eligible
    }

    pub(crate) fn set_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    pub(crate) fn set_priority_multiplier(&mut self, multiplier: f64) {
        self.priority_multiplier = multiplier;
    }

    pub(crate) fn on_sent(&mut self, now: Duration) {
        let gap = self.elapsed_at(now);
        self.optimal_interval =
            (gap.saturating_mul(7) / 10).clamp(self.min_interval, self.max_interval);
        self.next_eligible = now.saturating_add(self.optimal_interval);
        self.last_sent = Some(now);
        self.dirty = false;
        self.pending_update = false;
    }

    fn elapsed_at(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_sent.unwrap_or(self.tracked_at))
    }

    // Getters

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn last_sent(&self) -> Option<Duration> {
        self.last_sent
    }

    pub fn next_eligible(&self) -> Duration {
        self.next_eligible
    }

    pub fn optimal_interval(&self) -> Duration {
        self.optimal_interval
    }

    /// Priority computed the last time the object was considered
    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_dormant(&self) -> bool {
        self.dormant
    }

    pub fn is_pending_update(&self) -> bool {
        self.pending_update
    }

    pub fn is_pending_deletion(&self) -> bool {
        self.pending_deletion
    }
}
