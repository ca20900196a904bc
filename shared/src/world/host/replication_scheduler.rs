use std::{collections::HashMap, time::Duration};

use log::{debug, trace, warn};

use crate::{
    world::{
        host::{dirty_object_record::DirtyObjectRecord, replication_config::ReplicationConfig},
        object_model::ObjectKey,
    },
    ChannelId,
};

/// Outbound side of one channel, as seen by the scheduler
pub trait ReplicationSink<O> {
    /// Backpressure: once saturated, nothing more is sent this tick
    fn is_saturated(&self) -> bool;

    /// Sends the object's dirty state. Returns false if the object cannot be
    /// addressed yet, in which case it stays dirty.
    fn send_object(&mut self, object: &O) -> bool;

    fn send_deletion(&mut self, object: &O);

    /// Objects for which this returns true stop being considered until woken
    fn should_go_dormant(&self, _object: &O) -> bool {
        false
    }
}

/// Outcome of one `replicate` pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    pub considered: usize,
    pub sent: usize,
    pub deletions_sent: usize,
    /// Considered but not sent because the channel saturated
    pub deferred: usize,
    pub saturated: bool,
}

/// Decides, every tick and per channel, which dirty objects are sent before
/// the channel saturates
pub struct ReplicationScheduler<O: ObjectKey> {
    records: HashMap<O, DirtyObjectRecord>,
    default_config: ReplicationConfig,
    next_creation_order: u64,
}

impl<O: ObjectKey> ReplicationScheduler<O> {
    pub fn new(default_config: ReplicationConfig) -> Self {
        Self {
            records: HashMap::new(),
            default_config,
            next_creation_order: 0,
        }
    }

    pub fn default_config(&self) -> &ReplicationConfig {
        &self.default_config
    }

    // Tracking

    /// Starts replicating `object` on `channel`. Tracking an object again
    /// moves it to the new channel and band, keeping its timing.
    pub fn track(
        &mut self,
        object: O,
        channel: ChannelId,
        config: &ReplicationConfig,
        now: Duration,
    ) {
        if let Some(record) = self.records.get_mut(&object) {
            record.reconfigure(channel, config);
            return;
        }
        let creation_order = self.next_creation_order;
        self.next_creation_order += 1;
        self.records.insert(
            object,
            DirtyObjectRecord::new(channel, config, now, creation_order),
        );
    }

    pub fn track_with_default(&mut self, object: O, channel: ChannelId, now: Duration) {
        let config = self.default_config.clone();
        self.track(object, channel, &config, now);
    }

    pub fn untrack(&mut self, object: &O) -> bool {
        self.records.remove(object).is_some()
    }

    pub fn is_tracked(&self, object: &O) -> bool {
        self.records.contains_key(object)
    }

    /// Drops every record on `channel`, returning their objects
    pub fn close_channel(&mut self, channel: ChannelId) -> Vec<O> {
        let closed: Vec<O> = self
            .records
            .iter()
            .filter(|(_, record)| record.channel() == channel)
            .map(|(object, _)| *object)
            .collect();
        for object in &closed {
            self.records.remove(object);
        }
        debug!("Closed channel {} with {} tracked objects", channel, closed.len());
        closed
    }

    // State changes

    pub fn mark_dirty(&mut self, object: &O) -> bool {
        self.with_record(object, "mark dirty", |record| record.dirty = true)
    }

    /// Schedules a deletion; it takes precedence over every update on the
    /// object's channel
    pub fn queue_deletion(&mut self, object: &O) -> bool {
        self.with_record(object, "queue deletion of", |record| {
            record.pending_deletion = true
        })
    }

    pub fn set_dormant(&mut self, object: &O) -> bool {
        self.with_record(object, "make dormant", |record| record.dormant = true)
    }

    /// Clears dormancy; the object is considered again on the next pass
    pub fn wake(&mut self, object: &O) -> bool {
        self.with_record(object, "wake", |record| {
            record.dormant = false;
            record.pending_update = true;
        })
    }

    pub fn set_priority_multiplier(&mut self, object: &O, multiplier: f64) -> bool {
        self.with_record(object, "set priority of", |record| {
            record.set_priority_multiplier(multiplier)
        })
    }

    fn with_record(
        &mut self,
        object: &O,
        action: &str,
        change: impl FnOnce(&mut DirtyObjectRecord),
    ) -> bool {
        match self.records.get_mut(object) {
            Some(record) => {
                change(record);
                true
            }
            None => {
                warn!("Cannot {} untracked object {:?}", action, object);
                false
            }
        }
    }

    // Queries

    pub fn record(&self, object: &O) -> Option<&DirtyObjectRecord> {
        self.records.get(object)
    }

    pub fn priority_of(&self, object: &O, now: Duration) -> Option<f64> {
        self.records.get(object).map(|record| record.priority_at(now))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // Replication

    /// Runs one scheduling pass over `channel`: pending deletions first, then
    /// eligible dirty objects by descending priority, until `sink` saturates
    pub fn replicate<S: ReplicationSink<O>>(
        &mut self,
        now: Duration,
        channel: ChannelId,
        sink: &mut S,
    ) -> ReplicationReport {
        let mut report = ReplicationReport::default();

        let mut deletions: Vec<(u64, O)> = self
            .records
            .iter()
            .filter(|(_, record)| record.channel() == channel && record.pending_deletion)
            .map(|(object, record)| (record.creation_order(), *object))
            .collect();
        deletions.sort_unstable_by_key(|(creation_order, _)| *creation_order);

        for (_, object) in deletions {
            if sink.is_saturated() {
                report.saturated = true;
                break;
            }
            sink.send_deletion(&object);
            self.records.remove(&object);
            report.deletions_sent += 1;
        }

        let mut considered: Vec<(f64, u64, O)> = Vec::new();
        for (object, record) in self.records.iter_mut() {
            if record.channel() != channel
                || record.pending_deletion
                || record.dormant
                || !record.dirty
                || !record.is_eligible(now)
            {
                continue;
            }
            if sink.should_go_dormant(object) {
                trace!("{:?} went dormant", object);
                record.dormant = true;
                continue;
            }
            let priority = record.priority_at(now);
            record.set_priority(priority);
            considered.push((priority, record.creation_order(), *object));
        }

        // descending priority, ties by creation order
        considered.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        report.considered = considered.len();

        for (_, _, object) in considered {
            let Some(record) = self.records.get_mut(&object) else {
                continue;
            };
            if report.saturated || sink.is_saturated() {
                report.saturated = true;
                record.pending_update = true;
                report.deferred += 1;
                continue;
            }
            if sink.send_object(&object) {
                record.on_sent(now);
                report.sent += 1;
            } else {
                trace!("{:?} is not addressable yet, keeping it dirty", object);
            }
        }

        if report.deferred > 0 {
            debug!(
                "Channel {} saturated, deferred {} of {} objects",
                channel, report.deferred, report.considered
            );
        }
        report
    }
}
