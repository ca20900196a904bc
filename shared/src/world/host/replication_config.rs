use std::time::Duration;

/// Update-frequency band and priority scaling for one replicated object
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicationConfig {
    /// Lowest rate, in Hz, an object is replicated at while it keeps changing
    pub min_update_frequency: f64,
    /// Highest rate, in Hz, an object may be replicated at
    pub max_update_frequency: f64,
    /// Scales the object's priority against others on the same channel
    pub priority_multiplier: f64,
}

impl ReplicationConfig {
    /// Shortest interval between two sends, `1 / max_update_frequency`
    pub fn min_interval(&self) -> Duration {
        interval_of(self.max_update_frequency)
    }

    /// Longest interval between two sends, `1 / min_update_frequency`, never
    /// below `min_interval`
    pub fn max_interval(&self) -> Duration {
        interval_of(self.min_update_frequency).max(self.min_interval())
    }
}

// vanishingly small rates saturate instead of overflowing
fn interval_of(frequency: f64) -> Duration {
    if frequency > 0.0 {
        Duration::try_from_secs_f64(1.0 / frequency).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            min_update_frequency: 2.0,
            max_update_frequency: 30.0,
            priority_multiplier: 1.0,
        }
    }
}
