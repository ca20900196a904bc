use std::time::Duration;

use spindle_shared::{CommandIndex, ComponentId, EntityId, Payload};

/// Identifies an outgoing command across all of its attempts
pub type CommandId = u64;

/// An outgoing command and how often it was sent
#[derive(Clone, Debug)]
pub struct OutgoingCommand {
    pub command_id: CommandId,
    pub entity_id: EntityId,
    pub component_id: ComponentId,
    pub command_index: CommandIndex,
    pub payload: Payload,
    pub attempts: u32,
}

/// Holds failed commands until their backoff elapses
pub struct CommandRetry {
    max_attempts: u32,
    base_backoff: Duration,
    scheduled: Vec<(Duration, OutgoingCommand)>,
}

impl CommandRetry {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff,
            scheduled: Vec::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Schedules another attempt unless the command used up its attempts.
    /// Gives the command back when it will not be retried.
    pub fn schedule(
        &mut self,
        command: OutgoingCommand,
        now: Duration,
    ) -> Result<Duration, OutgoingCommand> {
        if command.attempts >= self.max_attempts {
            return Err(command);
        }
        let due = now + self.backoff(command.attempts);
        self.scheduled.push((due, command));
        Ok(due)
    }

    /// Removes and returns the commands whose backoff has elapsed, in the
    /// order they were scheduled
    pub fn take_due(&mut self, now: Duration) -> Vec<OutgoingCommand> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.scheduled.len() {
            if self.scheduled[index].0 <= now {
                due.push(self.scheduled.remove(index).1);
            } else {
                index += 1;
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    fn backoff(&self, attempts: u32) -> Duration {
        let doublings = attempts.saturating_sub(1).min(10);
        self.base_backoff * (1u32 << doublings)
    }
}
