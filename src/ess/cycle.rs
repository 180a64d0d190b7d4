//! Cycle stages and the SET_WORK_STATE keep-alive timer.

use std::time::{Duration, Instant};

/// Interval after which the work-state command is reissued even when
/// the requested state has not changed. The device drops to standby if
/// it stops hearing from the controller.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Points in the polling cycle where a device gets control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// New telemetry has been read but not yet committed.
    BeforeProcessImage,
    /// Telemetry is committed; derived values are produced here.
    AfterProcessImage,
    /// Last chance to queue commands before the write flush.
    BeforeControllers,
}

/// Tracks when the keep-alive command was last put on the wire.
#[derive(Debug, Default)]
pub struct KeepAlive {
    last_issued: Option<Instant>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the command must be issued this cycle: never issued
    /// yet, or strictly more than the interval has elapsed. Exactly at
    /// the interval boundary the command is not yet due.
    pub fn due(&self, now: Instant) -> bool {
        match self.last_issued {
            None => true,
            Some(last) => now > last + KEEP_ALIVE_INTERVAL,
        }
    }

    /// Records a successful issue.
    pub fn mark_issued(&mut self, now: Instant) {
        self.last_issued = Some(now);
    }
}
