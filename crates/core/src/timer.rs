//! Wall-clock session timer.
//!
//! A monotonic accumulator ticked once per second by the session scheduler.
//! Pausing stops accumulation without resetting; resuming continues exactly
//! where the count left off.

/// Formats a second count as `mm:ss`.
pub fn format_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Default)]
pub struct SessionTimer {
    elapsed: u64,
    paused: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the timer by one second unless paused.
    pub fn tick(&mut self) {
        if !self.paused {
            self.elapsed += 1;
        }
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Idempotent.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed
    }

    pub fn formatted(&self) -> String {
        format_mmss(self.elapsed)
    }
}
