//! Fixed-interval tick pacing.

use std::time::{Duration, Instant};

/// Paces ticks at a fixed interval, or not at all.
///
/// Deadlines advance by whole intervals from the start time, so a slow tick
/// does not shift every later one. When a tick falls more than one interval
/// behind, the schedule restarts from now instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Option<Duration>,
    next: Option<Instant>,
    ticks: u64,
    late: u64,
}

impl TickTimer {
    /// Timer firing every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: (!interval.is_zero()).then_some(interval),
            next: None,
            ticks: 0,
            late: 0,
        }
    }

    /// Timer firing once per block: `frames / sample_rate` seconds.
    pub fn for_blocks(frames: usize, sample_rate: u32) -> Self {
        let secs = frames as f64 / f64::from(sample_rate.max(1));
        Self::new(Duration::from_secs_f64(secs))
    }

    /// Timer that never waits.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Interval between ticks, `None` when unthrottled.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Ticks released so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that arrived more than one interval behind schedule.
    pub fn late_ticks(&self) -> u64 {
        self.late
    }

    /// Blocks until the next tick is due.
    pub fn wait(&mut self) {
        self.ticks += 1;
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        let Some(deadline) = self.next else {
            self.next = Some(now + interval);
            return;
        };
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next = Some(deadline + interval);
        } else if now - deadline > interval {
            self.late += 1;
            tracing::trace!(behind = ?(now - deadline), "tick late, rescheduling");
            self.next = Some(now + interval);
        } else {
            self.next = Some(deadline + interval);
        }
    }

    /// Restarts the schedule at the next [`TickTimer::wait`].
    pub fn reset(&mut self) {
        self.next = None;
        self.ticks = 0;
        self.late = 0;
    }
}
