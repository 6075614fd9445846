//! Render-rate throttling.
//!
//! Smoothed spectrum state updates on every tick; chart rebuilds go through a
//! [`RenderGate`]. A gate is a pure skip: when it says no, the rebuild is
//! dropped, not deferred.
//!
//! Time-based gates read a [`Clock`] so tests can drive them with a
//! [`ManualClock`] instead of the wall clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default chart refresh rate in frames per second.
pub const DEFAULT_FPS: f64 = 60.0;

/// Monotonic time source.
pub trait Clock: Send {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(duration_nanos(by), Ordering::Relaxed);
    }

    /// Sets the absolute time.
    pub fn set(&self, to: Duration) {
        self.nanos.store(duration_nanos(to), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Decides, once per tick, whether the chart is rebuilt.
pub trait RenderGate: Send {
    /// Returns true if this tick may rebuild. A true result counts as a
    /// rebuild for the gate's own bookkeeping.
    fn ready(&mut self) -> bool;

    /// Forgets the last rebuild so the next tick is eligible.
    fn reset(&mut self) {}
}

/// Wall-clock gate: at most one rebuild per `interval`.
///
/// A tick is eligible when at least `interval` has passed since the last
/// eligible tick. The first tick is always eligible.
#[derive(Debug, Clone)]
pub struct FrameRateGate<C> {
    clock: C,
    interval: Duration,
    last: Option<Duration>,
}

impl<C: Clock> FrameRateGate<C> {
    /// Creates a gate with an explicit interval.
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last: None,
        }
    }

    /// Creates a gate allowing `fps` rebuilds per second.
    ///
    /// A non-positive or non-finite rate disables throttling.
    pub fn with_fps(clock: C, fps: f64) -> Self {
        let interval = if fps.is_finite() && fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Self::new(clock, interval)
    }

    /// Minimum time between rebuilds.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<C: Clock> RenderGate for FrameRateGate<C> {
    fn ready(&mut self) -> bool {
        let now = self.clock.now();
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Tick-count gate: one rebuild every `every` ticks, starting with the first.
#[derive(Debug, Clone)]
pub struct TickDivider {
    every: u64,
    count: u64,
}

impl TickDivider {
    /// Creates a divider. `every` of zero behaves like one.
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }
}

impl RenderGate for TickDivider {
    fn ready(&mut self) -> bool {
        let ready = self.count % self.every == 0;
        self.count += 1;
        ready
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Gate that never throttles.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRender;

impl RenderGate for AlwaysRender {
    fn ready(&mut self) -> bool {
        true
    }
}
