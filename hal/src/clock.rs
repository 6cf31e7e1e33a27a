//! # Tick Clock
//!
//! Time is measured in kernel ticks. A tick is the smallest scheduling
//! quantum; all deadlines are absolute tick counts. Wrap-around is not
//! handled - runs are assumed to stay well below `u32::MAX` ticks.

use core::ops::Add;
use core::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// An absolute point in time, in kernel ticks since clock start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Tick(u32);

impl Tick {
    /// The clock epoch
    pub const ZERO: Self = Self(0);

    /// Create a tick value from a raw count
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Ticks elapsed since an earlier instant, zero if `earlier` is later
    pub const fn since(self, earlier: Tick) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u32> for Tick {
    type Output = Tick;

    fn add(self, ticks: u32) -> Tick {
        Tick(self.0 + ticks)
    }
}

/// Conversion between milliseconds and ticks at a fixed tick period.
///
/// Mirrors the usual kernel `MS_TO_TICKS` macros: millisecond quantities are
/// truncated to whole ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    period_ms: u32,
}

impl TickRate {
    /// Create a rate from the tick period in milliseconds.
    ///
    /// A zero period is clamped to 1 ms.
    pub const fn from_period_ms(period_ms: u32) -> Self {
        Self {
            period_ms: if period_ms == 0 { 1 } else { period_ms },
        }
    }

    /// The tick period in milliseconds
    pub const fn period_ms(self) -> u32 {
        self.period_ms
    }

    /// The tick period as a [`Duration`]
    pub const fn period(self) -> Duration {
        Duration::from_millis(self.period_ms as u64)
    }

    /// Convert a millisecond quantity to whole ticks
    pub const fn ms_to_ticks(self, ms: u32) -> u32 {
        ms / self.period_ms
    }

    /// Convert a tick instant to elapsed milliseconds since the epoch
    pub const fn ticks_to_ms(self, tick: Tick) -> u32 {
        tick.as_u32() * self.period_ms
    }
}

/// A monotonically nondecreasing source of tick time
pub trait Clock: Send + Sync {
    /// Read the current tick count
    fn now(&self) -> Tick;
}

/// Tick clock derived from the host monotonic clock.
///
/// Ticks advance at the configured rate from the moment of construction.
#[derive(Debug)]
pub struct HostClock {
    epoch: Instant,
    rate: TickRate,
}

impl HostClock {
    /// Start a clock ticking now
    pub fn start(rate: TickRate) -> Self {
        Self {
            epoch: Instant::now(),
            rate,
        }
    }

    /// The rate this clock ticks at
    pub fn rate(&self) -> TickRate {
        self.rate
    }
}

impl Clock for HostClock {
    fn now(&self) -> Tick {
        let elapsed_ms = self.epoch.elapsed().as_millis() as u32;
        Tick::new(elapsed_ms / self.rate.period_ms())
    }
}

/// Manually advanced clock for deterministic drivers and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU32,
}

impl ManualClock {
    /// Create a clock at tick zero
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Create a clock at a given tick
    pub fn at(tick: Tick) -> Self {
        Self {
            ticks: AtomicU32::new(tick.as_u32()),
        }
    }

    /// Advance the clock by a number of ticks
    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Move the clock to an absolute tick.
    ///
    /// Moving backwards is ignored; the clock is monotonic.
    pub fn set(&self, tick: Tick) {
        self.ticks.fetch_max(tick.as_u32(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        Tick::new(self.ticks.load(Ordering::SeqCst))
    }
}
