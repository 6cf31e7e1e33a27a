//! # Scheduler Configuration
//!
//! All timing and sizing knobs, built in one place and threaded into every
//! component. The three reference test benches are provided as named
//! constructors.

use std::time::Duration;

use dds_hal::clock::TickRate;

use crate::task::ClassId;

/// Static timing parameters of one task class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskClassParams {
    /// Worst-case execution time, in milliseconds
    pub execution_ms: u32,
    /// Release period (and relative deadline), in milliseconds
    pub period_ms: u32,
}

impl TaskClassParams {
    /// Create class parameters
    pub const fn new(execution_ms: u32, period_ms: u32) -> Self {
        Self {
            execution_ms,
            period_ms,
        }
    }
}

/// Configuration for a scheduler instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Kernel tick granularity, in milliseconds
    pub tick_period_ms: u32,
    /// Capacity of the request and response channels
    pub queue_capacity: usize,
    /// Capacity of each task list
    pub list_capacity: usize,
    /// Event-logging cutoff, in milliseconds; no scheduling effect
    pub hyper_period_ms: u32,
    /// Monitor reporting period, in milliseconds
    pub monitor_period_ms: u32,
    /// Per-class timing parameters, indexed by class number
    pub classes: Vec<TaskClassParams>,
}

impl SchedulerConfig {
    /// Reference capacity of the message channels
    pub const MESSAGE_QUEUE_SIZE: usize = 50;
    /// Reference capacity of each task list
    pub const LIST_CAPACITY: usize = 64;
    /// Reference tick period: 1 ms
    pub const TICK_PERIOD_MS: u32 = 1;
    /// Reference hyper-period: 1500 ms
    pub const HYPER_PERIOD_MS: u32 = 1500;
    /// Reference monitor period: 2000 ms
    pub const MONITOR_PERIOD_MS: u32 = 2000;

    /// Create a configuration with the reference knobs and the given classes
    pub fn new(classes: Vec<TaskClassParams>) -> Self {
        Self {
            tick_period_ms: Self::TICK_PERIOD_MS,
            queue_capacity: Self::MESSAGE_QUEUE_SIZE,
            list_capacity: Self::LIST_CAPACITY,
            hyper_period_ms: Self::HYPER_PERIOD_MS,
            monitor_period_ms: Self::MONITOR_PERIOD_MS,
            classes,
        }
    }

    /// The tick rate all ms-to-tick conversions use
    pub fn tick_rate(&self) -> TickRate {
        TickRate::from_period_ms(self.tick_period_ms)
    }

    /// Number of configured task classes
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Parameters of a class, if configured
    pub fn class(&self, class: ClassId) -> Option<&TaskClassParams> {
        let index = (class.as_u16() as usize).checked_sub(1)?;
        self.classes.get(index)
    }

    /// A class's period in whole ticks
    pub fn period_ticks(&self, class: ClassId) -> Option<u32> {
        self.class(class)
            .map(|params| self.tick_rate().ms_to_ticks(params.period_ms))
    }

    /// A class's execution budget in whole ticks
    pub fn execution_ticks(&self, class: ClassId) -> Option<u32> {
        self.class(class)
            .map(|params| self.tick_rate().ms_to_ticks(params.execution_ms))
    }

    /// A class's release period as a [`Duration`]
    pub fn period(&self, class: ClassId) -> Option<Duration> {
        self.class(class)
            .map(|params| Duration::from_millis(params.period_ms as u64))
    }

    /// The monitor reporting period as a [`Duration`]
    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(self.monitor_period_ms as u64)
    }
}

/// The reference workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBench {
    /// Periods 500/500/750 ms, executions 95/150/250 ms
    One,
    /// Periods 250/500/750 ms, executions 95/150/250 ms
    Two,
    /// Periods 500/500/500 ms, executions 100/200/200 ms
    Three,
}

impl TestBench {
    /// Select a bench by its number (1..=3)
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(TestBench::One),
            2 => Some(TestBench::Two),
            3 => Some(TestBench::Three),
            _ => None,
        }
    }

    /// The per-class parameters of this bench
    pub fn classes(self) -> Vec<TaskClassParams> {
        match self {
            TestBench::One => vec![
                TaskClassParams::new(95, 500),
                TaskClassParams::new(150, 500),
                TaskClassParams::new(250, 750),
            ],
            TestBench::Two => vec![
                TaskClassParams::new(95, 250),
                TaskClassParams::new(150, 500),
                TaskClassParams::new(250, 750),
            ],
            TestBench::Three => vec![
                TaskClassParams::new(100, 500),
                TaskClassParams::new(200, 500),
                TaskClassParams::new(200, 500),
            ],
        }
    }

    /// A full configuration for this bench
    pub fn config(self) -> SchedulerConfig {
        SchedulerConfig::new(self.classes())
    }
}
