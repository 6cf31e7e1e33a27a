//! # Task Instance Records
//!
//! A DD-task is one released instance of a task class. The record names the
//! kernel task that executes the instance and carries the timing facts the
//! scheduler decides with. Once an instance leaves the Active list its
//! release time and deadline are frozen.

use dds_hal::clock::Tick;
use dds_hal::task::TaskHandle;

/// Instance identifier, unique across the system lifetime.
///
/// Generators draw ids from disjoint per-class ranges (1000/2000/3000
/// bases), so uniqueness needs no cross-class coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl TaskId {
    /// Create an id from its raw value
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Task class selector.
///
/// Classes are small integers fixed at system build; each selects the
/// per-class static parameters (period, worst-case execution time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u16);

impl ClassId {
    /// Create a class id. Classes are numbered from 1.
    pub const fn new(class: u16) -> Self {
        Self(class)
    }

    /// Get the raw class number
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// The id base for instances of this class
    pub const fn id_base(self) -> u32 {
        self.0 as u32 * 1000
    }
}

/// Kind of a task instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Released on every period boundary by a generator
    Periodic,
    /// One-shot release with an explicitly supplied deadline
    Aperiodic,
}

/// One released task instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdTask {
    /// Kernel task that executes this instance
    pub handle: TaskHandle,
    /// Periodic or aperiodic
    pub kind: TaskKind,
    /// Instance identifier
    pub id: TaskId,
    /// Class this instance belongs to
    pub class: ClassId,
    /// Tick at which the scheduler accepted the release
    pub release_time: Tick,
    /// Tick by which the instance must complete
    pub absolute_deadline: Tick,
    /// Tick at which completion was accepted; `None` until then
    pub completion_time: Option<Tick>,
}

impl DdTask {
    /// Whether this instance's deadline has passed at `now`
    pub fn is_overdue_at(&self, now: Tick) -> bool {
        self.absolute_deadline < now
    }

    /// Whether the recorded completion met the deadline.
    ///
    /// `None` while the instance has not completed.
    pub fn met_deadline(&self) -> Option<bool> {
        self.completion_time
            .map(|t| t <= self.absolute_deadline)
    }
}
