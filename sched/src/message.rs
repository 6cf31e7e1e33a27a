//! # Scheduler Protocol Messages
//!
//! The request/response messages carried over the two bounded channels.
//! Producers and observers push [`Request`]s onto the request channel; the
//! scheduler answers list queries with [`Response`]s on the response
//! channel. Release and completion requests are never answered.

use dds_hal::clock::Tick;
use dds_hal::task::TaskHandle;

use crate::list::TaskList;
use crate::task::{ClassId, TaskId, TaskKind};

/// How a released instance obtains its absolute deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    /// Deadline computed by the scheduler as release tick + class period
    Periodic,
    /// Deadline supplied by the producer and used verbatim
    Aperiodic {
        /// The instance's absolute deadline, in ticks
        absolute_deadline: Tick,
    },
}

impl ReleaseKind {
    /// The task kind recorded on the released instance
    pub fn task_kind(self) -> TaskKind {
        match self {
            ReleaseKind::Periodic => TaskKind::Periodic,
            ReleaseKind::Aperiodic { .. } => TaskKind::Aperiodic,
        }
    }
}

/// Everything a producer supplies to release a new instance.
///
/// Release and completion times are stamped by the scheduler when it
/// accepts the request, never by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Kernel task that will execute the instance
    pub handle: TaskHandle,
    /// Instance identifier, unique system-wide
    pub id: TaskId,
    /// Class the instance belongs to
    pub class: ClassId,
    /// Periodic or aperiodic release
    pub kind: ReleaseKind,
}

/// A request to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Admit a new instance into the Active list
    Release(ReleaseRequest),
    /// Report end-of-work for an instance
    Complete(TaskId),
    /// Snapshot the Active list
    GetActive,
    /// Snapshot the Completed list
    GetCompleted,
    /// Snapshot the Overdue list
    GetOverdue,
}

/// A response from the scheduler: a value snapshot of one task list
#[derive(Debug, Clone)]
pub struct Response {
    /// Deep copy of the requested list at the time the query was processed
    pub list: TaskList,
}
