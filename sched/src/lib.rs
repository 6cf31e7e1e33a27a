//! # Deadline-Driven Scheduler
//!
//! An Earliest-Deadline-First scheduler layered on a preemptive
//! priority-based kernel. The scheduler never runs user code itself: it
//! observes a set of managed tasks through the kernel-adapter and
//! continuously adjusts their priorities so that the task instance with the
//! earliest absolute deadline is the only one eligible to run at the highest
//! user-runnable priority.
//!
//! ## Structure
//!
//! - [`task`]: the immutable-once-released instance record
//! - [`list`]: the owning singly-linked task list (Active/Completed/Overdue)
//! - [`message`]: the request/response protocol carried over the channels
//! - [`client`]: the producer/observer face of the protocol
//! - [`scheduler`]: the scheduler state machine itself
//! - [`generator`]: periodic release producers
//! - [`config`]: tick rate, queue sizing, and per-class timing parameters
//!
//! ## Key Principle
//!
//! All communication with the scheduler goes through two bounded channels;
//! the three task lists are owned exclusively by the scheduler task, so they
//! need no locking of their own.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod generator;
pub mod list;
pub mod message;
pub mod scheduler;
pub mod task;

pub use client::SchedulerClient;
pub use config::{SchedulerConfig, TaskClassParams, TestBench};
pub use scheduler::Scheduler;
pub use generator::ReleaseGenerator;
pub use list::TaskList;
pub use message::{ReleaseKind, ReleaseRequest, Request, Response};
pub use task::{ClassId, DdTask, TaskId, TaskKind};

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors surfaced by the scheduler protocol and the list module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// A bounded queue or task list is at capacity
    NoCapacity,
    /// Pop from an empty list
    Empty,
    /// A bounded channel operation timed out
    Timeout,
    /// The scheduler (or its observer) is gone
    Disconnected,
}
