//! # Monitor Task
//!
//! Periodic observer reporting scheduling state: the number of active,
//! completed and overdue instances. The monitor only speaks the query side
//! of the protocol; it holds no references into the scheduler's lists.

use std::sync::Arc;

use dds_hal::task::{TaskHandle, TaskRegistry};
use dds_sched::{SchedResult, SchedulerClient};

/// The reporting observer
pub struct Monitor {
    client: SchedulerClient,
}

impl Monitor {
    /// Create a monitor over the given client
    pub fn new(client: SchedulerClient) -> Self {
        Self { client }
    }

    /// Query the three lists once and report the counts
    pub fn report(&self) -> SchedResult<()> {
        let active = self.client.get_active()?;
        let completed = self.client.get_completed()?;
        let overdue = self.client.get_overdue()?;

        log::info!(
            "[monitor] active: {}  completed: {}  overdue: {}",
            active.len(),
            completed.len(),
            overdue.len()
        );
        Ok(())
    }

    /// Task body: report, self-suspend, wait for the monitor timer
    pub fn run(self, registry: Arc<TaskRegistry>, me: TaskHandle) {
        loop {
            if self.report().is_err() {
                log::info!("[monitor] stopping, scheduler gone");
                return;
            }
            if registry.suspend(me).is_err() || registry.park_while_suspended(me).is_err() {
                return;
            }
        }
    }
}
