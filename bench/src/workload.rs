//! # User Workload Tasks
//!
//! One deadline-sensitive user task per class. A user task only makes
//! progress while the scheduler has promoted it - holding `Med` is the
//! hosted stand-in for being the one task the kernel lets run. It burns its
//! class's execution budget in ticks, reports completion, and waits for its
//! next instance.
//!
//! User tasks never touch the scheduler's lists; they interact through the
//! client protocol only.

use std::sync::Arc;
use std::thread;

use dds_hal::clock::Clock;
use dds_hal::task::{TaskHandle, TaskRegistry};
use dds_hal::Priority;
use dds_sched::{ClassId, SchedulerClient, SchedulerConfig};

/// A user task executing instances of one class
pub struct UserTask {
    class: ClassId,
    client: SchedulerClient,
    clock: Arc<dyn Clock>,
    execution_ticks: u32,
    tick_period: std::time::Duration,
}

impl UserTask {
    /// Create the workload for `class`
    pub fn new(
        class: ClassId,
        client: SchedulerClient,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Option<Self> {
        Some(Self {
            class,
            client,
            clock,
            execution_ticks: config.execution_ticks(class)?,
            tick_period: config.tick_rate().period(),
        })
    }

    /// Task body: execute one instance each time the scheduler promotes us
    pub fn run(self, registry: Arc<TaskRegistry>, me: TaskHandle) {
        loop {
            if registry.park_while_suspended(me).is_err() {
                return;
            }
            if registry.priority(me) != Ok(Priority::Med) {
                // Demoted: another instance holds the earliest deadline.
                thread::sleep(self.tick_period);
                continue;
            }

            let Ok(active) = self.client.get_active() else {
                log::info!("[user] class {} stopping, scheduler gone", self.class.as_u16());
                return;
            };
            let Some(instance) = active.iter().find(|task| task.handle == me).map(|t| t.id)
            else {
                // Promoted but not yet visible in a snapshot; try again.
                thread::sleep(self.tick_period);
                continue;
            };

            self.burn_budget(&registry, me);
            if self.client.complete(instance).is_err() {
                return;
            }
            log::debug!(
                "[user] class {} finished instance {}",
                self.class.as_u16(),
                instance.as_u32()
            );
        }
    }

    /// Consume the execution budget, counting only ticks spent promoted
    fn burn_budget(&self, registry: &TaskRegistry, me: TaskHandle) {
        let mut counted = 0u32;
        let mut prev = self.clock.now();
        while counted < self.execution_ticks {
            thread::sleep(self.tick_period);
            let now = self.clock.now();
            if registry.priority(me) == Ok(Priority::Med) {
                counted += now.since(prev);
            }
            prev = now;
        }
    }
}
