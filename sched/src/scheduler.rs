//! # Scheduler Core
//!
//! The deadline-driven scheduler state machine. A single consumer drains
//! the request channel; every iteration timestamps the request, moves
//! newly-overdue instances out of the Active list, dispatches the request,
//! and then re-derives the kernel priority assignment from the Active
//! list's EDF order.
//!
//! The scheduler owns the three task lists exclusively. Observers only ever
//! receive value snapshots, so no lock guards the lists.

use std::sync::Arc;

use dds_hal::channel::{Receiver, Sender};
use dds_hal::clock::{Clock, Tick};
use dds_hal::task::TaskRegistry;
use dds_hal::{HalError, Priority};

use crate::config::SchedulerConfig;
use crate::list::TaskList;
use crate::message::{ReleaseKind, ReleaseRequest, Request, Response};
use crate::task::{ClassId, DdTask, TaskId};

/// The deadline-driven scheduler
pub struct Scheduler {
    active: TaskList,
    completed: TaskList,
    overdue: TaskList,
    config: SchedulerConfig,
    registry: Arc<TaskRegistry>,
    clock: Arc<dyn Clock>,
    responses: Sender<Response>,
    event_number: u32,
    hyper_period_logged: bool,
}

impl Scheduler {
    /// Create a scheduler over the given kernel services.
    ///
    /// The scheduler holds the sending half of the response channel; hand
    /// the receiving half to the observers.
    pub fn new(
        config: SchedulerConfig,
        registry: Arc<TaskRegistry>,
        clock: Arc<dyn Clock>,
        responses: Sender<Response>,
    ) -> Self {
        let list_capacity = config.list_capacity;
        Self {
            active: TaskList::bounded(list_capacity),
            completed: TaskList::bounded(list_capacity),
            overdue: TaskList::bounded(list_capacity),
            config,
            registry,
            clock,
            responses,
            event_number: 0,
            hyper_period_logged: false,
        }
    }

    /// The Active list (earliest deadline first)
    pub fn active(&self) -> &TaskList {
        &self.active
    }

    /// The Completed list
    pub fn completed(&self) -> &TaskList {
        &self.completed
    }

    /// The Overdue list
    pub fn overdue(&self) -> &TaskList {
        &self.overdue
    }

    /// Drain the request channel until every producer is gone.
    ///
    /// This is the scheduler task's body; it runs at the highest priority
    /// and blocks only on the channel ends.
    pub fn run(&mut self, requests: Receiver<Request>) {
        log::info!("[dds] scheduler running, {} task classes", self.config.class_count());
        loop {
            match requests.receive() {
                Ok(request) => self.process(request),
                Err(HalError::Disconnected) => {
                    log::info!("[dds] request channel closed, scheduler exiting");
                    break;
                }
                Err(err) => {
                    // Infinite-timeout receive can only disconnect.
                    log::warn!("[dds] receive failed: {:?}", err);
                    break;
                }
            }
        }
    }

    /// Process one request at the current tick.
    ///
    /// Exposed separately from [`run`] so the state machine can be driven
    /// deterministically.
    ///
    /// [`run`]: Scheduler::run
    pub fn process(&mut self, request: Request) {
        let now = self.clock.now();
        self.sweep_overdue(now);

        match request {
            Request::Release(release) => self.handle_release(release, now),
            Request::Complete(id) => self.handle_complete(id, now),
            Request::GetActive => self.answer(self.active.clone()),
            Request::GetCompleted => self.answer(self.completed.clone()),
            Request::GetOverdue => self.answer(self.overdue.clone()),
        }

        self.apply_priorities();
        self.resume_head();
    }

    /// Move every Active instance whose deadline has passed to Overdue.
    ///
    /// Active is sorted by deadline, so the overdue set is exactly the
    /// prefix; the sweep stops at the first instance still within deadline.
    fn sweep_overdue(&mut self, now: Tick) {
        while self
            .active
            .front()
            .is_some_and(|task| task.is_overdue_at(now))
        {
            match self.active.pop_front() {
                Ok(task) => {
                    log::debug!(
                        "[dds] task {} missed deadline {} at tick {}",
                        task.id.as_u32(),
                        task.absolute_deadline.as_u32(),
                        now.as_u32()
                    );
                    self.file_overdue(task);
                }
                // Empty means the sweep is done; the loop guard makes this
                // unreachable.
                Err(_) => break,
            }
        }
    }

    fn handle_release(&mut self, release: ReleaseRequest, now: Tick) {
        let absolute_deadline = match release.kind {
            ReleaseKind::Periodic => match self.config.period_ticks(release.class) {
                Some(period) => now + period,
                None => {
                    log::warn!(
                        "[dds] release {} names unknown class {}, dropped",
                        release.id.as_u32(),
                        release.class.as_u16()
                    );
                    return;
                }
            },
            ReleaseKind::Aperiodic { absolute_deadline } => absolute_deadline,
        };

        let task = DdTask {
            handle: release.handle,
            kind: release.kind.task_kind(),
            id: release.id,
            class: release.class,
            release_time: now,
            absolute_deadline,
            completion_time: None,
        };

        let class = task.class;
        if let Err(err) = self.active.insert_back(task) {
            // Absorbed here; the producer retries on its next period.
            log::warn!("[dds] active list full, release dropped: {:?}", err);
            return;
        }
        self.log_event("released", class, now);
        self.active.sort_edf();
    }

    fn handle_complete(&mut self, id: TaskId, now: Tick) {
        let Some(mut task) = self.active.delete_by_id(id) else {
            // Most likely a completion racing the overdue sweep that already
            // moved the record; dropping it keeps the lists consistent.
            log::debug!("[dds] complete for unknown task {}, ignored", id.as_u32());
            return;
        };

        task.completion_time = Some(now);
        self.log_event("completed", task.class, now);

        if task.met_deadline().unwrap_or(false) {
            if let Err(err) = self.completed.insert_back(task) {
                log::warn!("[dds] completed list full, record dropped: {:?}", err);
            }
        } else {
            self.file_overdue(task);
        }
    }

    fn file_overdue(&mut self, task: DdTask) {
        if let Err(err) = self.overdue.insert_back(task) {
            log::warn!("[dds] overdue list full, record dropped: {:?}", err);
        }
    }

    fn answer(&self, list: TaskList) {
        if self.responses.send_back(Response { list }).is_err() {
            log::warn!("[dds] observer gone, snapshot dropped");
        }
    }

    /// Re-derive the kernel priority assignment from the Active order.
    ///
    /// The head instance gets `Med`, the only level at which user code may
    /// run; every other Active instance is demoted to `Low`. The scheduler
    /// task itself holds `High` and is never in the Active list.
    fn apply_priorities(&self) {
        let mut tasks = self.active.iter();
        let Some(head) = tasks.next() else {
            return;
        };
        if let Err(err) = self.registry.set_priority(head.handle, Priority::Med) {
            log::debug!("[dds] cannot promote task {}: {:?}", head.id.as_u32(), err);
        }
        for task in tasks {
            if let Err(err) = self.registry.set_priority(task.handle, Priority::Low) {
                log::debug!("[dds] cannot demote task {}: {:?}", task.id.as_u32(), err);
            }
        }
    }

    /// Wake the head instance's kernel task if it is suspended
    fn resume_head(&self) {
        if let Some(head) = self.active.front() {
            if let Err(err) = self.registry.resume(head.handle) {
                log::debug!("[dds] cannot resume task {}: {:?}", head.id.as_u32(), err);
            }
        }
    }

    /// One line per scheduling event, suppressed past the hyper-period
    fn log_event(&mut self, kind: &str, class: ClassId, now: Tick) {
        self.event_number += 1;
        let measured_ms = self.config.tick_rate().ticks_to_ms(now);
        if measured_ms <= self.config.hyper_period_ms {
            log::info!(
                "[dds] event {:>3}  task {} {}  {} ms",
                self.event_number,
                class.as_u16(),
                kind,
                measured_ms
            );
        } else if !self.hyper_period_logged {
            self.hyper_period_logged = true;
            log::info!("[dds] hyper-period finished");
        }
    }
}
