//! # Release Generators
//!
//! One cooperative producer per periodic task class. A generator starts
//! suspended; its class timer resumes it on every period boundary, it emits
//! one release, and it suspends itself again. Timer callbacks never touch
//! the request channel - they only resume the generator, which sends from
//! task context.

use std::sync::Arc;

use dds_hal::task::{TaskHandle, TaskRegistry};

use crate::client::SchedulerClient;
use crate::message::{ReleaseKind, ReleaseRequest};
use crate::task::{ClassId, TaskId};
use crate::{SchedError, SchedResult};

/// Periodic release producer for one task class
pub struct ReleaseGenerator {
    class: ClassId,
    /// Kernel task that executes this class's instances
    user_task: TaskHandle,
    client: SchedulerClient,
    next_id: u32,
}

impl ReleaseGenerator {
    /// Create a generator for `class` whose instances run on `user_task`.
    ///
    /// Instance ids count up from the class id base, so the first release
    /// of class 1 is instance 1001.
    pub fn new(class: ClassId, user_task: TaskHandle, client: SchedulerClient) -> Self {
        Self {
            class,
            user_task,
            client,
            next_id: class.id_base(),
        }
    }

    /// The class this generator releases
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Build the next release request, advancing the instance counter
    pub fn next_release(&mut self) -> ReleaseRequest {
        self.next_id += 1;
        ReleaseRequest {
            handle: self.user_task,
            id: TaskId::new(self.next_id),
            class: self.class,
            kind: ReleaseKind::Periodic,
        }
    }

    /// Release one instance without blocking.
    ///
    /// A full request queue surfaces as [`SchedError::NoCapacity`]; the
    /// generator's policy is to drop this release and retry at its next
    /// period, so the instance counter has already moved on.
    pub fn emit(&mut self) -> SchedResult<()> {
        let request = self.next_release();
        self.client.try_release(request)
    }

    /// Task body: wait for the class timer, release, self-suspend.
    ///
    /// The task is registered suspended, so the first release lands on the
    /// first period boundary. Runs until the scheduler goes away.
    pub fn run(mut self, registry: Arc<TaskRegistry>, me: TaskHandle) {
        log::debug!("[generator] class {} running", self.class.as_u16());
        loop {
            if registry.park_while_suspended(me).is_err() {
                return;
            }

            match self.emit() {
                Ok(()) => {}
                Err(SchedError::NoCapacity) => {
                    log::warn!(
                        "[generator] class {} backing off, request queue full",
                        self.class.as_u16()
                    );
                }
                Err(_) => {
                    log::info!(
                        "[generator] class {} stopping, scheduler gone",
                        self.class.as_u16()
                    );
                    return;
                }
            }

            if registry.suspend(me).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dds_hal::channel;
    use dds_hal::Priority;

    fn generator() -> (ReleaseGenerator, channel::Receiver<crate::Request>) {
        let registry = TaskRegistry::new();
        let user = registry.register("usr_d2", Priority::Low);
        let (req_tx, req_rx) = channel::bounded(4);
        let (_resp_tx, resp_rx) = channel::bounded(4);
        let client = SchedulerClient::new(req_tx, resp_rx);
        (ReleaseGenerator::new(ClassId::new(2), user, client), req_rx)
    }

    #[test]
    fn ids_count_up_from_the_class_base() {
        let (mut producer, _rx) = generator();
        assert_eq!(producer.next_release().id, TaskId::new(2001));
        assert_eq!(producer.next_release().id, TaskId::new(2002));
        assert_eq!(producer.next_release().id, TaskId::new(2003));
    }

    #[test]
    fn emit_sends_a_periodic_release() {
        let (mut producer, rx) = generator();
        producer.emit().unwrap();

        match rx.receive().unwrap() {
            crate::Request::Release(release) => {
                assert_eq!(release.id, TaskId::new(2001));
                assert_eq!(release.class, ClassId::new(2));
                assert_eq!(release.kind, ReleaseKind::Periodic);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn full_queue_backs_off_without_blocking() {
        let (mut producer, _rx) = generator();
        for _ in 0..4 {
            producer.emit().unwrap();
        }
        assert_eq!(producer.emit(), Err(SchedError::NoCapacity));
        // The skipped instance id is not reused.
        assert_eq!(producer.next_release().id, TaskId::new(2006));
    }
}
