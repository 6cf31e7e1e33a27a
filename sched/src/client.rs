//! # Scheduler Client
//!
//! The protocol face handed to producers and observers. A client owns the
//! sending half of the request channel and the receiving half of the
//! response channel; it never touches the task lists themselves.
//!
//! Queries are request/response pairs over shared channels, so concurrent
//! queriers serialize through an internal lock - one outstanding query at a
//! time keeps every response paired with its request.

use std::sync::{Arc, Mutex};

use dds_hal::channel::{Receiver, Sender};
use dds_hal::HalError;

use crate::list::TaskList;
use crate::message::{ReleaseRequest, Request, Response};
use crate::task::TaskId;
use crate::{SchedError, SchedResult};

fn channel_error(err: HalError) -> SchedError {
    match err {
        HalError::QueueFull => SchedError::NoCapacity,
        HalError::Timeout => SchedError::Timeout,
        _ => SchedError::Disconnected,
    }
}

/// Cloneable handle for talking to a running scheduler
#[derive(Clone)]
pub struct SchedulerClient {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    query_lock: Arc<Mutex<()>>,
}

impl SchedulerClient {
    /// Build a client from the producer ends of the two channels
    pub fn new(requests: Sender<Request>, responses: Receiver<Response>) -> Self {
        Self {
            requests,
            responses,
            query_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Release a new task instance, blocking while the request queue is full
    pub fn release(&self, request: ReleaseRequest) -> SchedResult<()> {
        self.requests
            .send_back(Request::Release(request))
            .map_err(channel_error)
    }

    /// Release a new task instance without blocking.
    ///
    /// Fails with [`SchedError::NoCapacity`] when the request queue is full;
    /// periodic producers react by backing off until their next period.
    pub fn try_release(&self, request: ReleaseRequest) -> SchedResult<()> {
        self.requests
            .try_send_back(Request::Release(request))
            .map_err(channel_error)
    }

    /// Report that the instance with the given id has finished its work
    pub fn complete(&self, id: TaskId) -> SchedResult<()> {
        self.requests
            .send_back(Request::Complete(id))
            .map_err(channel_error)
    }

    /// Snapshot of the Active list
    pub fn get_active(&self) -> SchedResult<TaskList> {
        self.query(Request::GetActive)
    }

    /// Snapshot of the Completed list
    pub fn get_completed(&self) -> SchedResult<TaskList> {
        self.query(Request::GetCompleted)
    }

    /// Snapshot of the Overdue list
    pub fn get_overdue(&self) -> SchedResult<TaskList> {
        self.query(Request::GetOverdue)
    }

    fn query(&self, request: Request) -> SchedResult<TaskList> {
        let _pairing = self.query_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.requests.send_back(request).map_err(channel_error)?;
        let response = self.responses.receive().map_err(channel_error)?;
        Ok(response.list)
    }
}
