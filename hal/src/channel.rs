//! # Bounded Message Channels
//!
//! FIFO channels with a capacity fixed at creation. Senders block when the
//! queue is full, receivers block when it is empty; both ends offer a
//! timeout variant. These are the only communication paths between the
//! scheduler, the release generators, and observers.

use std::time::Duration;

use crate::{HalError, HalResult};

/// Sending half of a bounded channel
#[derive(Debug, Clone)]
pub struct Sender<T> {
    inner: crossbeam_channel::Sender<T>,
}

/// Receiving half of a bounded channel
#[derive(Debug, Clone)]
pub struct Receiver<T> {
    inner: crossbeam_channel::Receiver<T>,
}

/// Create a bounded FIFO channel with the given capacity
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (Sender { inner: tx }, Receiver { inner: rx })
}

impl<T> Sender<T> {
    /// Append a message, blocking while the queue is full
    pub fn send_back(&self, msg: T) -> HalResult<()> {
        self.inner.send(msg).map_err(|_| HalError::Disconnected)
    }

    /// Append a message without blocking
    pub fn try_send_back(&self, msg: T) -> HalResult<()> {
        self.inner.try_send(msg).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(_) => HalError::QueueFull,
            crossbeam_channel::TrySendError::Disconnected(_) => HalError::Disconnected,
        })
    }

    /// Append a message, blocking at most `timeout` while the queue is full
    pub fn send_back_timeout(&self, msg: T, timeout: Duration) -> HalResult<()> {
        self.inner.send_timeout(msg, timeout).map_err(|e| match e {
            crossbeam_channel::SendTimeoutError::Timeout(_) => HalError::Timeout,
            crossbeam_channel::SendTimeoutError::Disconnected(_) => HalError::Disconnected,
        })
    }
}

impl<T> Receiver<T> {
    /// Take the front message, blocking while the queue is empty
    pub fn receive(&self) -> HalResult<T> {
        self.inner.recv().map_err(|_| HalError::Disconnected)
    }

    /// Take the front message, blocking at most `timeout`
    pub fn receive_timeout(&self, timeout: Duration) -> HalResult<T> {
        self.inner.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => HalError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => HalError::Disconnected,
        })
    }

    /// Number of messages currently queued
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_fifo_order() {
        let (tx, rx) = bounded(8);
        for i in 0..5 {
            tx.send_back(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.receive().unwrap(), i);
        }
    }

    #[test]
    fn full_queue_rejects_try_send() {
        let (tx, _rx) = bounded(2);
        tx.try_send_back(1).unwrap();
        tx.try_send_back(2).unwrap();
        assert_eq!(tx.try_send_back(3), Err(HalError::QueueFull));
    }

    #[test]
    fn full_queue_send_times_out() {
        let (tx, _rx) = bounded(1);
        tx.send_back(1).unwrap();
        let err = tx.send_back_timeout(2, Duration::from_millis(10));
        assert_eq!(err, Err(HalError::Timeout));
    }

    #[test]
    fn empty_queue_receive_times_out() {
        let (_tx, rx) = bounded::<u32>(1);
        let err = rx.receive_timeout(Duration::from_millis(10));
        assert_eq!(err, Err(HalError::Timeout));
    }

    #[test]
    fn hangup_is_reported() {
        let (tx, rx) = bounded::<u32>(1);
        drop(rx);
        assert_eq!(tx.send_back(1), Err(HalError::Disconnected));

        let (tx, rx) = bounded::<u32>(1);
        drop(tx);
        assert_eq!(rx.receive(), Err(HalError::Disconnected));
    }
}
