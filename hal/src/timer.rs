//! # Periodic Timers
//!
//! Auto-reloading timers that invoke a callback on every expiration, the
//! hosted counterpart of kernel software timers. Each timer owns a thread
//! that fires at a fixed cadence independent of callback runtime.
//!
//! Callbacks run in a restricted context: they must only perform
//! non-blocking work such as resuming a task, and must never push onto a
//! message channel themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{HalError, HalResult};

/// A running auto-reload timer
pub struct PeriodicTimer {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PeriodicTimer {
    /// Create and start a timer firing `callback` every `period`.
    ///
    /// The first expiration is one full period after creation. If a callback
    /// overruns the period, subsequent expirations are not queued up; the
    /// timer realigns to the next period boundary.
    pub fn start<F>(name: &str, period: Duration, callback: F) -> HalResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                loop {
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    callback();
                    // Realign rather than accumulate missed expirations.
                    next += period;
                    let now = Instant::now();
                    while next <= now {
                        next += period;
                    }
                }
            })
            .map_err(|_| HalError::SpawnFailed)?;

        log::debug!("[hal] timer '{}' started, period {:?}", name, period);
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the timer. No callback fires after this returns.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            // The timer thread observes the flag at its next expiration.
            let _ = thread.join();
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
