//! # Task Registry
//!
//! Registry of the kernel tasks the scheduler manages. Each task is a host
//! thread; the registry records its priority and suspension state and lets
//! a suspended task's thread park until it is resumed.
//!
//! The registry is a plain value constructed once at init time and shared by
//! `Arc`; components name tasks only through opaque [`TaskHandle`]s.

use core::sync::atomic::{AtomicU32, Ordering};
use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::{HalError, HalResult, Priority};

/// Opaque reference to a registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u32);

impl TaskHandle {
    /// Get the raw handle value
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Per-task bookkeeping
struct TaskRecord {
    name: String,
    priority: spin::RwLock<Priority>,
    /// Guarded suspension flag; the condvar wakes parked task threads
    suspended: Mutex<bool>,
    resumed: Condvar,
}

/// Registry of managed tasks
pub struct TaskRegistry {
    tasks: spin::RwLock<BTreeMap<TaskHandle, Arc<TaskRecord>>>,
    next_id: AtomicU32,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tasks: spin::RwLock::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Register a task at the given priority and return its handle.
    ///
    /// Registration alone does not create a thread; use [`spawn`] for tasks
    /// that carry their own thread of execution.
    ///
    /// [`spawn`]: TaskRegistry::spawn
    pub fn register(&self, name: impl Into<String>, priority: Priority) -> TaskHandle {
        let handle = TaskHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = Arc::new(TaskRecord {
            name: name.into(),
            priority: spin::RwLock::new(priority),
            suspended: Mutex::new(false),
            resumed: Condvar::new(),
        });
        self.tasks.write().insert(handle, record);
        handle
    }

    /// Register a task and spawn its thread.
    ///
    /// The entry function receives the task's own handle so it can
    /// self-suspend and park; a task that needs the registry captures its
    /// own clone of the shared `Arc`.
    pub fn spawn<F>(&self, name: &str, priority: Priority, entry: F) -> HalResult<TaskHandle>
    where
        F: FnOnce(TaskHandle) + Send + 'static,
    {
        let handle = self.register(name, priority);
        thread::Builder::new()
            .name(name.into())
            .spawn(move || entry(handle))
            .map_err(|_| HalError::SpawnFailed)?;
        log::debug!("[hal] task '{}' spawned at {:?}", name, priority);
        Ok(handle)
    }

    /// Spawn a thread of execution for an already-registered task.
    ///
    /// Used when another component must know the task's handle before its
    /// thread exists, e.g. a producer that releases work onto it.
    pub fn attach<F>(&self, handle: TaskHandle, entry: F) -> HalResult<()>
    where
        F: FnOnce(TaskHandle) + Send + 'static,
    {
        let name = self.name(handle)?;
        thread::Builder::new()
            .name(name)
            .spawn(move || entry(handle))
            .map_err(|_| HalError::SpawnFailed)?;
        Ok(())
    }

    fn record(&self, handle: TaskHandle) -> HalResult<Arc<TaskRecord>> {
        self.tasks
            .read()
            .get(&handle)
            .cloned()
            .ok_or(HalError::TaskNotFound)
    }

    /// Change a task's priority
    pub fn set_priority(&self, handle: TaskHandle, priority: Priority) -> HalResult<()> {
        let record = self.record(handle)?;
        *record.priority.write() = priority;
        Ok(())
    }

    /// Read a task's current priority
    pub fn priority(&self, handle: TaskHandle) -> HalResult<Priority> {
        Ok(*self.record(handle)?.priority.read())
    }

    /// Mark a task suspended.
    ///
    /// The task's thread stops at its next [`park_while_suspended`] call.
    ///
    /// [`park_while_suspended`]: TaskRegistry::park_while_suspended
    pub fn suspend(&self, handle: TaskHandle) -> HalResult<()> {
        let record = self.record(handle)?;
        *record.suspended.lock().unwrap_or_else(|e| e.into_inner()) = true;
        Ok(())
    }

    /// Clear a task's suspension and wake its parked thread.
    ///
    /// Resuming a task that is not suspended is a no-op, as in the kernels
    /// this adapter stands in for.
    pub fn resume(&self, handle: TaskHandle) -> HalResult<()> {
        let record = self.record(handle)?;
        let mut suspended = record.suspended.lock().unwrap_or_else(|e| e.into_inner());
        if *suspended {
            *suspended = false;
            record.resumed.notify_all();
        }
        Ok(())
    }

    /// Whether a task is currently marked suspended
    pub fn is_suspended(&self, handle: TaskHandle) -> HalResult<bool> {
        Ok(*self.record(handle)?.suspended.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Block the calling thread while its task is suspended.
    ///
    /// Called by a task's own thread at its suspension points; returns
    /// immediately if the task is not suspended.
    pub fn park_while_suspended(&self, handle: TaskHandle) -> HalResult<()> {
        let record = self.record(handle)?;
        let mut suspended = record.suspended.lock().unwrap_or_else(|e| e.into_inner());
        while *suspended {
            suspended = record
                .resumed
                .wait(suspended)
                .unwrap_or_else(|e| e.into_inner());
        }
        Ok(())
    }

    /// A task's registered name
    pub fn name(&self, handle: TaskHandle) -> HalResult<String> {
        Ok(self.record(handle)?.name.clone())
    }

    /// Number of registered tasks
    pub fn count(&self) -> usize {
        self.tasks.read().len()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
