//! # Task Lists
//!
//! The owning singly-linked list behind Active, Completed and Overdue. The
//! scheduler owns every list exclusively, so the list needs no locking;
//! observers only ever see value snapshots produced by [`TaskList::clone`].
//!
//! Node storage is bounded: each list is created with a capacity fixed at
//! startup and inserts fail with [`SchedError::NoCapacity`] once it is
//! reached.

use crate::task::{DdTask, TaskId};
use crate::{SchedError, SchedResult};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    task: DdTask,
    next: Option<Box<Node>>,
}

/// Owning singly-linked list of task instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    head: Option<Box<Node>>,
    len: usize,
    capacity: usize,
}

impl TaskList {
    /// Create an empty list holding at most `capacity` instances
    pub const fn bounded(capacity: usize) -> Self {
        Self {
            head: None,
            len: 0,
            capacity,
        }
    }

    /// Number of instances in the list
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of instances the list can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_capacity(&self) -> SchedResult<()> {
        if self.len >= self.capacity {
            Err(SchedError::NoCapacity)
        } else {
            Ok(())
        }
    }

    /// Insert an instance at the front of the list
    pub fn insert_front(&mut self, task: DdTask) -> SchedResult<()> {
        self.check_capacity()?;
        self.head = Some(Box::new(Node {
            task,
            next: self.head.take(),
        }));
        self.len += 1;
        Ok(())
    }

    /// Insert an instance at the back of the list.
    ///
    /// O(n): the list carries no tail pointer, which is acceptable at the
    /// population sizes the scheduler sees.
    pub fn insert_back(&mut self, task: DdTask) -> SchedResult<()> {
        self.check_capacity()?;
        let mut cur = &mut self.head;
        while let Some(node) = cur {
            cur = &mut node.next;
        }
        *cur = Some(Box::new(Node { task, next: None }));
        self.len += 1;
        Ok(())
    }

    /// Remove and return the front instance
    pub fn pop_front(&mut self) -> SchedResult<DdTask> {
        match self.head.take() {
            Some(node) => {
                self.head = node.next;
                self.len -= 1;
                Ok(node.task)
            }
            None => Err(SchedError::Empty),
        }
    }

    /// The front instance, if any
    pub fn front(&self) -> Option<&DdTask> {
        self.head.as_deref().map(|node| &node.task)
    }

    /// Remove the first instance with the given id.
    ///
    /// Returns the removed record, or `None` (a no-op) when no instance
    /// matches.
    pub fn delete_by_id(&mut self, id: TaskId) -> Option<DdTask> {
        let mut cur = &mut self.head;
        while cur.as_ref().is_some_and(|node| node.task.id != id) {
            cur = &mut cur.as_mut()?.next;
        }
        let node = cur.take()?;
        *cur = node.next;
        self.len -= 1;
        Some(node.task)
    }

    /// Sort the list by ascending absolute deadline.
    ///
    /// The sort is stable: records swap only when strictly out of order, so
    /// instances sharing a deadline keep their insertion order and the
    /// earlier release stays in front.
    pub fn sort_edf(&mut self) {
        if self.len < 2 {
            return;
        }
        loop {
            let mut swapped = false;
            let mut cur = self.head.as_deref_mut();
            while let Some(node) = cur {
                if let Some(next) = node.next.as_deref_mut() {
                    if node.task.absolute_deadline > next.task.absolute_deadline {
                        core::mem::swap(&mut node.task, &mut next.task);
                        swapped = true;
                    }
                }
                cur = node.next.as_deref_mut();
            }
            if !swapped {
                break;
            }
        }
    }

    /// Iterate over the instances front to back
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl Default for TaskList {
    /// An empty list with the reference capacity of 64 instances
    fn default() -> Self {
        Self::bounded(64)
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a DdTask;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Front-to-back borrowing iterator over a [`TaskList`]
pub struct Iter<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DdTask;

    fn next(&mut self) -> Option<&'a DdTask> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ClassId, TaskKind};
    use dds_hal::clock::Tick;
    use dds_hal::task::{TaskHandle, TaskRegistry};
    use dds_hal::Priority;

    fn handle() -> TaskHandle {
        TaskRegistry::new().register("t", Priority::Low)
    }

    fn instance(id: u32, deadline: u32) -> DdTask {
        DdTask {
            handle: handle(),
            kind: TaskKind::Periodic,
            id: TaskId::new(id),
            class: ClassId::new(1),
            release_time: Tick::ZERO,
            absolute_deadline: Tick::new(deadline),
            completion_time: None,
        }
    }

    fn ids(list: &TaskList) -> Vec<u32> {
        list.iter().map(|t| t.id.as_u32()).collect()
    }

    #[test]
    fn front_and_back_inserts() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_back(instance(2, 200)).unwrap();
        list.insert_front(instance(3, 300)).unwrap();

        assert_eq!(ids(&list), vec![3, 1, 2]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_back(instance(2, 200)).unwrap();

        assert_eq!(list.pop_front().unwrap().id, TaskId::new(1));
        assert_eq!(list.pop_front().unwrap().id, TaskId::new(2));
        assert_eq!(list.pop_front(), Err(SchedError::Empty));
        assert!(list.is_empty());
    }

    #[test]
    fn delete_by_id_removes_first_match_only() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_back(instance(2, 200)).unwrap();
        list.insert_back(instance(3, 300)).unwrap();

        let removed = list.delete_by_id(TaskId::new(2)).unwrap();
        assert_eq!(removed.id, TaskId::new(2));
        assert_eq!(ids(&list), vec![1, 3]);

        // Absent id is a no-op.
        assert!(list.delete_by_id(TaskId::new(42)).is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn delete_by_id_handles_head_and_tail() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_back(instance(2, 200)).unwrap();
        list.insert_back(instance(3, 300)).unwrap();

        assert!(list.delete_by_id(TaskId::new(1)).is_some());
        assert!(list.delete_by_id(TaskId::new(3)).is_some());
        assert_eq!(ids(&list), vec![2]);
    }

    #[test]
    fn sort_orders_by_deadline() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 770)).unwrap();
        list.insert_back(instance(2, 500)).unwrap();
        list.insert_back(instance(3, 510)).unwrap();

        list.sort_edf();
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn sort_is_stable_on_equal_deadlines() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(2001, 500)).unwrap();
        list.insert_back(instance(1001, 500)).unwrap();
        list.insert_back(instance(3001, 400)).unwrap();

        list.sort_edf();
        // 2001 arrived before 1001; equal deadlines keep arrival order.
        assert_eq!(ids(&list), vec![3001, 2001, 1001]);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 300)).unwrap();
        list.insert_back(instance(2, 100)).unwrap();
        list.insert_back(instance(3, 200)).unwrap();

        list.sort_edf();
        let once = list.clone();
        list.sort_edf();
        assert_eq!(list, once);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut list = TaskList::bounded(2);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_front(instance(2, 200)).unwrap();

        assert_eq!(list.insert_back(instance(3, 300)), Err(SchedError::NoCapacity));
        assert_eq!(list.insert_front(instance(4, 400)), Err(SchedError::NoCapacity));
        assert_eq!(list.len(), 2);

        list.pop_front().unwrap();
        assert!(list.insert_back(instance(3, 300)).is_ok());
    }

    #[test]
    fn clone_is_a_deep_snapshot() {
        let mut list = TaskList::bounded(8);
        list.insert_back(instance(1, 100)).unwrap();
        list.insert_back(instance(2, 200)).unwrap();

        let snapshot = list.clone();
        list.pop_front().unwrap();

        assert_eq!(ids(&snapshot), vec![1, 2]);
        assert_eq!(ids(&list), vec![2]);
        assert_eq!(snapshot.capacity(), 8);
    }
}
