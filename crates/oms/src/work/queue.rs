use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::work::task::{Task, TaskID};
use crate::{Error, Result};

/// Queue entry
pub(crate) struct QueueEntry {
    /// Identifier
    pub id: TaskID,

    /// The work itself
    pub task: Box<dyn Task>,

    /// Instant when this entry was queued
    pub queue_time: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    Stopping,
}

struct QueueState {
    entries: VecDeque<QueueEntry>,
    state: PoolState,
}

/// Unbounded FIFO shared by all workers of a pool.
///
/// The pending entries and the pool state live under one lock, so a worker
/// observing `Stopping` with an empty queue knows no further entry can appear.
pub(crate) struct TaskQueue {
    inner: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState {
                entries: VecDeque::new(),
                state: PoolState::Running,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends a task and wakes one idle worker. Never blocks on other workers'
    /// execution, only on the queue lock.
    pub(crate) fn push(&self, task: Box<dyn Task>) -> Result<TaskID> {
        let mut inner = self.inner.lock();
        if inner.state == PoolState::Stopping {
            return Err(Error::PoolClosed);
        }

        let id = Uuid::new_v4();
        inner.entries.push_back(QueueEntry {
            id,
            task,
            queue_time: Instant::now(),
        });
        drop(inner);

        self.available.notify_one();
        Ok(id)
    }

    /// Blocks until an entry is available or the queue is closed and drained.
    ///
    /// Returns `None` only when the pool is stopping and nothing is left.
    pub(crate) fn pop(&self) -> Option<QueueEntry> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(entry) = inner.entries.pop_front() {
                return Some(entry);
            }
            if inner.state == PoolState::Stopping {
                return None;
            }
            self.available.wait(&mut inner);
        }
    }

    /// Marks the queue as stopping and wakes every waiting worker.
    pub(crate) fn close(&self) {
        self.inner.lock().state = PoolState::Stopping;
        self.available.notify_all();
    }

    pub(crate) fn state(&self) -> PoolState {
        self.inner.lock().state
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::work::task::FnTask;

    fn noop() -> Box<dyn Task> {
        Box::new(FnTask::new(|| Ok(())))
    }

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        let ids = (0..5)
            .map(|_| queue.push(noop()).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(queue.len(), 5);
        for id in ids {
            assert_eq!(queue.pop().map(|e| e.id), Some(id));
        }
    }

    #[test]
    fn test_push_after_close_is_rejected() {
        let queue = TaskQueue::new();
        queue.close();

        assert_eq!(queue.state(), PoolState::Stopping);
        assert!(matches!(queue.push(noop()), Err(Error::PoolClosed)));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_close_drains_pending_entries() {
        let queue = TaskQueue::new();
        queue.push(noop()).unwrap();
        queue.push(noop()).unwrap();
        queue.close();

        assert!(queue.pop().is_some());
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(TaskQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop().map(|e| e.id))
        };

        thread::sleep(Duration::from_millis(50));
        let id = queue.push(noop()).unwrap();

        assert_eq!(consumer.join().unwrap(), Some(id));
    }

    #[test]
    fn test_close_wakes_waiting_consumers() {
        let queue = Arc::new(TaskQueue::new());

        let consumers = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop().is_none())
            })
            .collect::<Vec<_>>();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for consumer in consumers {
            assert!(consumer.join().unwrap());
        }
    }
}
