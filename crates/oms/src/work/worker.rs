use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::work::queue::{PoolState, QueueEntry, TaskQueue};
use crate::work::task::{FnTask, Task, TaskID};
use crate::{Error, Result};

/// Snapshot of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

struct Shared {
    queue: TaskQueue,
    counters: Counters,
}

struct Worker {
    index: usize,
    join_handle: JoinHandle<()>,
}

impl Worker {
    fn spawn(index: usize, shared: Arc<Shared>) -> std::io::Result<Self> {
        let join_handle = thread::Builder::new()
            .name(format!("oms-worker-{index}"))
            .spawn(move || run_worker(index, &shared))?;

        Ok(Self { index, join_handle })
    }

    fn join(self) {
        if self.join_handle.join().is_err() {
            tracing::error!("Worker {} terminated abnormally", self.index);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

fn run_worker(index: usize, shared: &Shared) {
    tracing::debug!("Worker {} started", index);

    while let Some(QueueEntry {
        id,
        task,
        queue_time,
    }) = shared.queue.pop()
    {
        let name = task.name().to_owned();
        tracing::trace!(
            "Worker {} processing task {} ({}), added {}us ago",
            index,
            id,
            name,
            queue_time.elapsed().as_micros()
        );

        // A failing task must not take the worker down with it.
        match panic::catch_unwind(AssertUnwindSafe(move || task.process())) {
            Ok(Ok(())) => {
                shared.counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Task {} ({}) completed", id, name);
            }
            Ok(Err(err)) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    task = %id,
                    kind = err.as_label(),
                    "Task {} failed: {}",
                    name,
                    err
                );
            }
            Err(payload) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    task = %id,
                    kind = "task_panicked",
                    "Task {} panicked: {}",
                    name,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    tracing::debug!("Worker {} exiting", index);
}

/// Fixed set of long-lived threads consuming a shared FIFO of tasks.
///
/// Tasks are claimed in submission order and may complete in any order.
/// [`WorkerPool::shutdown`] lets queued tasks drain, joins every worker and
/// rejects any later submission with [`Error::PoolClosed`].
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<Worker>>,
    size: usize,
}

impl WorkerPool {
    pub fn start(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            counters: Counters::default(),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            match Worker::spawn(index, Arc::clone(&shared)) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    tracing::error!("Failed to spawn worker {}: {}", index, err);
                    shared.queue.close();
                    workers.into_iter().for_each(Worker::join);
                    return Err(err.into());
                }
            }
        }

        tracing::info!("Started worker pool with {} workers", worker_count);
        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            size: worker_count,
        })
    }

    /// Enqueues a task without waiting for any worker.
    pub fn submit<T: Task>(&self, task: T) -> Result<TaskID> {
        let id = self.shared.queue.push(Box::new(task))?;
        self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    pub fn execute<F>(&self, op: F) -> Result<TaskID>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(FnTask::new(op))
    }

    /// Stops accepting tasks, drains the queue and joins all workers.
    ///
    /// Calling it again is a no-op. Must not be called from inside a task.
    pub fn shutdown(&self) {
        self.shared.queue.close();

        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }

        tracing::info!("Stopping worker pool");
        workers.drain(..).for_each(Worker::join);
        tracing::info!("Worker pool stopped");
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks waiting to be claimed.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.queue.state() == PoolState::Running
    }

    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared.counters;
        PoolStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("state", &self.shared.queue.state())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_is_config_error() {
        assert!(matches!(WorkerPool::start(0), Err(Error::Config(_))));
    }

    #[test]
    fn test_start_and_stop_without_tasks() {
        let pool = WorkerPool::start(3).unwrap();
        assert_eq!(pool.size(), 3);
        assert!(pool.is_running());

        pool.shutdown();
        assert!(!pool.is_running());
        assert_eq!(pool.stats(), PoolStats::default());

        // second call returns immediately
        pool.shutdown();
    }

    #[test]
    fn test_panicking_task_is_counted_as_failure() {
        let pool = WorkerPool::start(1).unwrap();
        pool.execute(|| panic!("boom")).unwrap();
        pool.execute(|| Ok(())).unwrap();
        pool.shutdown();

        let stats = pool.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
