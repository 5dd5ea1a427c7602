mod queue;
pub mod task;
pub mod worker;

pub use queue::PoolState;
pub use task::{FnTask, Task, TaskID};
pub use worker::{PoolStats, WorkerPool};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread::sleep;
    use std::time::Duration;

    use crate::work::{Task, WorkerPool};
    use crate::Result;

    #[derive(Debug, Clone)]
    pub struct ExampleTask {
        input: String,
        processed: Arc<AtomicUsize>,
    }

    impl Task for ExampleTask {
        fn process(self: Box<Self>) -> Result<()> {
            tracing::debug!("Processing {}", self.input);
            sleep(Duration::from_millis(10));
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            &self.input
        }
    }

    #[test]
    fn test_pool() {
        let pool = WorkerPool::start(2).expect("Failed to start pool");
        let processed = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4)
            .map(|i| ExampleTask {
                input: format!("Task {}", i),
                processed: Arc::clone(&processed),
            })
            .collect::<Vec<_>>();

        for task in tasks {
            pool.submit(task).expect("Failed to submit task");
        }

        pool.shutdown();
        assert_eq!(processed.load(Ordering::SeqCst), 4);
        assert_eq!(pool.stats().completed, 4);
    }
}
