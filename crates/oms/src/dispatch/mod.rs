//! Turns operator commands into timed tasks on the worker pool.

mod command;

pub use command::{parse_field, Command, MenuChoice, MENU};

use std::sync::Arc;
use std::time::Instant;

use crate::exchange::Exchange;
use crate::latency::LatencyRecorder;
use crate::work::{PoolStats, Task, TaskID, WorkerPool};
use crate::{Error, Result};

/// Everything a task needs, fixed at submission time.
#[derive(Debug, Clone)]
pub struct TaskPayload {
    pub command: Command,
    /// Latency is measured from here, so it includes time spent queued.
    pub submitted_at: Instant,
}

impl TaskPayload {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            submitted_at: Instant::now(),
        }
    }
}

/// Runs one command against the exchange and records its latency.
pub struct InstrumentedTask<E>
where
    E: Exchange,
{
    payload: TaskPayload,
    exchange: Arc<E>,
    recorder: LatencyRecorder,
}

impl<E> InstrumentedTask<E>
where
    E: Exchange,
{
    pub fn new(payload: TaskPayload, exchange: Arc<E>, recorder: LatencyRecorder) -> Self {
        Self {
            payload,
            exchange,
            recorder,
        }
    }
}

impl<E> Task for InstrumentedTask<E>
where
    E: Exchange,
{
    fn process(self: Box<Self>) -> Result<()> {
        let TaskPayload {
            command,
            submitted_at,
        } = self.payload;

        let outcome = self.exchange.execute(&command);
        let elapsed = submitted_at.elapsed();

        let console = self.recorder.console();
        match &outcome {
            Ok(lines) => lines.iter().for_each(|line| console.line(line)),
            // the operator sees the exchange's own message
            Err(Error::Rpc { message, .. }) => console.line(message),
            Err(err) => console.line(&err.to_string()),
        }

        // Failures are recorded too. A sink error is already reported by
        // the recorder and must not mask the command's own outcome.
        let _ = self.recorder.record(command.operation_name(), elapsed);

        outcome.map(|_| ())
    }

    fn name(&self) -> &str {
        self.payload.command.operation_name()
    }
}

/// Submits operator commands to the pool, each wrapped in latency
/// instrumentation.
pub struct Dispatcher<E>
where
    E: Exchange,
{
    pool: WorkerPool,
    exchange: Arc<E>,
    recorder: LatencyRecorder,
}

impl<E> Dispatcher<E>
where
    E: Exchange,
{
    pub fn new(pool: WorkerPool, exchange: Arc<E>, recorder: LatencyRecorder) -> Self {
        Self {
            pool,
            exchange,
            recorder,
        }
    }

    /// Validates the command and queues it. Returns before the command runs.
    pub fn dispatch(&self, command: Command) -> Result<TaskID> {
        command.validate()?;

        tracing::debug!("Dispatching {}", command);
        let task = InstrumentedTask::new(
            TaskPayload::new(command),
            Arc::clone(&self.exchange),
            self.recorder.clone(),
        );
        self.pool.submit(task)
    }

    /// Lets queued commands finish and stops the pool.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}
