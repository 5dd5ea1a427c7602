use uuid::Uuid;

use crate::Result;

pub type TaskID = Uuid;

/// A unit of work that runs once on whichever worker claims it.
///
/// Errors returned from [`Task::process`] are logged and counted by the pool;
/// they never stop the worker.
pub trait Task: Send + 'static {
    fn process(self: Box<Self>) -> Result<()>;

    fn name(&self) -> &str {
        "task"
    }
}

/// Adapts a closure into a [`Task`].
pub struct FnTask<F>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    name: String,
    op: F,
}

impl<F> FnTask<F>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    pub fn new(op: F) -> Self {
        Self::named("task", op)
    }

    pub fn named(name: impl Into<String>, op: F) -> Self {
        Self {
            name: name.into(),
            op,
        }
    }
}

impl<F> From<F> for FnTask<F>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    fn from(op: F) -> Self {
        Self::new(op)
    }
}

impl<F> Task for FnTask<F>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    fn process(self: Box<Self>) -> Result<()> {
        (self.op)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
