//! Latency instrumentation shared by all workers.

mod console;
mod recorder;
mod sink;

#[cfg(test)]
pub(crate) use console::testing;
pub use console::Console;
pub use recorder::{LatencyRecord, LatencyRecorder};
pub use sink::LogSink;
