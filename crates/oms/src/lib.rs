#![doc = include_str!("../README.md")]

pub mod config;
pub mod dispatch;
mod error;
pub mod exchange;
pub mod latency;
pub mod work;

pub use config::Config;
pub use dispatch::{Command, Dispatcher};
pub use error::{Error, Result};
pub use latency::{Console, LatencyRecord, LatencyRecorder, LogSink};
pub use work::{Task, WorkerPool};
