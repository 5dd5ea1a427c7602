use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::latency::{Console, LogSink};
use crate::{Error, Result};

/// One completed operation and how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRecord {
    pub operation: String,
    pub elapsed: Duration,
    /// Seconds since the Unix epoch at the time the record was produced.
    pub timestamp: u64,
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl LatencyRecord {
    pub fn new(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::with_timestamp(operation, elapsed, epoch_seconds())
    }

    pub fn with_timestamp(operation: impl Into<String>, elapsed: Duration, timestamp: u64) -> Self {
        Self {
            operation: operation.into(),
            elapsed,
            timestamp,
        }
    }

    pub fn elapsed_micros(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / 1_000.0
    }

    /// The human-readable echo written to stdout.
    pub fn console_line(&self) -> String {
        format!(
            "Latency for {}: {:.6} microseconds",
            self.operation,
            self.elapsed_micros()
        )
    }
}

/// Renders the log sink line.
impl fmt::Display for LatencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operation: {}, Latency: {:.6} microseconds, Timestamp: {}",
            self.operation,
            self.elapsed_micros(),
            self.timestamp
        )
    }
}

impl FromStr for LatencyRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || Error::Parse(format!("malformed latency record: {line:?}"));

        let rest = line.strip_prefix("Operation: ").ok_or_else(malformed)?;
        let (rest, timestamp) = rest.rsplit_once(", Timestamp: ").ok_or_else(malformed)?;
        let (operation, latency) = rest.rsplit_once(", Latency: ").ok_or_else(malformed)?;
        let micros = latency
            .strip_suffix(" microseconds")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(malformed)?;
        let timestamp = timestamp.parse::<u64>().map_err(|_| malformed())?;

        Ok(Self {
            operation: operation.to_string(),
            elapsed: Duration::from_nanos((micros * 1_000.0).round() as u64),
            timestamp,
        })
    }
}

/// Writes one record per completed operation to the console and to the log
/// sink.
#[derive(Debug, Clone)]
pub struct LatencyRecorder {
    sink: Arc<LogSink>,
    console: Arc<Console>,
}

impl LatencyRecorder {
    /// Echoes to stdout.
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self::with_console(sink, Arc::new(Console::stdout()))
    }

    pub fn with_console(sink: Arc<LogSink>, console: Arc<Console>) -> Self {
        Self { sink, console }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Echoes the record to the console, then appends it to the sink.
    ///
    /// The echo is attempted on every call and cannot prevent the append. A
    /// sink failure is logged every time it occurs and returned to the caller.
    pub fn record(&self, operation: &str, elapsed: Duration) -> Result<LatencyRecord> {
        let record = LatencyRecord::new(operation, elapsed);
        self.console.line(&record.console_line());

        if let Err(err) = self.sink.append(&record) {
            tracing::error!(
                kind = err.as_label(),
                "Failed to write latency record for {}: {}",
                operation,
                err
            );
            return Err(err);
        }
        Ok(record)
    }
}
