use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::latency::LatencyRecord;
use crate::{Error, Result};

enum SinkState {
    Open(Box<dyn Write + Send>),
    Unavailable(String),
}

/// The single append target for latency records.
///
/// Opened once and shared by reference; every append happens under the sink's
/// own lock, independent of the task queue lock.
pub struct LogSink {
    target: String,
    state: Mutex<SinkState>,
}

impl LogSink {
    /// Opens `path` in append mode, creating it if needed.
    pub fn try_open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::debug!("Opened latency log {}", path.display());

        Ok(Self::from_writer(
            path.display().to_string(),
            BufWriter::new(file),
        ))
    }

    /// Like [`LogSink::try_open`], but an open failure yields a sink that
    /// reports [`Error::SinkUnavailable`] on every append instead.
    pub fn open<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        Self::try_open(path).unwrap_or_else(|err| {
            tracing::error!("Failed to open log file {}: {}", path.display(), err);
            Self::unavailable(path.display().to_string(), err.to_string())
        })
    }

    pub fn from_writer<W>(target: impl Into<String>, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            target: target.into(),
            state: Mutex::new(SinkState::Open(Box::new(writer))),
        }
    }

    pub fn unavailable(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: Mutex::new(SinkState::Unavailable(reason.into())),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_available(&self) -> bool {
        matches!(*self.state.lock(), SinkState::Open(_))
    }

    /// Formats and writes one record as a single flushed line.
    pub fn append(&self, record: &LatencyRecord) -> Result<()> {
        let mut state = self.state.lock();
        match &mut *state {
            SinkState::Open(writer) => writeln!(writer, "{record}")
                .and_then(|()| writer.flush())
                .map_err(|err| Error::SinkUnavailable(format!("{}: {}", self.target, err))),
            SinkState::Unavailable(reason) => Err(Error::SinkUnavailable(format!(
                "{}: {}",
                self.target, reason
            ))),
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("target", &self.target)
            .field("available", &self.is_available())
            .finish()
    }
}
