//! Leveled log sinks.
//!
//! Event handling never logs through a global; it is handed an
//! [`EventSink`]. Production code uses [`TracingSink`], tests use
//! [`RecordingSink`] to inspect what was logged.

use std::sync::Mutex;

use tracing::Level;

/// Destination for leveled log lines. Must accept concurrent writes.
pub trait EventSink: Send + Sync {
    /// Log one message at `level`.
    fn log(&self, level: Level, message: &str);

    /// Log at info level.
    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    /// Log at debug level.
    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    /// Log at warn level.
    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    /// Log at error level.
    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Sink forwarding to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{message}"),
            Level::WARN => tracing::warn!("{message}"),
            Level::INFO => tracing::info!("{message}"),
            Level::DEBUG => tracing::debug!("{message}"),
            _ => tracing::trace!("{message}"),
        }
    }
}

/// A single recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .map(|r| r.message)
            .collect()
    }

    /// Whether any line at `level` equals `message`.
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message == message)
    }

    /// Number of lines logged so far.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether nothing was logged yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn log(&self, level: Level, message: &str) {
        let record = LogRecord {
            level,
            message: message.to_string(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}
