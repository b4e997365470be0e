//! # filewatch
//!
//! Watches a directory tree and logs every change, together with a base64
//! dump of the affected file as it was when the change was handled.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          filewatch                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  notify ──► bridge (EventTranslator) ──► mpsc ──► WatchSession  │
//! │                                                       │         │
//! │  stdin ──► ControlLoop ──► CancellationToken ─────────┤         │
//! │                                                       ▼         │
//! │                                     EventHandler ──► EventSink  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod sink;
pub mod translate;
pub mod watcher;

pub use config::WatchConfig;
pub use control::{ControlCommand, ControlExit, ControlLoop};
pub use error::{Result, WatcherError};
pub use event::{ChangeEvent, ChangeKind, RenameEvent, WatchEvent};
pub use handler::{EventHandler, Flow};
pub use sink::{EventSink, LogRecord, RecordingSink, TracingSink};
pub use translate::EventTranslator;
pub use watcher::{DirectoryWatcher, StopReason, Subscription, WatchSession};
