//! Formatting and dispatch of watch events.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::fs;

use crate::event::{ChangeEvent, ChangeKind, RenameEvent, WatchEvent};
use crate::sink::EventSink;

/// What the processing loop should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing events.
    Continue,

    /// The watched root disappeared; stop watching.
    RootRemoved,
}

/// Summary line for a change: `<relPath> <ChangeKind>`.
pub fn format_change(event: &ChangeEvent) -> String {
    format!("{} {}", event.relative_path().display(), event.kind)
}

/// Summary line for a rename: `File: <old> renamed to <new>`.
pub fn format_rename(event: &RenameEvent) -> String {
    format!(
        "File: {} renamed to {}",
        event.old_relative_path().display(),
        event.new_relative_path().display()
    )
}

/// Content dump banner carrying the base64 encoding of `contents`.
pub fn format_dump(path: &Path, contents: &[u8]) -> String {
    format!(
        "File {} contents:\n---\n{}\n\n",
        path.display(),
        STANDARD.encode(contents)
    )
}

/// Logs every event it is given through an injected sink.
///
/// Handling is stateless: nothing carries over between events, and a
/// failure on one event is logged and never returned.
pub struct EventHandler {
    sink: Arc<dyn EventSink>,
    dump_contents: bool,
}

impl EventHandler {
    /// Create a handler that dumps file contents.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            dump_contents: true,
        }
    }

    /// Enable or disable content dumps.
    pub fn with_dump_contents(mut self, dump: bool) -> Self {
        self.dump_contents = dump;
        self
    }

    /// Handle one event.
    pub async fn handle(&self, event: &WatchEvent) -> Flow {
        match event {
            WatchEvent::Change(change) => self.handle_change(change).await,
            WatchEvent::Rename(rename) => {
                self.sink.info(&format_rename(rename));
                Flow::Continue
            }
            WatchEvent::Error(message) => {
                self.sink.error(&format!("(err) watch error: {message}"));
                Flow::Continue
            }
            WatchEvent::Overflow => {
                self.sink
                    .warn("event queue overflowed, some changes were not reported");
                Flow::Continue
            }
        }
    }

    async fn handle_change(&self, event: &ChangeEvent) -> Flow {
        self.sink.info(&format_change(event));

        if event.is_root_removal() {
            self.sink.error(&format!(
                "(err) watched directory {} was removed",
                event.watched_root.display()
            ));
            return Flow::RootRemoved;
        }

        if self.dump_contents && event.kind != ChangeKind::Deleted {
            if let Err(err) = self.dump_file(&event.full_path).await {
                self.sink.error(&format!("(err) {err}"));
            }
        }

        Flow::Continue
    }

    /// Read the whole file and log it as base64. Directories are skipped.
    async fn dump_file(&self, path: &Path) -> std::io::Result<()> {
        let metadata = fs::metadata(path).await?;
        if metadata.is_dir() {
            return Ok(());
        }

        let contents = fs::read(path).await?;
        self.sink.debug(&format_dump(path, &contents));
        Ok(())
    }
}
