//! Configuration for a watch session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WatcherError};

/// Default capacity of the event channel between the subscription and the
/// processing loop.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default time an unpaired "renamed from" notification waits for its
/// "renamed to" partner.
pub const DEFAULT_RENAME_WINDOW: Duration = Duration::from_millis(50);

/// Configuration for a watched directory.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Root of the watched tree.
    pub root: PathBuf,

    /// Whether subdirectories are watched too.
    pub recursive: bool,

    /// Whether file contents are dumped for created/changed files.
    pub dump_contents: bool,

    /// Capacity of the event channel.
    pub channel_capacity: usize,

    /// How long a rename half is held before it is reported on its own.
    pub rename_window: Duration,
}

impl WatchConfig {
    /// Create a new config watching `root` recursively with content dumps.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            dump_contents: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            rename_window: DEFAULT_RENAME_WINDOW,
        }
    }

    /// Only watch the top level of the root.
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// Enable or disable content dumps.
    pub fn with_dump_contents(mut self, dump: bool) -> Self {
        self.dump_contents = dump;
        self
    }

    /// Set the event channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the rename pairing window.
    pub fn with_rename_window(mut self, window: Duration) -> Self {
        self.rename_window = window;
        self
    }

    /// Check that the root is an existing directory and replace it with its
    /// canonical form, so paths reported by the backend relativise cleanly.
    pub fn validate(mut self) -> Result<Self> {
        self.root = canonical_dir(&self.root)?;
        Ok(self)
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(WatcherError::DirectoryNotFound(path.display().to_string()));
    }

    if !path.is_dir() {
        return Err(WatcherError::NotADirectory(path.display().to_string()));
    }

    Ok(dunce::canonicalize(path)?)
}
