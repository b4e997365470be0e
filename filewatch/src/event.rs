//! Change notifications delivered by a watch subscription.

use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};

/// Kind of a non-rename change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File or directory was created (or moved into the tree).
    Created,

    /// Contents or attributes changed.
    Modified,

    /// File or directory was deleted (or moved out of the tree).
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "Created",
            Self::Modified => "Changed",
            Self::Deleted => "Deleted",
        };
        f.write_str(label)
    }
}

/// A create, modify or delete notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The kind of change.
    pub kind: ChangeKind,

    /// Absolute path of the affected entry.
    pub full_path: PathBuf,

    /// Root of the subscription that produced the event.
    pub watched_root: PathBuf,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(
        kind: ChangeKind,
        full_path: impl Into<PathBuf>,
        watched_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            full_path: full_path.into(),
            watched_root: watched_root.into(),
        }
    }

    /// Path of the entry relative to the watched root.
    pub fn relative_path(&self) -> PathBuf {
        relative_path(&self.full_path, &self.watched_root)
    }

    /// Whether this event reports the removal of the watched root itself.
    pub fn is_root_removal(&self) -> bool {
        self.kind == ChangeKind::Deleted && self.full_path == self.watched_root
    }
}

/// A rename within the watched tree, reported as one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEvent {
    /// Absolute path before the rename.
    pub old_full_path: PathBuf,

    /// Absolute path after the rename.
    pub new_full_path: PathBuf,

    /// Root of the subscription that produced the event.
    pub watched_root: PathBuf,
}

impl RenameEvent {
    /// Create a new rename event.
    pub fn new(
        old_full_path: impl Into<PathBuf>,
        new_full_path: impl Into<PathBuf>,
        watched_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            old_full_path: old_full_path.into(),
            new_full_path: new_full_path.into(),
            watched_root: watched_root.into(),
        }
    }

    /// Old path relative to the watched root.
    pub fn old_relative_path(&self) -> PathBuf {
        relative_path(&self.old_full_path, &self.watched_root)
    }

    /// New path relative to the watched root.
    pub fn new_relative_path(&self) -> PathBuf {
        relative_path(&self.new_full_path, &self.watched_root)
    }
}

/// Everything the processing loop can receive from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Create, modify or delete.
    Change(ChangeEvent),

    /// Rename with both paths known.
    Rename(RenameEvent),

    /// The notification backend reported an error.
    Error(String),

    /// The notification backend dropped events.
    Overflow,
}

/// Express `path` relative to `root`, falling back to `path` unchanged when
/// no relative form exists.
pub fn relative_path(path: &Path, root: &Path) -> PathBuf {
    match pathdiff::diff_paths(path, root) {
        Some(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Some(rel) => rel,
        None => path.to_path_buf(),
    }
}

/// How a raw backend event kind is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawKind {
    /// Plain change reported for every path of the event.
    Change(ChangeKind),

    /// First half of a rename.
    RenameFrom,

    /// Second half of a rename.
    RenameTo,

    /// Both halves in one event (`[from, to]`).
    RenameBoth,

    /// Rename where the backend cannot tell which side a path is on.
    RenameAny,

    /// Not reported.
    Ignored,
}

impl From<notify::EventKind> for RawKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Change(ChangeKind::Created),
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                ModifyKind::Name(rename) => match rename {
                    RenameMode::From => Self::RenameFrom,
                    RenameMode::To => Self::RenameTo,
                    RenameMode::Both => Self::RenameBoth,
                    RenameMode::Any | RenameMode::Other => Self::RenameAny,
                },
                _ => Self::Change(ChangeKind::Modified),
            },
            notify::EventKind::Remove(_) => Self::Change(ChangeKind::Deleted),
            notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => {
                Self::Ignored
            }
        }
    }
}
