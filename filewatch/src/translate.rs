//! Translation of raw backend notifications into [`WatchEvent`]s.
//!
//! Backends report a rename as separate "from" and "to" halves, sometimes
//! followed by a combined event carrying both paths. The translator pairs
//! the halves so that a rename inside the tree is reported exactly once.
//! A "from" half that finds no partner within the rename window means the
//! entry left the tree and is reported as deleted; a lone "to" half means it
//! arrived from outside and is reported as created.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::event::{ChangeEvent, ChangeKind, RawKind, RenameEvent, WatchEvent};

/// A "renamed from" half waiting for its partner.
#[derive(Debug, Clone)]
struct PendingRename {
    tracker: Option<usize>,
    path: PathBuf,
    received_at: Instant,
}

/// Stateful translator owned by the bridge between the backend and the
/// processing loop.
#[derive(Debug)]
pub struct EventTranslator {
    root: PathBuf,
    window: Duration,
    pending: Vec<PendingRename>,
    /// Trackers whose rename was already reported, with the pairing time.
    paired: Vec<(usize, Instant)>,
}

impl EventTranslator {
    /// Create a translator for a subscription rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, window: Duration) -> Self {
        Self {
            root: root.into(),
            window,
            pending: Vec::new(),
            paired: Vec::new(),
        }
    }

    /// How long an unpaired rename half is held.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether any rename half is waiting for a partner.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Translate one backend result received at `now`.
    pub fn translate_result(
        &mut self,
        result: notify::Result<notify::Event>,
        now: Instant,
    ) -> Vec<WatchEvent> {
        match result {
            Ok(event) => self.translate(event, now),
            Err(err) => {
                let mut out = self.flush_expired(now);
                out.push(WatchEvent::Error(err.to_string()));
                out
            }
        }
    }

    /// Translate one backend event received at `now`.
    ///
    /// Expired rename halves are flushed first so output order follows
    /// arrival order.
    pub fn translate(&mut self, event: notify::Event, now: Instant) -> Vec<WatchEvent> {
        let mut out = self.flush_expired(now);

        if event.need_rescan() {
            out.push(WatchEvent::Overflow);
        }

        let tracker = event.tracker();
        match RawKind::from(event.kind) {
            RawKind::Change(kind) => {
                out.extend(event.paths.into_iter().map(|path| self.change(kind, path)));
            }
            RawKind::RenameFrom => {
                for path in event.paths {
                    self.pending.push(PendingRename {
                        tracker,
                        path,
                        received_at: now,
                    });
                }
            }
            RawKind::RenameTo => {
                for path in event.paths {
                    if let Some(rename) = self.rename_to(tracker, path, now) {
                        out.push(rename);
                    }
                }
            }
            RawKind::RenameBoth => out.extend(self.rename_both(tracker, event.paths, now)),
            RawKind::RenameAny => {
                for path in event.paths {
                    let kind = if path.exists() {
                        ChangeKind::Created
                    } else {
                        ChangeKind::Deleted
                    };
                    out.push(self.change(kind, path));
                }
            }
            RawKind::Ignored => trace!("Ignoring {:?} for {:?}", event.kind, event.paths),
        }

        out
    }

    /// Report rename halves older than the window as deletions.
    pub fn flush_expired(&mut self, now: Instant) -> Vec<WatchEvent> {
        let window = self.window;
        self.paired
            .retain(|(_, at)| now.saturating_duration_since(*at) < window);

        let (expired, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| now.saturating_duration_since(p.received_at) >= window);
        self.pending = waiting;

        expired
            .into_iter()
            .map(|p| self.change(ChangeKind::Deleted, p.path))
            .collect()
    }

    fn rename_to(
        &mut self,
        tracker: Option<usize>,
        path: PathBuf,
        now: Instant,
    ) -> Option<WatchEvent> {
        if tracker.is_some_and(|id| self.is_paired(id)) {
            return None;
        }

        match self.take_pending(tracker) {
            Some(from) => {
                if let Some(id) = tracker {
                    self.paired.push((id, now));
                }
                Some(self.rename(from.path, path))
            }
            None => Some(self.change(ChangeKind::Created, path)),
        }
    }

    fn rename_both(
        &mut self,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        now: Instant,
    ) -> Vec<WatchEvent> {
        let [from, to]: [PathBuf; 2] = match paths.try_into() {
            Ok(pair) => pair,
            Err(paths) => {
                trace!("Ignoring rename with unexpected paths: {paths:?}");
                return Vec::new();
            }
        };

        if let Some(id) = tracker {
            if self.is_paired(id) {
                return Vec::new();
            }
            self.pending.retain(|p| p.tracker != Some(id));
            self.paired.push((id, now));
        }

        vec![self.rename(from, to)]
    }

    fn is_paired(&self, tracker: usize) -> bool {
        self.paired.iter().any(|(id, _)| *id == tracker)
    }

    fn take_pending(&mut self, tracker: Option<usize>) -> Option<PendingRename> {
        let index = self.pending.iter().position(|p| p.tracker == tracker)?;
        Some(self.pending.remove(index))
    }

    fn change(&self, kind: ChangeKind, path: PathBuf) -> WatchEvent {
        WatchEvent::Change(ChangeEvent::new(kind, path, self.root.clone()))
    }

    fn rename(&self, from: PathBuf, to: PathBuf) -> WatchEvent {
        WatchEvent::Rename(RenameEvent::new(from, to, self.root.clone()))
    }
}
