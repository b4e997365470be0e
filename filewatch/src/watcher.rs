//! Directory watcher implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Instant;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};
use crate::event::WatchEvent;
use crate::handler::{EventHandler, Flow};
use crate::sink::EventSink;
use crate::translate::EventTranslator;

type RawResult = notify::Result<notify::Event>;

/// Why a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation token fired.
    Cancelled,

    /// The watched root was removed.
    RootRemoved,
}

/// A live OS subscription on one directory tree.
///
/// Dropping the subscription releases the OS watch; the bridge task then
/// sees its input channel close and exits.
pub struct Subscription {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
    _bridge_task: JoinHandle<()>,
}

impl Subscription {
    /// Subscribe to changes under `config.root` and return the receiving
    /// end of the translated event channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &WatchConfig) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (raw_tx, raw_rx) = std_mpsc::channel::<RawResult>();

        let mut watcher = notify::recommended_watcher(move |res: RawResult| {
            if raw_tx.send(res).is_err() {
                debug!("Bridge closed, dropping notification");
            }
        })?;

        let mode = if config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&config.root, mode)?;
        debug!("Started watching: {}", config.root.display());

        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
        let translator = EventTranslator::new(&config.root, config.rename_window);
        let bridge_task =
            tokio::task::spawn_blocking(move || bridge_events(raw_rx, translator, event_tx));

        Ok((
            Self {
                root: config.root.clone(),
                watcher: Some(watcher),
                _bridge_task: bridge_task,
            },
            event_rx,
        ))
    }

    /// Root of the subscription.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Release the OS watch. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.root) {
                debug!("Unwatch of {} failed: {e}", self.root.display());
            }
            debug!("Released watch on {}", self.root.display());
        }
    }

    /// Whether the OS watch is still held.
    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Move raw notifications from the backend thread to the async channel,
/// pairing rename halves on the way.
fn bridge_events(
    raw_rx: std_mpsc::Receiver<RawResult>,
    mut translator: EventTranslator,
    event_tx: mpsc::Sender<WatchEvent>,
) {
    loop {
        let received = if translator.has_pending() {
            match raw_rx.recv_timeout(translator.window()) {
                Ok(res) => Some(res),
                Err(std_mpsc::RecvTimeoutError::Timeout) => None,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => return,
            }
        } else {
            match raw_rx.recv() {
                Ok(res) => Some(res),
                Err(_) => return,
            }
        };

        let now = Instant::now();
        let events = match received {
            Some(res) => translator.translate_result(res, now),
            None => translator.flush_expired(now),
        };

        for event in events {
            if event_tx.blocking_send(event).is_err() {
                // Receiver dropped, shutdown.
                return;
            }
        }
    }
}

/// Sets up watch sessions for one directory.
pub struct DirectoryWatcher {
    config: WatchConfig,
    sink: Arc<dyn EventSink>,
}

impl DirectoryWatcher {
    /// Create a new directory watcher logging through `sink`.
    pub fn new(config: WatchConfig, sink: Arc<dyn EventSink>) -> Self {
        Self { config, sink }
    }

    /// The watcher configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Open the subscription and announce the watched path.
    pub fn start(self) -> Result<WatchSession> {
        let (subscription, events) = Subscription::open(&self.config)?;
        self.sink
            .info(&format!("Watching {}...", self.config.root.display()));

        let handler =
            EventHandler::new(Arc::clone(&self.sink)).with_dump_contents(self.config.dump_contents);

        Ok(WatchSession {
            subscription,
            events,
            handler,
        })
    }
}

/// A started watch: the subscription plus the loop that processes its
/// events.
pub struct WatchSession {
    subscription: Subscription,
    events: mpsc::Receiver<WatchEvent>,
    handler: EventHandler,
}

impl WatchSession {
    /// Root of the watched tree.
    pub fn root(&self) -> &Path {
        self.subscription.root()
    }

    /// Process events until `cancel` fires or the watched root goes away.
    ///
    /// The subscription is released before this returns, whichever way the
    /// loop ends.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<StopReason> {
        let root = self.root().to_path_buf();
        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(StopReason::Cancelled),
                event = self.events.recv() => match event {
                    Some(event) => {
                        if self.handler.handle(&event).await == Flow::RootRemoved {
                            break Ok(StopReason::RootRemoved);
                        }
                    }
                    None => {
                        warn!("Event channel closed for {}", root.display());
                        break Err(WatcherError::ChannelClosed);
                    }
                },
            }
        };

        self.subscription.close();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tracing::Level;

    #[tokio::test]
    async fn test_start_logs_watched_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = WatchConfig::new(temp_dir.path()).validate().unwrap();
        let root = config.root.clone();
        let sink = Arc::new(RecordingSink::new());

        let session = DirectoryWatcher::new(config, sink.clone()).start().unwrap();

        assert_eq!(session.root(), root.as_path());
        let info = sink.messages(Level::INFO);
        assert_eq!(info, vec![format!("Watching {}...", root.display())]);
    }

    #[tokio::test]
    async fn test_cancelled_session_stops() {
        let temp_dir = TempDir::new().unwrap();
        let config = WatchConfig::new(temp_dir.path()).validate().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let session = DirectoryWatcher::new(config, sink).start().unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let reason = session.run(cancel).await.unwrap();
        assert_eq!(reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_subscription_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = WatchConfig::new(temp_dir.path()).validate().unwrap();

        let (mut subscription, _events) = Subscription::open(&config).unwrap();
        assert!(subscription.is_active());

        subscription.close();
        subscription.close();
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_open_missing_directory_fails() {
        let config = WatchConfig::new("/nonexistent/path/12345");
        assert!(Subscription::open(&config).is_err());
    }
}
