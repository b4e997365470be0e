//! End-to-end tests driving a real subscription on a scratch directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use filewatch::{DirectoryWatcher, RecordingSink, StopReason, WatchConfig};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Level;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SETTLE: Duration = Duration::from_millis(300);

struct Harness {
    _temp_dir: TempDir,
    root: PathBuf,
    sink: Arc<RecordingSink>,
    cancel: CancellationToken,
    task: JoinHandle<filewatch::Result<StopReason>>,
}

impl Harness {
    /// Start watching a scratch directory prepared by `setup`.
    fn start(setup: impl FnOnce(&std::path::Path)) -> Self {
        let temp_dir = TempDir::new().unwrap();
        setup(temp_dir.path());

        let config = WatchConfig::new(temp_dir.path()).validate().unwrap();
        let root = config.root.clone();
        let sink = Arc::new(RecordingSink::new());
        let session = DirectoryWatcher::new(config, sink.clone()).start().unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(session.run(cancel.clone()));

        Self {
            _temp_dir: temp_dir,
            root,
            sink,
            cancel,
            task,
        }
    }

    /// Poll the sink until `check` holds or the timeout expires.
    async fn wait_for(&self, check: impl Fn(&RecordingSink) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if check(&self.sink) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        check(&self.sink)
    }

    async fn stop(&mut self) -> StopReason {
        self.cancel.cancel();
        (&mut self.task).await.unwrap().unwrap()
    }
}

/// Decoded payloads of every content dump for `path`.
fn dumps_for(sink: &RecordingSink, path: &std::path::Path) -> Vec<Vec<u8>> {
    let banner = format!("File {} contents:\n---\n", path.display());
    sink.messages(Level::DEBUG)
        .iter()
        .filter_map(|message| message.strip_prefix(&banner))
        .filter_map(|payload| STANDARD.decode(payload.trim_end()).ok())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_line_names_watched_path() {
    let mut harness = Harness::start(|_| {});

    let status: Vec<_> = harness
        .sink
        .messages(Level::INFO)
        .into_iter()
        .filter(|m| m.contains(&harness.root.display().to_string()))
        .collect();
    assert_eq!(status, vec![format!("Watching {}...", harness.root.display())]);

    assert_eq!(harness.stop().await, StopReason::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_created_file_is_logged_and_dumped() {
    let mut harness = Harness::start(|_| {});
    let file = harness.root.join("new.txt");
    let content = b"hello from the watched tree".to_vec();

    std::fs::write(&file, &content).unwrap();

    let seen = harness
        .wait_for(|sink| {
            sink.contains(Level::INFO, "new.txt Created")
                && dumps_for(sink, &file).contains(&content)
        })
        .await;
    assert!(seen, "missing create/dump lines: {:?}", harness.sink.records());

    harness.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deleted_file_is_logged_without_dump() {
    let mut harness = Harness::start(|dir| std::fs::write(dir.join("gone.txt"), b"bye").unwrap());
    let file = harness.root.join("gone.txt");

    std::fs::remove_file(&file).unwrap();

    let seen = harness
        .wait_for(|sink| sink.contains(Level::INFO, "gone.txt Deleted"))
        .await;
    assert!(seen, "missing delete line: {:?}", harness.sink.records());
    assert!(dumps_for(&harness.sink, &file).is_empty());

    harness.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nested_file_uses_relative_path() {
    let mut harness = Harness::start(|dir| std::fs::create_dir(dir.join("sub")).unwrap());
    let file = harness.root.join("sub").join("inner.txt");

    std::fs::write(&file, b"nested").unwrap();

    let expected = format!("{} Created", PathBuf::from("sub").join("inner.txt").display());
    let seen = harness
        .wait_for(|sink| sink.contains(Level::INFO, &expected))
        .await;
    assert!(seen, "missing nested create: {:?}", harness.sink.records());

    harness.stop().await;
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_is_one_line() {
    let mut harness = Harness::start(|dir| std::fs::write(dir.join("a.txt"), b"move me").unwrap());

    std::fs::rename(harness.root.join("a.txt"), harness.root.join("b.txt")).unwrap();

    let seen = harness
        .wait_for(|sink| sink.contains(Level::INFO, "File: a.txt renamed to b.txt"))
        .await;
    assert!(seen, "missing rename line: {:?}", harness.sink.records());

    tokio::time::sleep(SETTLE).await;
    let info = harness.sink.messages(Level::INFO);
    let renames = info
        .iter()
        .filter(|m| m.as_str() == "File: a.txt renamed to b.txt")
        .count();
    assert_eq!(renames, 1);
    assert!(!info.iter().any(|m| m == "a.txt Deleted" || m == "b.txt Created"));

    harness.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_events_after_cancel() {
    let mut harness = Harness::start(|_| {});
    let root = harness.root.clone();
    let sink = harness.sink.clone();

    assert_eq!(harness.stop().await, StopReason::Cancelled);
    let logged = sink.len();

    std::fs::write(root.join("late.txt"), b"too late").unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(sink.len(), logged, "logged after cancel: {:?}", sink.records());
}
