use std::sync::Arc;
use std::time::Duration;

use filewatch::cli::{self, Invocation, USAGE, USAGE_EXIT_CODE};
use filewatch::{ControlLoop, DirectoryWatcher, EventSink, StopReason, TracingSink, WatchConfig};
use tokio_util::sync::CancellationToken;

/// How long the bridge task gets to notice the released watch on exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    let cli = match cli::parse(std::env::args_os()) {
        Invocation::Watch(cli) => cli,
        Invocation::Info(text) => {
            print!("{text}");
            return Ok(());
        }
        Invocation::Usage => {
            println!("{USAGE}");
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    let config = match cli.to_config().validate() {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            println!("{USAGE}");
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    let _guard = filewatch::logging::init(cli.log_file.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(watch(config));
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

async fn watch(config: WatchConfig) -> anyhow::Result<()> {
    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);
    let session = DirectoryWatcher::new(config, Arc::clone(&sink)).start()?;
    let cancel = CancellationToken::new();

    // Stdin cannot be interrupted, so the control loop gets its own thread
    // and is simply abandoned if the watch ends first.
    let control = ControlLoop::new(Arc::clone(&sink), cancel.clone());
    std::thread::Builder::new()
        .name("filewatch-control".to_string())
        .spawn(move || control.run(std::io::stdin().lock()))?;

    let interrupt = cancel.clone();
    let interrupt_sink = Arc::clone(&sink);
    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    interrupt_sink.info("Exiting...");
                }
                interrupt.cancel();
            }
        }
    });

    if session.run(cancel.clone()).await? == StopReason::RootRemoved {
        cancel.cancel();
    }
    Ok(())
}
