//! Command line interface of the `watcher` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::config::WatchConfig;

/// Usage line printed for any malformed invocation.
pub const USAGE: &str = "Usage: watcher <directory>";

/// Exit code for a malformed invocation or an unusable directory.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Watch a directory tree and log every change.
#[derive(Debug, Parser)]
#[command(name = "watcher", version, override_usage = "watcher [OPTIONS] <directory>")]
pub struct Cli {
    /// Directory to watch.
    #[arg(value_name = "directory")]
    pub directory: PathBuf,

    /// Log change summaries without dumping file contents.
    #[arg(long)]
    pub no_dump: bool,

    /// Watch only the top level of the directory.
    #[arg(long)]
    pub non_recursive: bool,

    /// Also append log output to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Watch configuration described by the arguments. Not yet validated.
    pub fn to_config(&self) -> WatchConfig {
        let config = WatchConfig::new(&self.directory).with_dump_contents(!self.no_dump);
        if self.non_recursive {
            config.non_recursive()
        } else {
            config
        }
    }
}

/// Result of interpreting the process arguments.
#[derive(Debug)]
pub enum Invocation {
    /// Start watching.
    Watch(Cli),

    /// Print this text (help or version) and exit successfully.
    Info(String),

    /// Print [`USAGE`] and exit with [`USAGE_EXIT_CODE`].
    Usage,
}

/// Interpret `args` (including the program name).
pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Watch(cli),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                Invocation::Info(err.render().to_string())
            }
            _ => Invocation::Usage,
        },
    }
}
