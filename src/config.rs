//! CLI surface and logging initialization for the `aliceserver` binary.

use std::fs::OpenOptions;
use std::io::Write;

use clap::Parser;
use log::LevelFilter;

/// Every adapter name `-a`/`--adapter` accepts; `mi` is a bare alias that
/// folds to the latest MI version.
pub const ADAPTER_NAMES: &[&str] = &["dap", "mi", "mi2", "mi3", "mi4"];

/// The adapter names `--list-adapters` prints, one per line. Omits the
/// `mi` alias since it names no distinct adapter implementation.
pub const LISTED_ADAPTER_NAMES: &[&str] = &["dap", "mi2", "mi3", "mi4"];

#[derive(Parser, Debug)]
#[command(name = "aliceserver", about = "Debugger front-end server speaking DAP and GDB/MI", disable_version_flag = true)]
pub struct Cli {
    /// Protocol adapter to speak on stdio.
    #[arg(short = 'a', long = "adapter", default_value = "dap")]
    pub adapter: String,

    /// Print the known adapter names, one per line, and exit.
    #[arg(long = "list-adapters")]
    pub list_adapters: bool,

    /// Enable logging (defaults to the `--loglevel`, or `info` if unset).
    #[arg(long = "log")]
    pub log: bool,

    /// Append log output to this file instead of stderr.
    #[arg(long = "logfile", value_name = "PATH")]
    pub logfile: Option<String>,

    /// Minimum log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long = "loglevel", value_name = "LEVEL")]
    pub loglevel: Option<String>,

    /// Print the short version string and exit.
    #[arg(long = "ver")]
    pub ver: bool,

    /// Print the multi-line version block and exit.
    #[arg(long = "version")]
    pub version: bool,

    /// Target executable to configure for `launch`/`run`, if given on the
    /// command line rather than negotiated over the wire.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Arguments passed through to the target.
    #[arg(trailing_var_arg = true)]
    pub target_args: Vec<String>,
}

/// The short, single-line version string printed by `--ver` and embedded
/// in the MI `show version` reply's console-stream preamble.
pub fn version_line() -> String {
    format!("GNU gdb (aliceserver) {}", env!("CARGO_PKG_VERSION"))
}

/// The multi-line block printed by `--version`.
pub fn version_block() -> String {
    format!(
        "{}\nCopyright (C) 2026 Free Software Foundation, Inc.\nThis is free software; see the source for copying conditions.\n",
        version_line()
    )
}

/// Parse `--loglevel` into a `log::LevelFilter`, defaulting to `Info` when
/// `--log` was given without an explicit level and `Off` when `--log` was
/// never given at all.
pub fn resolve_level_filter(cli: &Cli) -> LevelFilter {
    if !cli.log {
        return LevelFilter::Off;
    }
    match cli.loglevel.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") | None => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        Some(other) => {
            eprintln!("unrecognized --loglevel {:?}, defaulting to info", other);
            LevelFilter::Info
        }
    }
}

/// Initialize `env_logger` per the CLI flags. `--logfile` redirects the
/// target to a file opened in append mode; otherwise logs go to stderr.
pub fn init_logging(cli: &Cli) -> std::io::Result<()> {
    let level = resolve_level_filter(cli);
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    if let Some(path) = &cli.logfile {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    let _ = builder.try_init();
    Ok(())
}

/// Flush stdout before exiting from an early `--ver`/`--version`/
/// `--list-adapters` path, since `process::exit` does not run buffered
/// writer destructors.
pub fn flush_stdout() {
    let _ = std::io::stdout().flush();
}
