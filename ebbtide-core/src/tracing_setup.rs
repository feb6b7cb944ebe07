//! Tracing setup for Ebbtide.
//!
//! Dual output: console logs at a user-controlled level, plus full debug
//! logs written to disk so complete diagnostics survive a clean CLI
//! experience.

use std::fs::{File, create_dir_all};
use std::io;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initializes tracing with console and file layers.
///
/// Writes complete trace-level logs to `logs/ebbtide-last-run.log`,
/// overwriting the previous run. The console layer respects `RUST_LOG` when
/// set, falling back to `console_level`.
///
/// # Errors
/// - `io::Error` - Logs directory or log file could not be created.
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> io::Result<()> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join("ebbtide-last-run.log");
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(())
}

/// CLI log levels for user control.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Maps the CLI log level to the corresponding `tracing::Level`.
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}
