//! Tracing setup for the dashboard binaries.
//!
//! Render diagnostics go to a daily-rotated `storepulse.log` under the XDG
//! state directory; stdout is left to the report itself.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "storepulse.log";

/// Crates whose events follow the configured level; everything else is
/// held at `warn` so SQLite and runtime chatter stay out of the log.
const OWN_TARGETS: [&str; 3] = ["storepulse_core", "storepulse", "storepulse_series"];

/// Keeps the background log writer running; dropping it flushes the file.
pub struct LoggingGuard {
    log_dir: PathBuf,
    _worker: WorkerGuard,
}

impl LoggingGuard {
    /// Directory the rolling log file is written to.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Filter directives for a configured level, e.g. `warn,storepulse_core=debug,...`.
///
/// Rejects levels `tracing` does not know so a typo in `config.toml` fails
/// loudly instead of silently logging nothing.
pub fn directives(level: &str) -> Result<String> {
    let level = level.trim();
    let parsed: LevelFilter = level
        .parse()
        .map_err(|_| Error::Config(format!("unknown log level '{}'", level)))?;
    let level = parsed.to_string().to_lowercase();

    let mut out = String::from("warn");
    for target in OWN_TARGETS {
        out.push_str(&format!(",{}={}", target, level));
    }
    Ok(out)
}

/// Start file logging under the XDG state directory.
///
/// `RUST_LOG`, when set and valid, replaces the configured level.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    init_in(&Config::state_dir(), config)
}

/// Start file logging in `log_dir`.
///
/// Only the first call in a process installs a subscriber; later calls still
/// return a working guard for their own appender.
pub fn init_in(log_dir: &Path, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives(&config.level)?)
            .map_err(|e| Error::Config(format!("invalid log filter: {}", e)))?,
    };

    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .is_ok();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        installed,
        "Logging started"
    );

    Ok(LoggingGuard {
        log_dir: log_dir.to_path_buf(),
        _worker: worker,
    })
}

/// Route events to the test harness output; safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Base path of the log file; rotation appends the date.
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
