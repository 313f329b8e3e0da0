//! tracing subscriber setup for the binary.
//!
//! Console logs go to stderr because stdout may be owned by the terminal
//! preview. File logs carry thread names so render, capture and runtime
//! threads can be told apart.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use stripviz_core::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// HTTP stack targets that are noisy at debug level
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "h2=warn"];

/// Keeps the file writer thread alive; drop it last.
pub struct LogGuard {
    _worker: WorkerGuard,
    pub path: PathBuf,
}

/// Filter from the configured level, or from `env` (the value of
/// `RUST_LOG`) when set.
fn build_filter(config: &LogConfig, env: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(config.parse_level().into());
    match env.filter(|s| !s.trim().is_empty()) {
        Some(directives) => builder.parse_lossy(directives),
        None => QUIET_TARGETS
            .iter()
            .filter_map(|d| d.parse().ok())
            .fold(builder.parse_lossy(""), |filter, d| filter.add_directive(d)),
    }
}

fn prepare_log_directory(config: &LogConfig) -> Result<()> {
    config
        .ensure_log_directory()
        .with_context(|| format!("Failed to create log directory {:?}", config.log_directory))?;
    match config.cleanup_old_logs() {
        Ok(0) => {}
        Ok(removed) => eprintln!("Removed {} old log files", removed),
        Err(e) => eprintln!("Warning: failed to prune old log files: {}", e),
    }
    Ok(())
}

/// Install the global subscriber. The returned guard must outlive all logging.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let console = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(build_filter(config, env.as_deref()))
    });

    let mut guard = None;
    let file = if config.file_output {
        prepare_log_directory(config)?;
        let path = config.current_log_path();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {:?}", path))?;
        let (writer, worker) = tracing_appender::non_blocking(file);
        eprintln!("Logging to file: {:?}", path);
        guard = Some(LogGuard {
            _worker: worker,
            path,
        });
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_filter(build_filter(config, env.as_deref())),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::debug!(
        "Log level {}, console {}, file {}",
        config.level,
        config.console_output,
        config.file_output
    );
    Ok(guard)
}
