//! Logging bootstrap
//!
//! Thin wrapper over tracing-subscriber so embedders get consistent
//! structured output without wiring a subscriber themselves.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with the default level (overridable via RUST_LOG)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with an explicit level and optional file output
///
/// When `log_dir` points at an existing directory, a daily-rolling file
/// appender is used instead of stdout.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && Path::new(dir).exists()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "store-engine");
        subscriber.with_writer(file_appender).init();
        return;
    }

    subscriber.init();
}
