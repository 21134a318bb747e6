use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber for one service process.
///
/// `service` becomes the log file prefix so core and edge can share a log dir.
/// The returned guard must be held until shutdown or buffered lines are lost.
pub fn init_logging(config: &AppConfig, service: &str) -> WorkerGuard {
    let file_name = format!("{}.{}", service, config.log_file);
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &file_name),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &file_name),
        _ => tracing_appender::rolling::never(&config.log_dir, &file_name),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true) // Keep target in JSON for structured queries
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    tracing::info!(service, git = env!("GIT_HASH"), "logging initialized");
    guard
}
