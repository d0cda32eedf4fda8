use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "langfeed.log";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// The configured file prefix, or the default when it is blank or would
/// escape the log directory.
pub fn log_file_name(config: &LoggingConfig) -> &str {
    let name = config.file_name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        DEFAULT_LOG_FILE
    } else {
        name
    }
}

/// Installs the global subscriber: stderr always, plus a daily rolling file
/// when enabled. Keep the returned guard alive for the life of the process.
pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    if config.file_enabled {
        if let Err(err) = std::fs::create_dir_all(&config.dir) {
            eprintln!("failed to create log directory {}: {err}", config.dir.display());
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.dir, log_file_name(config));
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    None
}
