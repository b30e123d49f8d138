use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive; drop it last
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber: stderr always, plus a daily rolling file in
/// `log_dir` when given. Call once, from the binary.
pub fn init_tracing(log_level: &str, log_dir: Option<&str>) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let file_sink = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => Some(tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::DAILY,
            dir,
            "scheduler.log",
        ))),
        Err(err) => {
            eprintln!("failed to create log directory {dir}: {err}");
            None
        }
    });

    let (file_layer, guard) = match file_sink {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(FileLogGuard { _guard: guard }),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
