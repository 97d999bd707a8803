use std::path::PathBuf;

use time::OffsetDateTime;

/// Dates are stored as unix milliseconds so chronological order is a
/// plain integer comparison in SQL.
pub fn timestamp_millis(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_timestamp_millis(ms: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
}

/// Set up tracing output. With a directory the log goes to a
/// daily-rotated file, otherwise to stdout. The returned guard must be
/// held for the lifetime of the process or buffered lines are lost.
pub fn init_log(log: Option<PathBuf>) -> tracing_appender::non_blocking::WorkerGuard {
    let subscriber_builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true);
    let (non_blocking, guard) = if let Some(log) = log {
        if !log.is_dir() {
            panic!("log path is not a directory");
        }
        let file_appender = tracing_appender::rolling::daily(log, "course_server.log");
        tracing_appender::non_blocking(file_appender)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };
    tracing::subscriber::set_global_default(
        subscriber_builder.with_writer(non_blocking).finish(),
    )
    .expect("init log failed");
    guard
}
