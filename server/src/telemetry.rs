use tracing_subscriber::EnvFilter;

use crate::config::RunMode;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the
/// run-mode default.
pub fn init(run_mode: RunMode) {
    let default_filter = match run_mode {
        RunMode::Debug => "todo_server=debug,tower_http=debug,sqlx=info",
        RunMode::Release => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match run_mode {
        RunMode::Debug => builder.init(),
        RunMode::Release => builder.with_ansi(false).with_target(false).init(),
    }
}
