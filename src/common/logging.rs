use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::common::config::Config;

/// Pick the filter: `RUST_LOG` wins, otherwise verbosity decides
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("rmapp=debug")
        } else {
            EnvFilter::new("rmapp=warn")
        }
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr so they never mix with `--format json` output. When
/// `log_to_file` is set a daily rolling file under `~/.rmapp/logs` receives
/// debug output as well; keep the returned guard alive until exit so the
/// background writer flushes.
pub fn init(verbose: bool, config: &Config) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.log_to_file && std::fs::create_dir_all(Config::logs_dir()).is_ok() {
        let appender = tracing_appender::rolling::daily(Config::logs_dir(), "rmapp.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(EnvFilter::new("rmapp=debug"));

        tracing_subscriber::registry()
            .with(stderr_layer.with_filter(env_filter(verbose)))
            .with(file_layer)
            .try_init()
            .ok();
        return Some(guard);
    }

    tracing_subscriber::registry()
        .with(stderr_layer.with_filter(env_filter(verbose)))
        .try_init()
        .ok();
    None
}
