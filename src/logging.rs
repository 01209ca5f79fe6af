use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber: env-filtered, writing to a daily
/// rolling file in the platform data directory when one can be resolved,
/// stderr otherwise. Returns the appender guard, which the embedder must keep
/// alive for buffered lines to flush. Safe to call more than once; later
/// calls are no-ops.
pub fn init() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mod_helm=debug"));

    let log_dir = ProjectDirs::from("com", "martes", "mod_helm")
        .map(|dirs| dirs.data_local_dir().join("logs"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mod_helm.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
            None
        }
    }
}
