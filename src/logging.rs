use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging at `info`, or `debug` when enabled in settings.
///
/// `RUST_LOG` is honoured only in debug mode. With `log_file` set, output
/// goes to that file instead of stderr. Returns `false` when a global
/// subscriber was already installed.
pub fn init(debug: bool, log_file: Option<PathBuf>) -> bool {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let Some(name) = path.file_name() else {
                return builder.try_init().is_ok();
            };
            if let Err(e) = std::fs::create_dir_all(&dir) {
                eprintln!("failed to create log directory {}: {e}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, name);
            builder
                .with_ansi(false)
                .with_writer(appender)
                .try_init()
                .is_ok()
        }
        None => builder.try_init().is_ok(),
    }
}
