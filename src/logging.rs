use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "checkgate.log";

/// Default location for the JSON log file, under the platform data directory.
pub fn default_log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "checkgate")
        .map(|dirs| dirs.data_local_dir().join("logs").join(LOG_FILE_NAME))
}

/// Initialize the logging system
///
/// # Arguments
/// * `verbose` - Enable verbose (DEBUG) logging
/// * `log_file` - Optional path to log file. If None, logs only to stderr
pub fn init(verbose: bool, log_file: Option<PathBuf>) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env("CHECKGATE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("checkgate={}", default_level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    if let Some(log_path) = log_file {
        let dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let _ = std::fs::create_dir_all(&dir);

        // Rotated daily; the date is appended to the file name.
        let file_appender = tracing_appender::rolling::daily(
            &dir,
            log_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new(LOG_FILE_NAME)),
        );

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();

        let _ = subscriber.with(file_layer).try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
