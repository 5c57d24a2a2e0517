//! Logging and tracing configuration
//!
//! Compact stdout logging by default; with `--log-path` the harness writes
//! a detailed file log as well, since long regression runs are usually read
//! after the fact.

use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the harness
///
/// Log level is controlled by `RUST_LOG`. Default level is INFO for this
/// crate, WARN for dependencies.
pub fn init(log_path: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tgen_regress=info,warn"));

    if let Some(path) = log_path {
        let path = resolve_log_path(path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(dir);
            }
        }

        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => {
                let file_layer = fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);

                let stdout_layer = fmt::layer().with_target(false).compact();

                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(stdout_layer)
                    .init();

                tracing::info!(path = %path.display(), "logging to file");
                return;
            }
            Err(e) => {
                eprintln!("Warning: could not open log file '{}': {}", path.display(), e);
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

/// Bare file names land in the platform data directory, so `--log-path
/// regression.log` works from any working directory.
fn resolve_log_path(path: &Path) -> PathBuf {
    let bare = path.parent().map_or(true, |p| p.as_os_str().is_empty());
    if bare {
        if let Some(dirs) = directories::ProjectDirs::from("", "", "tgen-regress") {
            return dirs.data_dir().join("logs").join(path);
        }
    }
    path.to_path_buf()
}
