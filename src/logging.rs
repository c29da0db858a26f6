use std::path::{Path, PathBuf};

use anyhow::Context;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};

use crate::config;

/// Start the file logger under `log_dir` (or `~/.patent-graph/logs`).
/// Level comes from RUST_LOG, falling back to `info`; info and above are
/// mirrored to stderr so stdout stays clean for JSON output.
pub fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let log_dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => home_dir()
            .context("cannot determine home directory for logs")?
            .join(config::logging::LOG_DIR_REL),
    };
    std::fs::create_dir_all(&log_dir).with_context(|| format!("failed creating log dir {}", log_dir.display()))?;

    Logger::try_with_env_or_str(config::logging::DEFAULT_LEVEL)?
        .log_to_file(FileSpec::default().directory(&log_dir).basename(config::logging::LOG_FILE_NAME))
        .rotate(
            Criterion::Size(config::logging::LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config::logging::LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(Duplicate::Info)
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    log::info!("{}", "=".repeat(60));
    log::info!("patent-graph starting");
    log::info!("Version: {}", config::VERSION);
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("Log dir: {}", log_dir.display());
    log::info!("{}", "=".repeat(60));

    Ok(())
}

pub fn home_dir() -> Option<PathBuf> {
    if let Ok(v) = std::env::var("HOME") {
        if !v.is_empty() {
            return Some(PathBuf::from(v));
        }
    }
    // Windows fallback
    if let Ok(v) = std::env::var("USERPROFILE") {
        if !v.is_empty() {
            return Some(PathBuf::from(v));
        }
    }
    None
}
