//! Diagnostic logging setup.
//!
//! All diagnostics go to stderr (the terminal front-end owns stdout), with
//! an optional daily-rotated file under [`crate::launcher_dirs::logs_dir`].
//! Console sink lines are mirrored under the target
//! [`CONSOLE_TARGET`](crate::ui::console::CONSOLE_TARGET).

use crate::config::LoggingConfig;
use crate::error::{LauncherError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_PREFIX: &str = "et-launcher.log";

/// Keeps the background log writer alive; drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LauncherError::Config(format!("invalid log level `{}`: {e}", config.level)))?;

    let (file_layer, guard) = if config.file {
        let dir = crate::launcher_dirs::logs_dir();
        std::fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| LauncherError::Config(format!("failed to install log subscriber: {e}")))?;

    Ok(LogGuard { _file: guard })
}
