use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{AppError, Result};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CONSOLE_FILTER: &str = "info";
const FILE_FILTER: &str = "debug";

static LOGGING: OnceLock<Logging> = OnceLock::new();

/// Process-wide logging sinks: INFO+ to the console, DEBUG+ to a daily file.
#[derive(Debug)]
pub struct Logging {
    log_dir: PathBuf,
    _guard: WorkerGuard,
}

impl Logging {
    /// Installs the subscriber once; later calls return the first handle
    /// regardless of `log_dir`.
    pub fn init(log_dir: &Path) -> Result<&'static Logging> {
        if let Some(logging) = LOGGING.get() {
            return Ok(logging);
        }
        fs::create_dir_all(log_dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_suffix("log")
            .build(log_dir)
            .map_err(|err| AppError::Message(format!("create log file: {}", err)))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let console_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));
        let console_layer = tracing_subscriber::fmt::layer()
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_target(true)
            .with_filter(console_filter);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_ansi(false)
            .with_line_number(true)
            .with_writer(writer)
            .with_filter(EnvFilter::new(FILE_FILTER));

        let logging = LOGGING.get_or_init(|| {
            let installed = tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .try_init();
            if let Err(err) = installed {
                eprintln!("logging already configured elsewhere: {}", err);
            }
            Logging {
                log_dir: log_dir.to_path_buf(),
                _guard: guard,
            }
        });
        Ok(logging)
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let first = Logging::init(&dir.path().join("logs")).expect("init");
        let second = Logging::init(&dir.path().join("other")).expect("init again");
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.log_dir(), dir.path().join("logs"));
        tracing::info!("logging initialized");
    }
}
