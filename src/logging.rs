//! Log sink writing JSON lines to `combined.log` and `error.log`, with an
//! optional console echo for development.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;
use thiserror::Error;

/// Value of the `service` field attached to every record.
pub const SERVICE_NAME: &str = "merlin-panel";

const COMBINED_LOG: &str = "combined.log";
const ERROR_LOG: &str = "error.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("Logger already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

pub struct PanelLogger {
    console: Option<env_logger::Logger>,
    combined: Mutex<File>,
    errors: Mutex<File>,
}

fn open_append(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Renders a record as a single JSON line (without the trailing newline).
pub fn format_record(record: &Record) -> String {
    json!({
        "timestamp": Utc::now().to_rfc3339(),
        "level": record.level().as_str().to_lowercase(),
        "target": record.target(),
        "message": record.args().to_string(),
        "service": SERVICE_NAME,
    })
    .to_string()
}

impl PanelLogger {
    /// Opens both log files under `logs_dir`, creating the directory if
    /// needed. `echo` enables the env_logger console output.
    pub fn new(logs_dir: &Path, echo: bool) -> Result<Self, LoggingError> {
        fs::create_dir_all(logs_dir).map_err(|source| LoggingError::Open {
            path: logs_dir.display().to_string(),
            source,
        })?;

        let console = echo.then(|| {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .build()
        });

        Ok(Self {
            console,
            combined: Mutex::new(open_append(&logs_dir.join(COMBINED_LOG))?),
            errors: Mutex::new(open_append(&logs_dir.join(ERROR_LOG))?),
        })
    }

    fn max_level(&self) -> LevelFilter {
        let console = self
            .console
            .as_ref()
            .map(|logger| logger.filter())
            .unwrap_or(LevelFilter::Off);
        console.max(LevelFilter::Info)
    }

    fn write_line(file: &Mutex<File>, line: &str) {
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

impl Log for PanelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LevelFilter::Info
            || self
                .console
                .as_ref()
                .is_some_and(|logger| logger.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if let Some(console) = &self.console {
            console.log(record);
        }

        if record.level() > Level::Info {
            return;
        }

        let line = format_record(record);
        Self::write_line(&self.combined, &line);
        if record.level() == Level::Error {
            Self::write_line(&self.errors, &line);
        }
    }

    fn flush(&self) {
        for file in [&self.combined, &self.errors] {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
        if let Some(console) = &self.console {
            console.flush();
        }
    }
}

/// Installs [`PanelLogger`] as the global logger.
pub fn init_logging(logs_dir: &Path, echo: bool) -> Result<(), LoggingError> {
    let logger = PanelLogger::new(logs_dir, echo)?;
    let max_level = logger.max_level();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}
