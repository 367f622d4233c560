use std::io;

use thiserror::Error;

use crate::db::ConnectionError;
use crate::logging::LoggingError;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Logger error: {0}")]
    Logger(#[from] LoggingError),

    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(#[from] ConnectionError),

    #[error("Template parsing error(s) in {dir}: {source}")]
    Templates { dir: String, source: tera::Error },

    #[error("Cannot bind {server} listener on {address}: {source}")]
    Bind {
        server: &'static str,
        address: String,
        source: io::Error,
    },

    #[error("Illegal bootstrap transition from {from:?} to {to:?}")]
    IllegalTransition {
        from: crate::bootstrap::BootstrapState,
        to: crate::bootstrap::BootstrapState,
    },

    #[error("Server error: {0}")]
    Server(#[from] io::Error),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

impl BootstrapError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::DatabaseUnavailable(_) => 1,
            BootstrapError::Config(_) => 2,
            BootstrapError::Logger(_) => 3,
            _ => 4,
        }
    }
}
