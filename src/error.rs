//! Error taxonomy for logview.
//!
//! Every variant is fatal: the poll loop never retries and `main` reports the
//! error and exits with status 1.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogviewError {
    /// Malformed command line arguments
    #[error("Invalid usage: {message}")]
    Usage { message: String },

    /// Target log file missing or unreadable
    #[error("Open log file:[{}] failed", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an already opened log file failed
    #[error("Read log file:[{}] failed", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file got smaller than the last observed size
    #[error(
        "Log file:[{}] shrank from {previous} to {current} bytes (truncated or replaced)",
        path.display()
    )]
    FileShrunk {
        path: PathBuf,
        previous: u64,
        current: u64,
    },

    /// Writing rendered lines to the output sink failed
    #[error("Write to output failed")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be read at all
    #[error("Read config failed: {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single line of the config file is invalid
    #[error("{}:{line}: {message}", path.display())]
    ConfigValidation {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LogviewError>;

impl LogviewError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    pub fn output(source: std::io::Error) -> Self {
        Self::Output { source }
    }

    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }
}
