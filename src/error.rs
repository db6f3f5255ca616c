use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Invalid syntax tree for {}:{line}:{column}: {message}", path.display())]
    InvalidTree {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Profile format error at line {line}: {message}")]
    ProfileFormat { line: usize, message: String },

    #[error("Config format error ({key}): {message}")]
    ConfigFormat { key: String, message: String },
}

impl CheckError {
    /// Per-file errors that a caller may choose to skip instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CheckError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
