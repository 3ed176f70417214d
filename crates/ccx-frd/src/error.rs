//! Error types for ccx-frd

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrdError>;

#[derive(Error, Debug)]
pub enum FrdError {
    /// A required record is missing or cannot be interpreted.
    #[error("malformed FRD file at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("unknown FRD element type {0}")]
    UnknownElementType(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrdError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        FrdError::Malformed {
            line,
            message: message.into(),
        }
    }
}
