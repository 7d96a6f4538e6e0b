//! Errors raised while building or parsing UDT definitions.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UdtError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not find {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Line {line}: {message}")]
    MalformedField { line: usize, message: String },
    #[error("Struct never ended: {0}")]
    UnterminatedStruct(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("'{0}': names must be non-empty and cannot contain '.', '\"' or line breaks")]
    InvalidName(String),
    #[error("UDT type {0} is not implemented")]
    UnknownType(String),
    #[error("Cyclic reference: {0}")]
    CyclicReference(String),
}

impl UdtError {
    /// Attach a line number to errors raised while building a field from that line.
    pub(crate) fn at_line(self, line: usize) -> UdtError {
        match self {
            UdtError::InvalidRange(msg) => UdtError::InvalidRange(format!("line {}: {}", line, msg)),
            UdtError::MalformedField { message, .. } => UdtError::MalformedField { line, message },
            other => other,
        }
    }
}
