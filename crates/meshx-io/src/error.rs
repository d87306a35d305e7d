//! Error types for meshx-io

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshIoError>;

#[derive(Error, Debug)]
pub enum MeshIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck error: {0}")]
    Deck(#[from] meshx_deck::ParseError),

    #[error("Model error: {0}")]
    Model(#[from] meshx_model::ModelError),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No key table found in {0}")]
    MissingKeyTable(PathBuf),

    #[error("Key table of {0} lists no blocks")]
    EmptyKeyTable(PathBuf),

    #[error("Block {slot} of {path} is truncated: expected {expected} bytes, found {found}")]
    TruncatedBlock {
        path: PathBuf,
        slot: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl MeshIoError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        MeshIoError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Whether a caller may treat the read as "nothing here" rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MeshIoError::EmptyKeyTable(_))
    }
}
