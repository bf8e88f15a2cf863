//! Error type for the text sink.

use tables_core::TableError;
use thiserror::Error;

/// Errors from the CSV text sink.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("table `{0}` has no active output session on this sink")]
    NoSession(String),
}

impl From<TextError> for TableError {
    fn from(e: TextError) -> Self {
        TableError::Sink(Box::new(e))
    }
}

/// Alias for `Result<T, TextError>`.
pub type TextResult<T> = Result<T, TextError>;
