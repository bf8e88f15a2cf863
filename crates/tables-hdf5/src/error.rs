//! Error type for the HDF5 sink.

use tables_core::TableError;
use thiserror::Error;

/// Errors from the HDF5 sink.
///
/// Raw library calls are checked individually; a negative status surfaces
/// as [`Hdf5Error::Call`] naming the call that failed.  Nothing is retried.
#[derive(Debug, Error)]
pub enum Hdf5Error {
    #[error("HDF5 call {what} failed")]
    Call { what: &'static str },

    #[error("HDF5 library error: {0}")]
    Lib(#[from] hdf5::Error),

    #[error("on appending to HDF5 table `{table}`, types are not compatible")]
    TypeMismatch { table: String },

    #[error("column name `{0}` cannot be represented in HDF5")]
    BadColumnName(String),

    #[error("table `{0}` has no active output session on this sink")]
    NoSession(String),
}

impl From<Hdf5Error> for TableError {
    fn from(e: Hdf5Error) -> Self {
        TableError::Sink(Box::new(e))
    }
}

/// Alias for `Result<T, Hdf5Error>`.
pub type Hdf5Result<T> = Result<T, Hdf5Error>;
