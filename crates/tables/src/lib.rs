//! `tables` — tabular output for simulation and measurement code.
//!
//! Declare hierarchically structured tables of typed scalar columns, bind
//! each table to one or more output sinks, and stream rows into all bound
//! sinks synchronously.  Built for programs that produce end-of-run summary
//! tables (results) and periodic time-series tables.
//!
//! This crate is the facade of the workspace: it re-exports the core model
//! (`tables-core`), the CSV sinks (`tables-text`), the HDF5 sink
//! (`tables-hdf5`, feature `hdf5`, on by default), and adds the URL sink
//! factory plus a terminal progress bar.
//!
//! # Example
//!
//! ```rust,ignore
//! use tables::{open_sink, Column, GroupOps, Table};
//!
//! let table = Table::results("summary")?;
//! let nwords = Column::new::<u64>("nwords", "%u")?;
//! table.add(&nwords)?;
//!
//! let csv = open_sink("file:summary.csv?format=csvtab")?;
//! let h5 = open_sink("hdf5:run.h5?open_mode=append")?;
//! table.bind(&csv)?;
//! table.bind(&h5)?;
//!
//! table.prolog()?;
//! nwords.set(128.0)?;
//! table.emit_row()?;
//! table.epilog()?;
//! ```
//!
//! # Threading
//!
//! Single-threaded by contract; see the `tables-core` crate docs.

pub mod progress;
pub mod url;

#[cfg(test)]
mod tests;

pub use progress::ProgressBar;
pub use url::{open_sink, stderr_sink, stdout_sink};

pub use tables_core::{
    registry, AsItem, BindingHandle, Column, ColumnType, Flavor, Group, GroupOps, Item, OpenMode,
    RowLayout, Scalar, ScalarKind, ScalarValue, Sink, SinkHandle, Table, TableError, TableResult,
};
pub use tables_text::{MemBuffer, TextFormat, TextSink};

#[cfg(feature = "hdf5")]
pub use tables_hdf5::{Hdf5Error, Hdf5Sink};
