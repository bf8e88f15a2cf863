//! `tables-hdf5` — HDF5 output for the `rust_tables` workspace.
//!
//! Each bound table becomes one dataset of compound type ("array of
//! structs") inside a configured HDF5 group, named after the table.  Field
//! offsets are the C-struct layout computed by
//! [`tables_core::RowLayout`]; datasets are 1-D, chunked, and extendible,
//! with one record appended per emitted row.
//!
//! Type mapping:
//!
//! | Column type   | HDF5 member type        |
//! |---------------|-------------------------|
//! | `bool`        | native unsigned char    |
//! | `iN` / `uN`   | native fixed-width ints |
//! | `f32` / `f64` | native float / double   |
//! | string (L)    | fixed string of L+1     |
//!
//! ```rust,ignore
//! use tables_core::{OpenMode, SinkHandle};
//! use tables_hdf5::Hdf5Sink;
//!
//! let sink = SinkHandle::new(Hdf5Sink::create("run.h5", OpenMode::Truncate)?);
//! table.bind(&sink)?;
//! ```

pub mod error;
pub mod sink;

mod check;
mod codec;

#[cfg(test)]
mod tests;

pub use error::{Hdf5Error, Hdf5Result};
pub use sink::Hdf5Sink;
