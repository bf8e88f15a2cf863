//! `tables-text` — CSV text sinks for the `rust_tables` workspace.
//!
//! Two row formats are provided over any supported byte stream:
//!
//! | Format   | Shape                                          |
//! |----------|------------------------------------------------|
//! | `CsvTab` | `x,y` header once, then `1,2` value rows       |
//! | `CsvRel` | `table_name,1,2` rows, no header               |
//!
//! Streams: owned files (truncate or append), the process stdout/stderr,
//! and a shared in-memory buffer for tests.
//!
//! ```rust,ignore
//! use tables_core::SinkHandle;
//! use tables_text::{TextFormat, TextSink};
//!
//! let sink = SinkHandle::new(TextSink::create("out.csv", OpenMode::Truncate,
//!                                             TextFormat::CsvTab)?);
//! table.bind(&sink)?;
//! ```

pub mod error;
pub mod sink;
pub mod stream;

#[cfg(test)]
mod tests;

pub use error::{TextError, TextResult};
pub use sink::{TextFormat, TextSink};
pub use stream::{MemBuffer, TextStream};
