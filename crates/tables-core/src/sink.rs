//! The sink interface driven by table output sessions.

use crate::error::TableResult;
use crate::Table;

/// How a sink treats pre-existing output when it is opened.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpenMode {
    /// Replace existing output.
    #[default]
    Truncate,
    /// Extend existing output where the sink supports it.
    Append,
}

/// An output endpoint that receives table rows.
///
/// A sink is driven through three callbacks per bound table: one
/// `output_prolog` when the table enters output mode, one `output_row` per
/// emitted row, and one `output_epilog` when the session ends.  Sinks may
/// hold per-table state between prolog and epilog (formatters, dataset
/// handles) and must key it by table name — names are unique among live
/// tables.
///
/// Implementations read the table's columns through the `&Table` handle;
/// they must not structurally mutate the table (it is locked for the whole
/// session).
pub trait Sink {
    /// Prepare for rows from `table` (write headers, create datasets, …).
    fn output_prolog(&mut self, table: &Table) -> TableResult<()>;

    /// Emit one row built from the current column values of `table`.
    fn output_row(&mut self, table: &Table) -> TableResult<()>;

    /// Conclude the output session for `table`.
    fn output_epilog(&mut self, table: &Table) -> TableResult<()>;

    /// Push buffered output to the underlying medium.
    fn flush(&mut self) -> TableResult<()> {
        Ok(())
    }
}
