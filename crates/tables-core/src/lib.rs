//! `tables-core` — hierarchical tables of typed columns, streamed to sinks.
//!
//! This crate is the model half of the `rust_tables` workspace: it knows
//! nothing about concrete output formats.  Sink crates (`tables-text`,
//! `tables-hdf5`) implement the [`Sink`] trait and are driven through the
//! table lifecycle protocol.
//!
//! | Module       | Contents                                             |
//! |--------------|------------------------------------------------------|
//! | [`item`]     | `Item`, `Group`, the hierarchy and its traversals    |
//! | [`column`]   | `Column` — typed / computed / reference leaves       |
//! | [`table`]    | `Table`, `Flavor`, prolog → emit_row → epilog        |
//! | [`binding`]  | `SinkHandle`, `BindingHandle`, symmetric unbinding   |
//! | [`sink`]     | The `Sink` trait and `OpenMode`                      |
//! | [`layout`]   | `RowLayout` — packed binary row images               |
//! | [`value`]    | Runtime scalar tags and value slots                  |
//! | [`registry`] | Process-wide table name registry                     |
//! | [`error`]    | `TableError`, `TableResult`                          |
//!
//! # Example
//!
//! ```rust,ignore
//! use tables_core::{Column, Group, GroupOps, Table};
//!
//! let table = Table::results("run_summary")?;
//! let grp = Group::new_in(&table, "totals")?;
//! let words = Column::new::<u64>("nwords", "%u")?;
//! grp.add(&words)?;
//!
//! table.bind(&sink)?;
//! table.prolog()?;
//! words.set(128.0)?;
//! table.emit_row()?;
//! table.epilog()?;
//! ```
//!
//! # Threading
//!
//! The whole library is single-threaded by contract: nodes are shared with
//! `Rc`/`RefCell` and the table registry is thread-local.  Callers that
//! drive emission from several threads must keep each table (and everything
//! bound to it) on one thread.

pub mod binding;
pub mod column;
pub mod error;
pub mod item;
pub mod layout;
pub mod registry;
pub mod sink;
pub mod table;
pub mod value;

mod printf;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use binding::{BindingHandle, SinkHandle};
pub use column::Column;
pub use error::{TableError, TableResult};
pub use item::{AsItem, Group, GroupOps, Item};
pub use layout::RowLayout;
pub use sink::{OpenMode, Sink};
pub use table::{Flavor, Table};
pub use value::{ColumnType, Scalar, ScalarKind, ScalarValue};
