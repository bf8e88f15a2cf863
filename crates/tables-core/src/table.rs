//! Output tables and the prolog / emit_row / epilog protocol.

use std::fmt;
use std::io;
use std::rc::Rc;

use serde_json::json;

use crate::binding::{remove_from_sink, remove_from_table, Binding, BindingHandle, SharedSink, SinkHandle};
use crate::error::{TableError, TableResult};
use crate::item::{
    check_unlocked, cleanup, new_node, path_segments, GroupBody, GroupOps, NodeKind, NodeRef,
    TableBody,
};
use crate::value::Scalar;
use crate::{registry, Column};

/// Advisory classification of a table's use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Flavor {
    /// Summary data reported after the end of a run.
    Results,
    /// Data collected periodically during a run.
    TimeSeries,
}

/// An output table: a root column group with a flavor, a lock state, and a
/// set of sink bindings.
///
/// # Lifecycle
///
/// Populate the table (and bind sinks) while it is unlocked, then call
/// [`prolog`](Table::prolog) to enter output mode.  While locked, each
/// [`emit_row`](Table::emit_row) dispatches the current column values to
/// every enabled binding, in binding-insertion order.
/// [`epilog`](Table::epilog) leaves output mode and makes the table
/// editable again; the cycle may repeat.
///
/// Table names are unique among live tables, process-wide (the registry is
/// thread-local; the whole library is single-threaded by contract).
///
/// `Table` is a cheap clone of a shared node; the table dies — and its name
/// becomes reusable — when the last handle drops.
#[derive(Clone)]
pub struct Table {
    pub(crate) node: NodeRef,
}

impl Table {
    // ── Construction ──────────────────────────────────────────────────────

    /// Create and register an empty table.
    pub fn new(name: &str, flavor: Flavor) -> TableResult<Table> {
        let node = new_node(
            name,
            NodeKind::Table(
                GroupBody::default(),
                TableBody {
                    flavor,
                    enabled: true,
                    locked: false,
                    columns: Vec::new(),
                    columns_dirty: false,
                    bindings: Vec::new(),
                },
            ),
        )?;
        registry::register(name, Rc::downgrade(&node))?;
        Ok(Table { node })
    }

    /// A results-flavored table.
    pub fn results(name: &str) -> TableResult<Table> {
        Table::new(name, Flavor::Results)
    }

    /// A time-series table with a leading computed `"time"` column that
    /// samples `now` on every row.
    pub fn time_series<T: Scalar>(
        name: &str,
        now_format: &str,
        now: impl Fn() -> T + 'static,
    ) -> TableResult<Table> {
        let table = Table::new(name, Flavor::TimeSeries)?;
        table.add(&Column::computed(Self::TIME_COLUMN, now_format, now)?)?;
        Ok(table)
    }

    /// Name of the column pre-added by [`time_series`](Table::time_series).
    pub const TIME_COLUMN: &'static str = "time";

    // ── Attributes ────────────────────────────────────────────────────────

    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    pub fn flavor(&self) -> Flavor {
        self.body(|t| t.flavor)
    }

    /// Locked between `prolog` and `epilog`; structural mutation fails
    /// while locked.
    pub fn is_locked(&self) -> bool {
        self.body(|t| t.locked)
    }

    pub fn enabled(&self) -> bool {
        self.body(|t| t.enabled)
    }

    /// A disabled table emits no data even when `emit_row` is called.
    pub fn set_enabled(&self, enabled: bool) {
        self.node
            .borrow_mut()
            .kind
            .table_body_mut()
            .expect("table node")
            .enabled = enabled;
    }

    // ── Columns ───────────────────────────────────────────────────────────

    /// Number of leaf columns, in pre-order.  Forces a cleanup.
    pub fn size(&self) -> usize {
        cleanup(&self.node);
        self.body(|t| t.columns.len())
    }

    /// The `i`-th leaf column in pre-order.  Forces a cleanup.
    pub fn column(&self, i: usize) -> Option<Column> {
        cleanup(&self.node);
        self.body(|t| t.columns.get(i).cloned())
            .map(|node| Column { node })
    }

    /// Look up a column by `/`-separated path.
    pub fn column_by_name(&self, path: &str) -> TableResult<Column> {
        let item = self.get_item(path)?;
        item.as_column()
            .ok_or_else(|| TableError::NotAColumn(path.to_string()))
    }

    /// Snapshot of the flat column list, in pre-order.  Forces a cleanup.
    pub fn columns(&self) -> Vec<Column> {
        cleanup(&self.node);
        self.body(|t| t.columns.clone())
            .into_iter()
            .map(|node| Column { node })
            .collect()
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    /// Bind this table to a sink.  Idempotent: binding an already-bound
    /// sink returns the existing binding.  Only legal while unlocked.
    pub fn bind(&self, sink: &SinkHandle) -> TableResult<BindingHandle> {
        check_unlocked(&self.node)?;
        self.prune_bindings();

        let existing = self.body(|t| {
            t.bindings
                .iter()
                .find(|b| {
                    b.sink
                        .upgrade()
                        .is_some_and(|s| Rc::ptr_eq(&s, &sink.imp))
                })
                .cloned()
        });
        if let Some(inner) = existing {
            return Ok(BindingHandle { inner });
        }

        let binding = Rc::new(Binding {
            table: Rc::downgrade(&self.node),
            sink: Rc::downgrade(&sink.imp),
            sink_list: Rc::downgrade(&sink.bindings),
            enabled: std::cell::Cell::new(true),
        });
        self.node
            .borrow_mut()
            .kind
            .table_body_mut()
            .expect("table node")
            .bindings
            .push(Rc::clone(&binding));
        sink.bindings.borrow_mut().push(Rc::clone(&binding));
        Ok(BindingHandle { inner: binding })
    }

    /// Remove the binding with `sink`, if any.  Returns whether one
    /// existed.  Only legal while unlocked.
    pub fn unbind(&self, sink: &SinkHandle) -> TableResult<bool> {
        check_unlocked(&self.node)?;
        let found = self.body(|t| {
            t.bindings
                .iter()
                .find(|b| {
                    b.sink
                        .upgrade()
                        .is_some_and(|s| Rc::ptr_eq(&s, &sink.imp))
                })
                .cloned()
        });
        match found {
            Some(binding) => {
                remove_from_table(&self.node, &binding);
                remove_from_sink(&binding);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every binding of this table.  Only legal while unlocked.
    pub fn unbind_all(&self) -> TableResult<()> {
        check_unlocked(&self.node)?;
        let drained: Vec<Rc<Binding>> = {
            let mut b = self.node.borrow_mut();
            b.kind
                .table_body_mut()
                .expect("table node")
                .bindings
                .drain(..)
                .collect()
        };
        for binding in drained {
            remove_from_sink(&binding);
        }
        Ok(())
    }

    /// The live bindings of this table, in insertion order.  Dead sinks are
    /// pruned.
    pub fn bindings(&self) -> Vec<BindingHandle> {
        self.prune_bindings();
        self.body(|t| t.bindings.clone())
            .into_iter()
            .map(|inner| BindingHandle { inner })
            .collect()
    }

    // ── Output protocol ───────────────────────────────────────────────────

    /// Enter output mode: repack the hierarchy, deliver `output_prolog` to
    /// every bound sink (enabled or not), and lock the table.
    pub fn prolog(&self) -> TableResult<()> {
        cleanup(&self.node);
        for (_, sink) in self.live_bindings() {
            sink.borrow_mut().output_prolog(self)?;
        }
        self.set_locked(true);
        Ok(())
    }

    /// Emit one row to every enabled binding.
    ///
    /// With no bound sinks this is a silent no-op.  Fails if `prolog` has
    /// not been called; a disabled table swallows the row silently.
    pub fn emit_row(&self) -> TableResult<()> {
        let live = self.live_bindings();
        {
            let b = self.node.borrow();
            let body = b.kind.table_body().expect("table node");
            if body.bindings.is_empty() {
                return Ok(());
            }
            if !body.locked {
                return Err(TableError::NotLocked(b.name.clone()));
            }
            if !body.enabled {
                return Ok(());
            }
        }
        for (binding, sink) in live {
            if binding.enabled.get() {
                sink.borrow_mut().output_row(self)?;
            }
        }
        Ok(())
    }

    /// Leave output mode (unlocking the table), then deliver
    /// `output_epilog` to every bound sink regardless of its enabled flag.
    pub fn epilog(&self) -> TableResult<()> {
        self.set_locked(false);
        for (_, sink) in self.live_bindings() {
            sink.borrow_mut().output_epilog(self)?;
        }
        Ok(())
    }

    // ── Schema ────────────────────────────────────────────────────────────

    /// A JSON description of the table's columns:
    ///
    /// ```json
    /// { "name": "t",
    ///   "columns": [
    ///     { "name": "grp/x", "path": ["grp", "x"],
    ///       "type": "f64", "arithmetic": true } ] }
    /// ```
    pub fn generate_schema(&self) -> serde_json::Value {
        let columns: Vec<serde_json::Value> = self
            .columns()
            .iter()
            .map(|col| {
                json!({
                    "name": col.path_name("/"),
                    "path": path_segments(&col.node),
                    "type": col.column_type().type_name(),
                    "arithmetic": col.is_arithmetic(),
                })
            })
            .collect();
        json!({ "name": self.name(), "columns": columns })
    }

    /// Pretty-print [`generate_schema`](Table::generate_schema) to `out`.
    pub fn write_schema(&self, out: &mut dyn io::Write) -> TableResult<()> {
        serde_json::to_writer_pretty(&mut *out, &self.generate_schema())
            .map_err(|e| TableError::Sink(Box::new(e)))?;
        out.write_all(b"\n")?;
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn body<R>(&self, f: impl FnOnce(&TableBody) -> R) -> R {
        let b = self.node.borrow();
        f(b.kind.table_body().expect("table node"))
    }

    fn set_locked(&self, locked: bool) {
        self.node
            .borrow_mut()
            .kind
            .table_body_mut()
            .expect("table node")
            .locked = locked;
    }

    /// Drop bindings whose sink has been destroyed.
    fn prune_bindings(&self) {
        let dead: Vec<Rc<Binding>> = self.body(|t| {
            t.bindings
                .iter()
                .filter(|b| !b.is_live())
                .cloned()
                .collect()
        });
        for binding in dead {
            remove_from_table(&self.node, &binding);
            remove_from_sink(&binding);
        }
    }

    /// Snapshot of (binding, upgraded sink) pairs, pruning dead sinks, so
    /// dispatch loops never hold a borrow of the table node.
    fn live_bindings(&self) -> Vec<(Rc<Binding>, SharedSink)> {
        self.prune_bindings();
        self.body(|t| {
            t.bindings
                .iter()
                .filter_map(|b| b.sink.upgrade().map(|s| (Rc::clone(b), s)))
                .collect()
        })
    }
}

impl GroupOps for Table {}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Table {}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table(`{}`, {:?}, locked: {})",
            self.name(),
            self.flavor(),
            self.is_locked()
        )
    }
}
