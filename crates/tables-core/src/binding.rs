//! Table ↔ sink bindings.
//!
//! Bindings form a bipartite many-to-many graph.  Each binding is a shared
//! object (`Rc<Binding>`) held in *both* endpoint lists, while the binding
//! itself refers to its endpoints only weakly.  Explicit unbinding removes
//! the binding from both lists symmetrically; when an endpoint is dropped
//! its weak reference dies and the surviving side prunes the dead binding
//! on its next access.  Binding counts are small, so lookups are linear
//! scans.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::TableResult;
use crate::item::{NodeRef, NodeWeak};
use crate::sink::Sink;
use crate::Table;

pub(crate) type SharedSink = Rc<RefCell<dyn Sink>>;
pub(crate) type WeakSink = Weak<RefCell<dyn Sink>>;
pub(crate) type SinkList = Rc<RefCell<Vec<Rc<Binding>>>>;

/// The link object between one table and one sink.
pub(crate) struct Binding {
    pub(crate) table: NodeWeak,
    pub(crate) sink: WeakSink,
    pub(crate) sink_list: Weak<RefCell<Vec<Rc<Binding>>>>,
    pub(crate) enabled: Cell<bool>,
}

impl Binding {
    /// True while both endpoints are still alive.
    pub(crate) fn is_live(&self) -> bool {
        self.table.strong_count() > 0 && self.sink.strong_count() > 0
    }
}

/// A handle to one table↔sink binding.
#[derive(Clone)]
pub struct BindingHandle {
    pub(crate) inner: Rc<Binding>,
}

impl BindingHandle {
    /// Whether `emit_row` dispatches through this binding.
    pub fn enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Enable or disable row dispatch through this binding.  Prolog and
    /// epilog callbacks are delivered regardless.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.set(enabled);
    }

    /// The bound table, if it is still alive.
    pub fn table(&self) -> Option<Table> {
        self.inner.table.upgrade().map(|node| Table { node })
    }
}

impl fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self
            .table()
            .map(|t| t.name())
            .unwrap_or_else(|| "<dead>".to_string());
        write!(f, "BindingHandle(table `{table}`, enabled: {})", self.enabled())
    }
}

// ── SinkHandle ────────────────────────────────────────────────────────────────

/// A shared, type-erased sink plus its side of the binding graph.
///
/// Created with [`SinkHandle::new`] (or [`from_rc`](SinkHandle::from_rc) to
/// keep a typed `Rc` for later inspection).  Clones share the same sink;
/// the sink is released when the last clone (and any user-held `Rc`) drops,
/// after which bound tables prune the dead binding on their next dispatch.
#[derive(Clone)]
pub struct SinkHandle {
    pub(crate) imp: SharedSink,
    pub(crate) bindings: SinkList,
}

impl SinkHandle {
    /// Wrap a sink implementation.
    pub fn new(sink: impl Sink + 'static) -> SinkHandle {
        Self::from_rc(Rc::new(RefCell::new(sink)))
    }

    /// Wrap an already-shared sink, leaving the caller a typed handle.
    pub fn from_rc<S: Sink + 'static>(sink: Rc<RefCell<S>>) -> SinkHandle {
        SinkHandle {
            imp: sink,
            bindings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Bind this sink to `table` (idempotent).
    pub fn bind(&self, table: &Table) -> TableResult<BindingHandle> {
        table.bind(self)
    }

    /// Remove the binding with `table`, if any.  Returns whether one existed.
    pub fn unbind(&self, table: &Table) -> TableResult<bool> {
        table.unbind(self)
    }

    /// Drop every binding of this sink, detaching it from all tables.
    ///
    /// Unlike the table side this does not require the tables to be
    /// unlocked — it is the teardown path used when a sink goes away.
    pub fn unbind_all(&self) {
        let drained: Vec<Rc<Binding>> = self.bindings.borrow_mut().drain(..).collect();
        for binding in drained {
            if let Some(table) = binding.table.upgrade() {
                remove_from_table(&table, &binding);
            }
        }
    }

    /// The live bindings of this sink.  Dead tables are pruned.
    pub fn bindings(&self) -> Vec<BindingHandle> {
        self.bindings
            .borrow_mut()
            .retain(|b| b.table.strong_count() > 0);
        self.bindings
            .borrow()
            .iter()
            .map(|inner| BindingHandle {
                inner: Rc::clone(inner),
            })
            .collect()
    }

    /// Flush the underlying sink.
    pub fn flush(&self) -> TableResult<()> {
        self.imp.borrow_mut().flush()
    }

    /// Identity comparison: do two handles share one sink?
    pub fn same(&self, other: &SinkHandle) -> bool {
        Rc::ptr_eq(&self.imp, &other.imp)
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SinkHandle({} bindings)", self.bindings.borrow().len())
    }
}

// ── Shared helpers used by Table ──────────────────────────────────────────────

/// Remove `binding` from the binding list inside a table node.
pub(crate) fn remove_from_table(table: &NodeRef, binding: &Rc<Binding>) {
    if let Some(body) = table.borrow_mut().kind.table_body_mut() {
        body.bindings.retain(|b| !Rc::ptr_eq(b, binding));
    }
}

/// Remove `binding` from its sink-side list, if that list is still alive.
pub(crate) fn remove_from_sink(binding: &Rc<Binding>) {
    if let Some(list) = binding.sink_list.upgrade() {
        list.borrow_mut().retain(|b| !Rc::ptr_eq(b, binding));
    }
}
