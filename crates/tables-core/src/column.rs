//! Typed table columns.
//!
//! A column is a named, formatted value slot.  Most columns own their value
//! (set via [`Column::set`] / [`Column::set_str`] between rows); two
//! variants do not:
//!
//! - **computed** columns call a closure each time they are read, and
//! - **reference** columns trace a live program variable through a shared
//!   `Rc<Cell<T>>` / `Rc<RefCell<String>>` handle.
//!
//! Both are read-only from the column side and obey the same text/binary
//! emission contract.  They are the mechanism time-series tables use to
//! sample program state at each `emit_row`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{TableError, TableResult};
use crate::item::{new_node, path_name, NodeKind, NodeRef};
use crate::printf::{self, Arg};
use crate::value::{ColumnType, Scalar, ScalarValue};
use crate::{Group, Table};

// ── Column body ───────────────────────────────────────────────────────────────

pub(crate) enum Payload {
    /// Owned scalar slot.
    Value(ScalarValue),
    /// Computed scalar; evaluated on every read.
    Computed(Box<dyn Fn() -> ScalarValue>),
    /// Owned string slot.
    Text(String),
    /// Computed string; evaluated on every read.
    TextComputed(Box<dyn Fn() -> String>),
}

pub(crate) struct ColumnBody {
    pub(crate) format: String,
    pub(crate) ctype: ColumnType,
    pub(crate) payload: Payload,
}

// ── Column handle ─────────────────────────────────────────────────────────────

/// A handle to a typed column node.
#[derive(Clone)]
pub struct Column {
    pub(crate) node: NodeRef,
}

impl Column {
    fn build(name: &str, format: &str, ctype: ColumnType, payload: Payload) -> TableResult<Column> {
        let body = ColumnBody {
            format: format.to_string(),
            ctype,
            payload,
        };
        new_node(name, NodeKind::Column(body)).map(|node| Column { node })
    }

    // ── Constructors ──────────────────────────────────────────────────────

    /// A zero-initialized scalar column.
    pub fn new<T: Scalar>(name: &str, format: &str) -> TableResult<Column> {
        Self::build(
            name,
            format,
            ColumnType::Scalar(T::KIND),
            Payload::Value(ScalarValue::from_f64(T::KIND, 0.0)),
        )
    }

    /// A scalar column with an initial value.
    pub fn with_value<T: Scalar>(name: &str, format: &str, value: T) -> TableResult<Column> {
        let value = value.to_value();
        Self::build(name, format, ColumnType::Scalar(value.kind()), Payload::Value(value))
    }

    /// A scalar column whose value is produced by `f` on every read.
    pub fn computed<T: Scalar>(
        name: &str,
        format: &str,
        f: impl Fn() -> T + 'static,
    ) -> TableResult<Column> {
        Self::build(
            name,
            format,
            ColumnType::Scalar(T::KIND),
            Payload::Computed(Box::new(move || f().to_value())),
        )
    }

    /// A scalar column tracing the shared cell `src`.
    pub fn reference<T: Scalar>(
        name: &str,
        format: &str,
        src: &Rc<Cell<T>>,
    ) -> TableResult<Column> {
        let src = Rc::clone(src);
        Self::computed(name, format, move || src.get())
    }

    /// A fixed-capacity string column, initially empty.
    pub fn string(name: &str, max_len: usize, format: &str) -> TableResult<Column> {
        Self::build(
            name,
            format,
            ColumnType::Text { max_len },
            Payload::Text(String::new()),
        )
    }

    /// A fixed-capacity string column with an initial value (truncated to
    /// `max_len` bytes).
    pub fn string_with_value(
        name: &str,
        max_len: usize,
        format: &str,
        value: &str,
    ) -> TableResult<Column> {
        Self::build(
            name,
            format,
            ColumnType::Text { max_len },
            Payload::Text(truncate(value, max_len)),
        )
    }

    /// A string column tracing the shared string `src`.
    pub fn string_reference(
        name: &str,
        max_len: usize,
        format: &str,
        src: &Rc<RefCell<String>>,
    ) -> TableResult<Column> {
        let src = Rc::clone(src);
        Self::build(
            name,
            format,
            ColumnType::Text { max_len },
            Payload::TextComputed(Box::new(move || src.borrow().clone())),
        )
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    pub fn parent(&self) -> Option<Group> {
        self.node
            .borrow()
            .parent
            .upgrade()
            .map(|node| Group { node })
    }

    /// The table that owns this column, if any.
    pub fn table(&self) -> Option<Table> {
        crate::item::owning_table(&self.node).map(|node| Table { node })
    }

    pub fn path_name(&self, sep: &str) -> String {
        path_name(&self.node, sep)
    }

    /// The printf-style format string used by text sinks.
    pub fn format(&self) -> String {
        self.node
            .borrow()
            .kind
            .column_body()
            .expect("column node")
            .format
            .clone()
    }

    /// The runtime type tag.
    pub fn column_type(&self) -> ColumnType {
        self.body(|b| b.ctype)
    }

    /// Bytes in the binary image of this column's value.
    pub fn size(&self) -> usize {
        self.column_type().size()
    }

    /// Alignment of the binary image.
    pub fn align(&self) -> usize {
        self.column_type().align()
    }

    pub fn is_arithmetic(&self) -> bool {
        self.column_type().is_arithmetic()
    }

    // ── Values ────────────────────────────────────────────────────────────

    /// Set an arithmetic column from a double, coercing C-style.
    ///
    /// Fails on string columns and on computed/reference columns.
    pub fn set(&self, value: f64) -> TableResult<()> {
        let mut b = self.node.borrow_mut();
        let name = b.name.clone();
        let body = b.kind.column_body_mut().expect("column node");
        let kind = match body.ctype {
            ColumnType::Scalar(k) => k,
            ColumnType::Text { .. } => return Err(TableError::NotArithmetic(name)),
        };
        match &mut body.payload {
            Payload::Value(slot) => {
                *slot = ScalarValue::from_f64(kind, value);
                Ok(())
            }
            Payload::Computed(_) => Err(TableError::ReadOnly(name)),
            // Unreachable for a well-formed node; kept for totality.
            _ => Err(TableError::NotArithmetic(name)),
        }
    }

    /// Set a string column, truncating to its capacity.
    ///
    /// Fails on arithmetic columns and on reference columns.
    pub fn set_str(&self, value: &str) -> TableResult<()> {
        let mut b = self.node.borrow_mut();
        let name = b.name.clone();
        let body = b.kind.column_body_mut().expect("column node");
        let max_len = match body.ctype {
            ColumnType::Text { max_len } => max_len,
            ColumnType::Scalar(_) => return Err(TableError::NotText(name)),
        };
        match &mut body.payload {
            Payload::Text(slot) => {
                *slot = truncate(value, max_len);
                Ok(())
            }
            Payload::TextComputed(_) => Err(TableError::ReadOnly(name)),
            _ => Err(TableError::NotText(name)),
        }
    }

    /// Set a scalar column from a typed value.  The type must match the
    /// column's declared kind exactly.
    pub fn set_value<T: Scalar>(&self, value: T) -> TableResult<()> {
        let mut b = self.node.borrow_mut();
        let name = b.name.clone();
        let body = b.kind.column_body_mut().expect("column node");
        if body.ctype != ColumnType::Scalar(T::KIND) {
            return Err(TableError::WrongType(name, body.ctype.type_name()));
        }
        match &mut body.payload {
            Payload::Value(slot) => {
                *slot = value.to_value();
                Ok(())
            }
            _ => Err(TableError::ReadOnly(name)),
        }
    }

    /// The current scalar value.  Computed/reference columns are evaluated.
    pub fn value(&self) -> TableResult<ScalarValue> {
        let b = self.node.borrow();
        let name = b.name.clone();
        match &b.kind.column_body().expect("column node").payload {
            Payload::Value(v) => Ok(*v),
            Payload::Computed(f) => Ok(f()),
            _ => Err(TableError::NotArithmetic(name)),
        }
    }

    /// The current string value of a string column.
    pub fn text_value(&self) -> TableResult<String> {
        let b = self.node.borrow();
        let name = b.name.clone();
        match &b.kind.column_body().expect("column node").payload {
            Payload::Text(s) => Ok(s.clone()),
            Payload::TextComputed(f) => Ok(f()),
            _ => Err(TableError::NotText(name)),
        }
    }

    /// Render the current value through the column's format string.
    pub fn format_value(&self) -> String {
        let b = self.node.borrow();
        let body = b.kind.column_body().expect("column node");
        match &body.payload {
            Payload::Value(v) => printf::format(&body.format, &scalar_arg(*v)),
            Payload::Computed(f) => printf::format(&body.format, &scalar_arg(f())),
            Payload::Text(s) => printf::format(&body.format, &Arg::Str(s)),
            Payload::TextComputed(f) => printf::format(&body.format, &Arg::Str(&f())),
        }
    }

    /// Write the binary image of the current value into `buf`, which must be
    /// exactly [`size`](Self::size) bytes long.  String images are
    /// NUL-terminated and zero-padded to `max_len + 1` bytes.
    pub fn copy_into(&self, buf: &mut [u8]) {
        let b = self.node.borrow();
        let body = b.kind.column_body().expect("column node");
        debug_assert_eq!(buf.len(), body.ctype.size());
        match &body.payload {
            Payload::Value(v) => v.write_to(buf),
            Payload::Computed(f) => f().write_to(buf),
            Payload::Text(s) => copy_text(s, buf),
            Payload::TextComputed(f) => copy_text(&f(), buf),
        }
    }

    fn body<R>(&self, f: impl FnOnce(&ColumnBody) -> R) -> R {
        let b = self.node.borrow();
        f(b.kind.column_body().expect("column node"))
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Column {}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column(`{}`: {})", self.name(), self.column_type().type_name())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scalar_arg(v: ScalarValue) -> Arg<'static> {
    match v {
        ScalarValue::Bool(b) => Arg::Uint(b as u64),
        ScalarValue::I8(v) => Arg::Int(v as i64),
        ScalarValue::I16(v) => Arg::Int(v as i64),
        ScalarValue::I32(v) => Arg::Int(v as i64),
        ScalarValue::I64(v) => Arg::Int(v),
        ScalarValue::U8(v) => Arg::Uint(v as u64),
        ScalarValue::U16(v) => Arg::Uint(v as u64),
        ScalarValue::U32(v) => Arg::Uint(v as u64),
        ScalarValue::U64(v) => Arg::Uint(v),
        ScalarValue::F32(v) => Arg::Float(v as f64),
        ScalarValue::F64(v) => Arg::Float(v),
    }
}

/// Byte-length truncation on a char boundary.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn copy_text(s: &str, buf: &mut [u8]) {
    let max_len = buf.len() - 1;
    let bytes = s.as_bytes();
    let n = bytes.len().min(max_len);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf[n..].fill(0);
}
