//! Library error type.
//!
//! `tables-core` defines the top-level [`TableError`]; sink crates define
//! their own error enums and convert them into `TableError` via `From` impls
//! (boxed into the [`TableError::Sink`] variant).  Every error surfaces
//! synchronously at the operation that caused it — nothing is retried and
//! nothing is logged.

use thiserror::Error;

/// The top-level error type for the `tables-*` crates.
#[derive(Debug, Error)]
pub enum TableError {
    // ── Structure ─────────────────────────────────────────────────────────

    #[error("column items cannot have an empty name")]
    EmptyName,

    #[error("an item named `{0}` already exists in this group")]
    DuplicateItem(String),

    #[error("item `{0}` is already attached to a group")]
    AlreadyAttached(String),

    #[error("cannot add group `{0}` to itself")]
    SelfAttach(String),

    #[error("a table cannot be added to a group")]
    TableAsChild(String),

    #[error("item `{0}` is not a child of this group")]
    NotAChild(String),

    #[error("no item at path `{0}`")]
    NotFound(String),

    #[error("item `{0}` is not a column")]
    NotAColumn(String),

    // ── Lifecycle ─────────────────────────────────────────────────────────

    #[error("table `{0}` is locked; structural changes are not allowed")]
    Locked(String),

    #[error("emit_row() called before prolog() on table `{0}`")]
    NotLocked(String),

    #[error("a table named `{0}` is already registered")]
    DuplicateTable(String),

    // ── Column typing ─────────────────────────────────────────────────────

    #[error("column `{0}` is not arithmetic")]
    NotArithmetic(String),

    #[error("column `{0}` is not a string column")]
    NotText(String),

    #[error("column `{0}` is read-only (computed or reference)")]
    ReadOnly(String),

    #[error("column `{0}` stores {1} values")]
    WrongType(String, &'static str),

    // ── I/O and sinks ─────────────────────────────────────────────────────

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    // ── Sink URLs ─────────────────────────────────────────────────────────

    #[error("malformed sink URL `{0}`")]
    MalformedUrl(String),

    #[error("unknown sink type `{0}` in URL")]
    UnknownSinkType(String),

    #[error("illegal value `{value}` for URL parameter `{key}`")]
    BadUrlValue { key: &'static str, value: String },
}

/// Shorthand result type for all `tables-*` crates.
pub type TableResult<T> = Result<T, TableError>;
