//! The hierarchy of column items.
//!
//! # Design
//!
//! Items form a tree: groups own their children (strong references in an
//! ordered child vector plus a name map), children point back at their
//! parent through a `Weak` handle that is cleared on detach.  Public handle
//! types ([`Item`], [`Group`], [`Column`](crate::Column),
//! [`Table`](crate::Table)) are cheap clones of the shared node.
//!
//! Removal writes a tombstone (`None`) into the parent's child vector and
//! marks the ancestor chain dirty; the vector is compacted lazily by
//! `cleanup`, which runs at table `prolog` and on every `items()`/`size()`
//! read.  Deferred compaction keeps sibling indices stable for traversals
//! that do not cross a cleanup point.
//!
//! The whole crate is single-threaded by contract: nodes are
//! `Rc<RefCell<…>>` and must not be shared across threads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::binding::Binding;
use crate::column::ColumnBody;
use crate::error::{TableError, TableResult};
use crate::table::Flavor;
use crate::{Column, Table};

// ── Node internals ────────────────────────────────────────────────────────────

pub(crate) type NodeRef = Rc<RefCell<Node>>;
pub(crate) type NodeWeak = Weak<RefCell<Node>>;

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) parent: NodeWeak,
    pub(crate) index: usize,
    pub(crate) kind: NodeKind,
}

pub(crate) enum NodeKind {
    Group(GroupBody),
    Table(GroupBody, TableBody),
    Column(ColumnBody),
}

#[derive(Default)]
pub(crate) struct GroupBody {
    /// Ordered children; `None` marks a tombstoned (removed) slot.
    pub(crate) children: Vec<Option<NodeRef>>,
    /// Live child lookup by name.
    pub(crate) names: HashMap<String, NodeRef>,
    /// Set when any descendant has been tombstoned.
    pub(crate) dirty: bool,
}

pub(crate) struct TableBody {
    pub(crate) flavor: Flavor,
    pub(crate) enabled: bool,
    pub(crate) locked: bool,
    /// Flat pre-order column cache, rebuilt when `columns_dirty`.
    pub(crate) columns: Vec<NodeRef>,
    pub(crate) columns_dirty: bool,
    pub(crate) bindings: Vec<Rc<Binding>>,
}

impl NodeKind {
    pub(crate) fn group_body(&self) -> Option<&GroupBody> {
        match self {
            NodeKind::Group(g) | NodeKind::Table(g, _) => Some(g),
            NodeKind::Column(_) => None,
        }
    }

    pub(crate) fn group_body_mut(&mut self) -> Option<&mut GroupBody> {
        match self {
            NodeKind::Group(g) | NodeKind::Table(g, _) => Some(g),
            NodeKind::Column(_) => None,
        }
    }

    pub(crate) fn table_body(&self) -> Option<&TableBody> {
        match self {
            NodeKind::Table(_, t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn table_body_mut(&mut self) -> Option<&mut TableBody> {
        match self {
            NodeKind::Table(_, t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn column_body(&self) -> Option<&ColumnBody> {
        match self {
            NodeKind::Column(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn column_body_mut(&mut self) -> Option<&mut ColumnBody> {
        match self {
            NodeKind::Column(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn is_table(&self) -> bool {
        matches!(self, NodeKind::Table(..))
    }

    pub(crate) fn is_column(&self) -> bool {
        matches!(self, NodeKind::Column(_))
    }
}

pub(crate) fn new_node(name: &str, kind: NodeKind) -> TableResult<NodeRef> {
    if name.is_empty() {
        return Err(TableError::EmptyName);
    }
    Ok(Rc::new(RefCell::new(Node {
        name: name.to_string(),
        parent: Weak::new(),
        index: 0,
        kind,
    })))
}

// ── Tree algorithms ───────────────────────────────────────────────────────────

/// The table that owns `node`, if any.  A table node owns itself.
pub(crate) fn owning_table(node: &NodeRef) -> Option<NodeRef> {
    let mut cur = node.clone();
    loop {
        if cur.borrow().kind.is_table() {
            return Some(cur);
        }
        let parent = cur.borrow().parent.upgrade();
        match parent {
            Some(p) => cur = p,
            None => return None,
        }
    }
}

/// Fail if the table owning `node` is in output mode.
pub(crate) fn check_unlocked(node: &NodeRef) -> TableResult<()> {
    if let Some(table) = owning_table(node) {
        let b = table.borrow();
        if b.kind.table_body().is_some_and(|t| t.locked) {
            return Err(TableError::Locked(b.name.clone()));
        }
    }
    Ok(())
}

pub(crate) fn add_item(group: &NodeRef, item: &NodeRef) -> TableResult<()> {
    if Rc::ptr_eq(group, item) {
        return Err(TableError::SelfAttach(group.borrow().name.clone()));
    }
    if item.borrow().kind.is_table() {
        return Err(TableError::TableAsChild(item.borrow().name.clone()));
    }
    check_unlocked(group)?;
    if item.borrow().parent.upgrade().is_some() {
        return Err(TableError::AlreadyAttached(item.borrow().name.clone()));
    }

    let name = item.borrow().name.clone();
    {
        let mut gb = group.borrow_mut();
        let body = gb.kind.group_body_mut().expect("add_item on a non-group");
        if body.names.contains_key(&name) {
            return Err(TableError::DuplicateItem(name));
        }
        let mut ib = item.borrow_mut();
        ib.parent = Rc::downgrade(group);
        ib.index = body.children.len();
        body.children.push(Some(item.clone()));
        body.names.insert(name, item.clone());
    }
    mark_dirty_columns(group);
    Ok(())
}

pub(crate) fn remove_item(group: &NodeRef, item: &NodeRef) -> TableResult<()> {
    check_unlocked(group)?;
    let attached = item
        .borrow()
        .parent
        .upgrade()
        .is_some_and(|p| Rc::ptr_eq(&p, group));
    if !attached {
        return Err(TableError::NotAChild(item.borrow().name.clone()));
    }

    {
        let mut gb = group.borrow_mut();
        let body = gb.kind.group_body_mut().expect("remove_item on a non-group");
        let mut ib = item.borrow_mut();
        debug_assert!(body.children[ib.index]
            .as_ref()
            .is_some_and(|c| Rc::ptr_eq(c, item)));
        body.children[ib.index] = None;
        body.names.remove(&ib.name);
        ib.parent = Weak::new();
    }
    mark_dirty(group);
    Ok(())
}

/// Mark `node` and its ancestor chain as containing tombstones.
pub(crate) fn mark_dirty(node: &NodeRef) {
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        {
            let mut b = n.borrow_mut();
            match b.kind.group_body_mut() {
                Some(body) if !body.dirty => body.dirty = true,
                _ => break,
            }
        }
        cur = n.borrow().parent.upgrade();
    }
}

/// Invalidate the owning table's flat column cache.
pub(crate) fn mark_dirty_columns(node: &NodeRef) {
    if let Some(table) = owning_table(node) {
        if let Some(body) = table.borrow_mut().kind.table_body_mut() {
            body.columns_dirty = true;
        }
    }
}

/// Restore child-vector density below `node` and, for tables, rebuild the
/// flat column cache.  Idempotent; cheap when nothing is dirty.
pub(crate) fn cleanup(node: &NodeRef) {
    if node.borrow().kind.is_table() {
        {
            let mut b = node.borrow_mut();
            if let NodeKind::Table(gb, tb) = &mut b.kind {
                if gb.dirty {
                    tb.columns_dirty = true;
                }
            }
        }
        compact(node);
        let rebuild = node
            .borrow()
            .kind
            .table_body()
            .is_some_and(|t| t.columns_dirty);
        if rebuild {
            let mut cols = Vec::new();
            visit_nodes(node, &mut |n| {
                if n.borrow().kind.is_column() {
                    cols.push(n.clone());
                }
            });
            if let Some(body) = node.borrow_mut().kind.table_body_mut() {
                body.columns = cols;
                body.columns_dirty = false;
            }
        }
    } else {
        compact(node);
    }
}

/// Compact one group's child vector in place (stable order, index fixup)
/// and recurse into surviving subgroups.
fn compact(node: &NodeRef) {
    let dirty = node.borrow().kind.group_body().is_some_and(|g| g.dirty);
    if !dirty {
        return;
    }

    let survivors: Vec<NodeRef> = {
        let mut b = node.borrow_mut();
        let body = b.kind.group_body_mut().expect("compact on a non-group");
        let old = std::mem::take(&mut body.children);
        let survivors: Vec<NodeRef> = old.into_iter().flatten().collect();
        body.children = survivors.iter().cloned().map(Some).collect();
        body.dirty = false;
        survivors
    };

    for (i, child) in survivors.iter().enumerate() {
        child.borrow_mut().index = i;
        if child.borrow().kind.group_body().is_some() {
            compact(child);
        }
    }
}

/// Pre-order traversal skipping tombstones.  Child lists are snapshotted
/// per level, so the visitor never observes a partially mutated group;
/// removing items during visitation is still unsupported.
pub(crate) fn visit_nodes(node: &NodeRef, f: &mut dyn FnMut(&NodeRef)) {
    f(node);
    let children: Vec<NodeRef> = match node.borrow().kind.group_body() {
        Some(body) => body.children.iter().flatten().cloned().collect(),
        None => return,
    };
    for child in &children {
        visit_nodes(child, f);
    }
}

/// Resolve a `/`-separated path of names starting below `start`.
pub(crate) fn resolve(start: &NodeRef, path: &str) -> TableResult<NodeRef> {
    let mut cur = start.clone();
    for segment in path.split('/') {
        let next = {
            let b = cur.borrow();
            let body = b
                .kind
                .group_body()
                .ok_or_else(|| TableError::NotFound(path.to_string()))?;
            body.names
                .get(segment)
                .cloned()
                .ok_or_else(|| TableError::NotFound(path.to_string()))?
        };
        cur = next;
    }
    Ok(cur)
}

/// Names from the topmost ancestor strictly below the owning table down to
/// `node` itself.  Without an owning table the root group is included.
pub(crate) fn path_segments(node: &NodeRef) -> Vec<String> {
    let mut names = Vec::new();
    let mut cur = node.clone();
    loop {
        names.push(cur.borrow().name.clone());
        let parent = cur.borrow().parent.upgrade();
        match parent {
            Some(p) if !p.borrow().kind.is_table() => cur = p,
            _ => break,
        }
    }
    names.reverse();
    names
}

pub(crate) fn path_name(node: &NodeRef, sep: &str) -> String {
    path_segments(node).join(sep)
}

// ── Item handle ───────────────────────────────────────────────────────────────

/// A handle to any node in a column hierarchy.
#[derive(Clone)]
pub struct Item {
    pub(crate) node: NodeRef,
}

impl Item {
    /// The item's name.
    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    /// The parent group, or `None` for detached items and tables.
    pub fn parent(&self) -> Option<Group> {
        self.node
            .borrow()
            .parent
            .upgrade()
            .map(|node| Group { node })
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.node.borrow().index
    }

    /// The table that owns this item, if any.  Tables own themselves.
    pub fn table(&self) -> Option<Table> {
        owning_table(&self.node).map(|node| Table { node })
    }

    /// Join the names of all ancestors strictly below the owning table with
    /// this item's name.  For items not owned by a table the root group is
    /// included.
    pub fn path_name(&self, sep: &str) -> String {
        path_name(&self.node, sep)
    }

    /// Visit this item and all live descendants in pre-order.
    pub fn visit(&self, mut f: impl FnMut(&Item)) {
        visit_nodes(&self.node, &mut |node| {
            f(&Item { node: node.clone() });
        });
    }

    pub fn is_column(&self) -> bool {
        self.node.borrow().kind.is_column()
    }

    /// True for plain groups (not tables).
    pub fn is_group(&self) -> bool {
        matches!(self.node.borrow().kind, NodeKind::Group(_))
    }

    pub fn is_table(&self) -> bool {
        self.node.borrow().kind.is_table()
    }

    /// Downcast to a column handle.
    pub fn as_column(&self) -> Option<Column> {
        self.is_column().then(|| Column {
            node: self.node.clone(),
        })
    }

    /// Downcast to a group handle.
    pub fn as_group(&self) -> Option<Group> {
        self.is_group().then(|| Group {
            node: self.node.clone(),
        })
    }

    /// Downcast to a table handle.
    pub fn as_table(&self) -> Option<Table> {
        self.is_table().then(|| Table {
            node: self.node.clone(),
        })
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Item {}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.node.borrow();
        let kind = match b.kind {
            NodeKind::Group(_) => "group",
            NodeKind::Table(..) => "table",
            NodeKind::Column(_) => "column",
        };
        write!(f, "Item({kind} `{}`)", b.name)
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

/// Anything that can stand in for an [`Item`] in structural operations.
pub trait AsItem {
    /// A generic handle to the same underlying node.
    fn to_item(&self) -> Item;
}

impl AsItem for Item {
    fn to_item(&self) -> Item {
        self.clone()
    }
}

impl AsItem for Group {
    fn to_item(&self) -> Item {
        Item {
            node: self.node.clone(),
        }
    }
}

impl AsItem for Column {
    fn to_item(&self) -> Item {
        Item {
            node: self.node.clone(),
        }
    }
}

impl AsItem for Table {
    fn to_item(&self) -> Item {
        Item {
            node: self.node.clone(),
        }
    }
}

// ── Group operations ──────────────────────────────────────────────────────────

/// Structural operations shared by [`Group`] and [`Table`].
pub trait GroupOps: AsItem {
    /// Add an item as the last child of this group.
    ///
    /// Fails if the item already has a parent, a live sibling has the same
    /// name, the item is a table, or the owning table is locked.
    fn add(&self, item: &impl AsItem) -> TableResult<()> {
        add_item(&self.to_item().node, &item.to_item().node)
    }

    /// Add several items in order.
    fn add_all(&self, items: &[&dyn AsItem]) -> TableResult<()> {
        for item in items {
            self.add(&item.to_item())?;
        }
        Ok(())
    }

    /// Detach an item from this group, leaving a tombstone that the next
    /// cleanup compacts away.
    fn remove(&self, item: &impl AsItem) -> TableResult<()> {
        remove_item(&self.to_item().node, &item.to_item().node)
    }

    /// Detach several items.
    fn remove_all(&self, items: &[&dyn AsItem]) -> TableResult<()> {
        for item in items {
            self.remove(&item.to_item())?;
        }
        Ok(())
    }

    /// Look up an item by a `/`-separated path of names.
    fn get_item(&self, path: &str) -> TableResult<Item> {
        resolve(&self.to_item().node, path).map(|node| Item { node })
    }

    /// The live children of this group, in order.  Forces a cleanup.
    fn items(&self) -> Vec<Item> {
        let node = self.to_item().node;
        cleanup(&node);
        let b = node.borrow();
        match b.kind.group_body() {
            Some(body) => body
                .children
                .iter()
                .flatten()
                .map(|node| Item { node: node.clone() })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Visit this group and all live descendants in pre-order.
    fn visit(&self, f: impl FnMut(&Item)) {
        self.to_item().visit(f)
    }
}

// ── Group handle ──────────────────────────────────────────────────────────────

/// An ordered, named container of column items.
#[derive(Clone)]
pub struct Group {
    pub(crate) node: NodeRef,
}

impl Group {
    /// Create a detached group.
    pub fn new(name: &str) -> TableResult<Group> {
        new_node(name, NodeKind::Group(GroupBody::default())).map(|node| Group { node })
    }

    /// Create a group and attach it to `parent`.
    pub fn new_in(parent: &impl GroupOps, name: &str) -> TableResult<Group> {
        let group = Group::new(name)?;
        parent.add(&group)?;
        Ok(group)
    }

    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    pub fn parent(&self) -> Option<Group> {
        self.to_item().parent()
    }

    /// The table that owns this group, if any.
    pub fn table(&self) -> Option<Table> {
        self.to_item().table()
    }

    pub fn path_name(&self, sep: &str) -> String {
        path_name(&self.node, sep)
    }
}

impl GroupOps for Group {}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Group {}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group(`{}`)", self.name())
    }
}
