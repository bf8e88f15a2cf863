//! The process-wide table name registry.
//!
//! Every live table has a unique name; creating a second table with the
//! name of a live one fails.  The registry holds weak references only, so a
//! table dies with its last handle and its name becomes reusable — dead
//! entries are pruned lazily.
//!
//! Because the node graph is `Rc`-based the registry is thread-local, which
//! under the library's single-threaded contract *is* the process-wide
//! registry.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{TableError, TableResult};
use crate::item::NodeWeak;
use crate::Table;

thread_local! {
    static REGISTRY: RefCell<HashMap<String, NodeWeak>> = RefCell::new(HashMap::new());
}

/// Claim `name` for a new table.  Fails while a live table holds it.
pub(crate) fn register(name: &str, node: NodeWeak) -> TableResult<()> {
    REGISTRY.with(|registry| {
        let mut map = registry.borrow_mut();
        map.retain(|_, weak| weak.strong_count() > 0);
        if map.contains_key(name) {
            return Err(TableError::DuplicateTable(name.to_string()));
        }
        map.insert(name.to_string(), node);
        Ok(())
    })
}

/// Look up a live table by name.
pub fn get(name: &str) -> Option<Table> {
    REGISTRY.with(|registry| {
        registry
            .borrow()
            .get(name)
            .and_then(|weak| weak.upgrade())
            .map(|node| Table { node })
    })
}

/// All live tables, in no particular order.
pub fn all() -> Vec<Table> {
    REGISTRY.with(|registry| {
        let mut map = registry.borrow_mut();
        map.retain(|_, weak| weak.strong_count() > 0);
        map.values()
            .filter_map(|weak| weak.upgrade())
            .map(|node| Table { node })
            .collect()
    })
}
