//! Position Indexer
//!
//! Recomputes the ordinal position of every member of an ordered child
//! collection. Ids that do not resolve to a stored node are skipped; their
//! position is fixed when they are created and consume their pending entry.
//!
//! Reindexing is idempotent: running it twice without an intervening change
//! produces the same positions.

use crate::db::NodeTable;
use crate::models::ids_of;

/// Set `position` of each member of `parent_id.property` that is linked to
/// it to its zero-based index in the collection
///
/// Returns the number of members whose position was written.
pub fn reindex(nodes: &mut NodeTable, parent_id: &str, property: &str) -> usize {
    let ids = match nodes.get_value(&[parent_id, property]) {
        Some(value) => ids_of(value),
        None => return 0,
    };

    let mut updated = 0;
    for (pos, id) in ids.iter().enumerate() {
        let Some(child) = nodes.get_mut(id) else {
            continue;
        };
        if child.parent_id() == Some(parent_id) && child.property() == Some(property) {
            child.set_position(Some(pos));
            updated += 1;
        }
    }

    tracing::trace!(
        "Reindexed {}/{} members of '{}.{}'",
        updated,
        ids.len(),
        parent_id,
        property
    );
    updated
}

/// Index of `child_id` in the collection `parent_id.property`
pub fn position_in(nodes: &NodeTable, parent_id: &str, property: &str, child_id: &str) -> Option<usize> {
    nodes
        .get_value(&[parent_id, property])?
        .as_array()?
        .iter()
        .position(|item| item.as_str() == Some(child_id))
}
