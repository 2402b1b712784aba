//! Pending Parent Registry
//!
//! Holds provisional parent assignments for references that cannot be
//! resolved yet. This happens whenever nodes are created out of dependency
//! order, e.g. when a document is deserialized from a source that does not
//! sort parents after their children.
//!
//! Two kinds of entries exist:
//!
//! - **Child**: a parent references an id that is not in the store. Keyed by
//!   the missing child id and consumed when that child is created.
//! - **Anchor**: an annotation's range points at an anchor node that is not in
//!   the store. Keyed by the annotation id and taken when the anchor node is
//!   created.
//!
//! Entries are last-writer-wins and must not accumulate: every entry is either
//! consumed or explicitly cleared when the reference is retracted.

use crate::models::PropertyCardinality;
use crate::services::HierarchyError;
use std::collections::HashMap;

/// What a pending entry is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Waiting for the keyed child node to be created
    Child,
    /// Waiting for the parent (anchor) node to be created
    Anchor,
}

/// Provisional parent assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingParent {
    pub parent_id: String,
    pub property: String,
    pub cardinality: PropertyCardinality,
    pub kind: PendingKind,
}

impl PendingParent {
    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }

    /// Whether this entry was recorded for `parent_id.property`
    pub fn is_for(&self, parent_id: &str, property: &str) -> bool {
        self.parent_id == parent_id && self.property == property
    }
}

#[derive(Debug, Clone, Default)]
pub struct PendingParentRegistry {
    entries: HashMap<String, PendingParent>,
}

impl PendingParentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `parent_id.property` references the missing `child_id`
    ///
    /// Overwrites any previous entry for the same id.
    pub fn set(
        &mut self,
        child_id: &str,
        parent_id: &str,
        property: &str,
        cardinality: PropertyCardinality,
    ) -> Option<PendingParent> {
        self.insert(
            child_id,
            PendingParent {
                parent_id: parent_id.to_string(),
                property: property.to_string(),
                cardinality,
                kind: PendingKind::Child,
            },
        )
    }

    /// Record that annotation `annotation_id` is anchored to the missing `anchor_id`
    pub fn set_anchor(
        &mut self,
        annotation_id: &str,
        anchor_id: &str,
        property: &str,
    ) -> Option<PendingParent> {
        self.insert(
            annotation_id,
            PendingParent {
                parent_id: anchor_id.to_string(),
                property: property.to_string(),
                cardinality: PropertyCardinality::Single,
                kind: PendingKind::Anchor,
            },
        )
    }

    fn insert(&mut self, id: &str, entry: PendingParent) -> Option<PendingParent> {
        tracing::debug!(
            "Deferring parent of '{}' to '{}.{}' ({:?})",
            id,
            entry.parent_id,
            entry.property,
            entry.kind
        );
        self.entries.insert(id.to_string(), entry)
    }

    /// Remove and return the child entry for a node that was just created
    ///
    /// Anchor entries are left in place; they are resolved by the creation of
    /// their anchor node, not of the annotation.
    pub fn consume(&mut self, child_id: &str) -> Option<PendingParent> {
        let is_child = self
            .entries
            .get(child_id)
            .is_some_and(|entry| entry.kind == PendingKind::Child);
        if is_child {
            self.entries.remove(child_id)
        } else {
            None
        }
    }

    /// Remove an entry without applying it
    pub fn clear(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Remove the entry for `id` only if it was recorded for `parent_id.property`
    pub fn clear_if_for(&mut self, id: &str, parent_id: &str, property: &str) -> bool {
        let matches = self
            .entries
            .get(id)
            .is_some_and(|entry| entry.is_for(parent_id, property));
        matches && self.clear(id)
    }

    /// Remove and return every anchor entry waiting for `parent_id`
    ///
    /// Returned in id order.
    pub fn take_awaiting_parent(&mut self, parent_id: &str) -> Vec<(String, PendingParent)> {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.kind == PendingKind::Anchor && entry.parent_id == parent_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();

        ids.into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&PendingParent> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids with pending entries, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail if any entry is left over
    pub fn finalize(&self) -> Result<(), HierarchyError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        Err(HierarchyError::dangling_pending_parents(
            self.ids().into_iter().map(str::to_string).collect(),
        ))
    }
}
