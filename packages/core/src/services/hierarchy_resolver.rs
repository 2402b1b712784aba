//! Hierarchy Resolver
//!
//! Keeps the derived parent links of the flat node table consistent with the
//! stream of committed operations. The store only holds ids; this observer
//! turns them into back-references:
//!
//! - `parent`: id of the node owning this one
//! - `property`: the owned-child property (or annotated property) it hangs under
//! - `position`: its index when that property is a collection
//!
//! # Dispatch
//!
//! - **create**: attach every id referenced by the node's owned-child
//!   properties, reindex collections, apply a pending entry keyed by the new
//!   node, anchor it if it is an annotation not contained by an owned
//!   property, and resolve annotations that were waiting for it as their
//!   anchor.
//! - **update** (array insert/delete on an owned property): attach inserted
//!   ids, detach removed ids, reindex.
//! - **set** (whole-value replacement): detach every old id, attach every new
//!   id, reindex collections; re-anchor annotations when the range start path
//!   changes.
//! - **delete**: only pending entries are touched. Links of other nodes are
//!   left to the operations that stop referencing the deleted id.
//!
//! References to ids that are not in the store yet are never errors. They are
//! recorded in the [`PendingParentRegistry`] and resolved when the node shows
//! up.

use crate::db::{NodeTable, OperationObserver};
use crate::models::schema::RANGE_PATH_KEY;
use crate::models::{ids_of, ChildProperty, Node, NodeSchema, ParentLink, PropertyCardinality, SchemaRegistry};
use crate::operations::{Operation, OperationPath, PropertyDiff};
use crate::services::position_indexer::{position_in, reindex};
use crate::services::{HierarchyError, PendingParentRegistry};
use serde_json::Value;

/// Operation observer maintaining parent links, positions and annotation anchors
#[derive(Debug, Default)]
pub struct HierarchyResolver {
    pub(crate) pending: PendingParentRegistry,
}

impl HierarchyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver for a table that already holds nodes
    ///
    /// Every node is treated as freshly created, in id order, which is the
    /// same situation as loading a document without dependency ordering.
    pub fn rebuild(nodes: &mut NodeTable, schemas: &SchemaRegistry) -> Self {
        let mut resolver = Self::new();
        let mut ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
        ids.sort();
        for id in &ids {
            if let Some(node) = nodes.get_mut(id) {
                node.set_parent_link(ParentLink::detached());
            }
        }
        for id in &ids {
            resolver.on_create(id, nodes, schemas);
        }
        resolver
    }

    /// Entries waiting for a node that has not been created yet
    pub fn pending_parents(&self) -> &PendingParentRegistry {
        &self.pending
    }

    /// Fail if pending parent entries are left over
    pub fn finalize(&self) -> Result<(), HierarchyError> {
        self.pending.finalize()
    }

    fn on_create(&mut self, node_id: &str, nodes: &mut NodeTable, schemas: &SchemaRegistry) {
        let Some(node) = nodes.get(node_id) else {
            return;
        };
        let schema = schemas.get(&node.node_type);
        let references: Vec<(&ChildProperty, Vec<String>)> = schema
            .map(|schema| {
                schema
                    .child_properties
                    .iter()
                    .map(|prop| (prop, node.referenced_ids(&prop.name)))
                    .collect()
            })
            .unwrap_or_default();

        for (prop, ids) in references {
            for child_id in &ids {
                self.attach(nodes, child_id, node_id, &prop.name, prop.cardinality);
            }
            if prop.cardinality.is_collection() {
                reindex(nodes, node_id, &prop.name);
            }
        }

        // Containment by an owned property takes precedence over a range anchor.
        let contained = self.apply_registered_parent(nodes, node_id);
        if !contained {
            if let Some(start_property) = schema.and_then(NodeSchema::start_property) {
                self.resolve_anchor(nodes, node_id, start_property);
            }
        }

        self.resolve_waiting_annotations(nodes, node_id);
    }

    fn on_update(
        &mut self,
        path: &OperationPath,
        diff: &PropertyDiff,
        nodes: &mut NodeTable,
        schemas: &SchemaRegistry,
    ) {
        let node_id = path.node_id();
        let Some(property) = path.property_name() else {
            return;
        };
        let Some(schema) = schema_of(nodes, schemas, node_id) else {
            return;
        };

        let owned = schema
            .child_property(property)
            .filter(|_| path.sub_path().is_empty());
        if let (PropertyDiff::Array(diff), Some(prop)) = (diff, owned) {
            for child_id in ids_of(diff.value()) {
                if diff.is_delete() {
                    self.detach(nodes, &child_id, node_id, property);
                } else {
                    self.attach(nodes, &child_id, node_id, property, prop.cardinality);
                }
            }
            if prop.cardinality.is_collection() {
                reindex(nodes, node_id, property);
            }
        }

        if let Some(start_property) = anchor_touched_by(schema, path) {
            self.resolve_anchor(nodes, node_id, start_property);
        }
    }

    fn on_set(
        &mut self,
        path: &OperationPath,
        old_value: &Value,
        new_value: &Value,
        nodes: &mut NodeTable,
        schemas: &SchemaRegistry,
    ) {
        let node_id = path.node_id();
        let Some(property) = path.property_name() else {
            return;
        };
        let Some(schema) = schema_of(nodes, schemas, node_id) else {
            return;
        };

        if path.sub_path().is_empty() {
            if let Some(prop) = schema.child_property(property) {
                for child_id in ids_of(old_value) {
                    self.detach(nodes, &child_id, node_id, property);
                }
                for child_id in ids_of(new_value) {
                    self.attach(nodes, &child_id, node_id, property, prop.cardinality);
                }
                if prop.cardinality.is_collection() {
                    reindex(nodes, node_id, property);
                }
            }
        }

        if let Some(start_property) = anchor_touched_by(schema, path) {
            self.resolve_anchor(nodes, node_id, start_property);
        }
    }

    fn on_delete(&mut self, node: &Node, nodes: &NodeTable, schemas: &SchemaRegistry) {
        let schema = schemas.get(&node.node_type);

        // Missing children of the deleted node lose their only reference.
        if let Some(schema) = schema {
            for prop in &schema.child_properties {
                for child_id in node.referenced_ids(&prop.name) {
                    self.pending.clear_if_for(&child_id, &node.id, &prop.name);
                }
            }
            if schema.is_annotation() {
                self.pending.clear(&node.id);
            }
        }

        // A parent that still owns the deleted node gets it back on re-create.
        // Range anchors are not ownership and are recomputed from the record.
        let link = node.parent_link();
        let (Some(parent_id), Some(property)) = (link.parent.as_deref(), link.property.as_deref())
        else {
            return;
        };
        let Some(prop) =
            schema_of(nodes, schemas, parent_id).and_then(|schema| schema.child_property(property))
        else {
            return;
        };
        let still_referenced = nodes
            .get(parent_id)
            .is_some_and(|parent| parent.referenced_ids(property).contains(&node.id));
        if still_referenced {
            self.pending.set(&node.id, parent_id, property, prop.cardinality);
        }
    }

    /// Make `parent_id.property` the owner of `child_id`
    ///
    /// Replaces the whole link, so any previous parent, property and position
    /// are cleared first. Collections are reindexed by the caller.
    fn attach(
        &mut self,
        nodes: &mut NodeTable,
        child_id: &str,
        parent_id: &str,
        property: &str,
        cardinality: PropertyCardinality,
    ) {
        match nodes.get_mut(child_id) {
            Some(child) => {
                if let Some(previous) = child.parent_id() {
                    if previous != parent_id || child.property() != Some(property) {
                        tracing::debug!(
                            "Moving '{}' from '{}' to '{}.{}'",
                            child_id,
                            previous,
                            parent_id,
                            property
                        );
                    }
                }
                child.set_parent_link(ParentLink::attached(parent_id, property, None));
                // An anchor still awaited by a now-contained annotation is void.
                self.pending.clear(child_id);
            }
            None => {
                self.pending.set(child_id, parent_id, property, cardinality);
            }
        }
    }

    /// Drop the link from `child_id` to `parent_id.property`
    ///
    /// A child already owned elsewhere keeps its link. For a missing child
    /// the matching pending entry is cleared.
    fn detach(&mut self, nodes: &mut NodeTable, child_id: &str, parent_id: &str, property: &str) {
        match nodes.get_mut(child_id) {
            Some(child) => {
                let link = child.parent_link();
                if link.parent.as_deref() == Some(parent_id)
                    && link.property.as_deref() == Some(property)
                {
                    child.set_parent_link(ParentLink::detached());
                    tracing::debug!("Detached '{}' from '{}.{}'", child_id, parent_id, property);
                }
            }
            None => {
                self.pending.clear_if_for(child_id, parent_id, property);
            }
        }
    }

    /// Apply and remove the pending entry recorded for a just-created node
    ///
    /// Returns whether the node was attached.
    fn apply_registered_parent(&mut self, nodes: &mut NodeTable, node_id: &str) -> bool {
        let Some(entry) = self.pending.consume(node_id) else {
            return false;
        };
        let position = if entry.is_collection() {
            position_in(nodes, &entry.parent_id, &entry.property, node_id)
        } else {
            None
        };

        if let Some(node) = nodes.get_mut(node_id) {
            tracing::debug!(
                "Resolved pending parent of '{}' to '{}.{}'",
                node_id,
                entry.parent_id,
                entry.property
            );
            node.set_parent_link(ParentLink::attached(entry.parent_id, entry.property, position));
            return true;
        }
        false
    }
}

impl OperationObserver for HierarchyResolver {
    fn on_operation_applied(
        &mut self,
        op: &Operation,
        nodes: &mut NodeTable,
        schemas: &SchemaRegistry,
    ) {
        match op {
            Operation::Create { node } => self.on_create(&node.id, nodes, schemas),
            Operation::Delete { node } => self.on_delete(node, nodes, schemas),
            Operation::Set {
                path,
                old_value,
                new_value,
            } => self.on_set(path, old_value, new_value, nodes, schemas),
            Operation::Update { path, diff } => self.on_update(path, diff, nodes, schemas),
        }
    }
}

fn schema_of<'a>(nodes: &NodeTable, schemas: &'a SchemaRegistry, id: &str) -> Option<&'a NodeSchema> {
    schemas.get(&nodes.get(id)?.node_type)
}

/// Range-start property of an annotation if `path` changes its anchoring segment
fn anchor_touched_by<'a>(schema: &'a NodeSchema, path: &OperationPath) -> Option<&'a str> {
    let start_property = schema.start_property()?;
    if path.property_name() != Some(start_property) {
        return None;
    }
    match path.sub_path().first() {
        None => Some(start_property),
        Some(key) if key == RANGE_PATH_KEY => Some(start_property),
        Some(_) => None,
    }
}

// Scenario tests in a separate module
#[cfg(test)]
#[path = "hierarchy_resolver_test.rs"]
mod hierarchy_resolver_test;
