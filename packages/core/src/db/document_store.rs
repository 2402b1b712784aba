//! Document Store
//!
//! `DocumentStore` owns the flat node table and is the single entry point for
//! mutations. Every change is expressed as one of four primitive operations
//! (create, delete, set, update) and goes through [`DocumentStore::apply`].
//!
//! # Architecture
//!
//! - **Commit**: the operation is validated against the table and written. A
//!   rejected operation changes nothing.
//! - **Hierarchy**: when enabled, the [`HierarchyResolver`] observes the
//!   committed operation and updates parent links, positions and annotation
//!   anchors before anything else sees the result.
//! - **Observers**: registered [`OperationObserver`]s run in registration order.
//! - **Events**: a [`DomainEvent`] is broadcast last, carrying a snapshot of the
//!   node as it is after all observers ran.
//!
//! The store itself is synchronous. Subscribers poll the broadcast channel from
//! whatever runtime they live in.

use crate::db::{DomainEvent, NodeTable, OperationObserver, StoreError};
use crate::models::{Node, SchemaRegistry, XPathSegment};
use crate::operations::{ArrayDiff, Operation, OperationError, OperationPath, PropertyDiff, TextDiff};
use crate::services::{HierarchyConfig, HierarchyError, HierarchyResolver, PendingParentRegistry};
use anyhow::Context;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Serialized document layout used by [`DocumentStore::from_json`]
#[derive(Debug, Deserialize)]
struct DocumentSnapshot {
    #[serde(default)]
    nodes: Vec<Node>,
}

pub struct DocumentStore {
    nodes: NodeTable,
    schemas: SchemaRegistry,
    hierarchy: Option<HierarchyResolver>,
    observers: Vec<Box<dyn OperationObserver>>,
    /// Broadcast channel for domain events
    event_tx: broadcast::Sender<DomainEvent>,
    config: HierarchyConfig,
}

impl DocumentStore {
    /// Create a store without hierarchy tracking
    ///
    /// Parent links stay detached until [`enable_hierarchy`](Self::enable_hierarchy)
    /// is called.
    pub fn new(schemas: SchemaRegistry) -> Self {
        Self::build(schemas, HierarchyConfig::default(), false)
    }

    /// Create a store with the hierarchy resolver installed
    pub fn with_hierarchy(schemas: SchemaRegistry) -> Self {
        Self::build(schemas, HierarchyConfig::default(), true)
    }

    /// Create a store with the hierarchy resolver and explicit configuration
    pub fn with_config(schemas: SchemaRegistry, config: HierarchyConfig) -> Self {
        Self::build(schemas, config, true)
    }

    fn build(schemas: SchemaRegistry, config: HierarchyConfig, hierarchy: bool) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            nodes: NodeTable::new(),
            schemas,
            hierarchy: hierarchy.then(HierarchyResolver::new),
            observers: Vec::new(),
            event_tx,
            config,
        }
    }

    /// Install the hierarchy resolver on a store that already holds nodes
    ///
    /// Links are rebuilt from scratch. Does nothing if already enabled.
    pub fn enable_hierarchy(&mut self) {
        if self.hierarchy.is_none() {
            tracing::debug!("Rebuilding hierarchy for {} nodes", self.nodes.len());
            self.hierarchy = Some(HierarchyResolver::rebuild(&mut self.nodes, &self.schemas));
        }
    }

    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Register an observer called after every committed operation
    pub fn register_observer(&mut self, observer: impl OperationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Subscribe to domain events
    ///
    /// Returns a receiver that gets every event emitted after this call.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a domain event to all subscribers
    ///
    /// Ignores send errors (no active subscribers is fine).
    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Resolve `[node_id, property, ...]` to a stored value
    pub fn get_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        self.nodes.get_value(path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Apply a primitive operation
    ///
    /// Returns the committed operation. For `Delete` it carries the removed
    /// record, including its last parent link, so it can be inverted.
    pub fn apply(&mut self, op: Operation) -> Result<Operation, StoreError> {
        let op = self.commit(op)?;
        tracing::trace!("Committed {:?} at {}", op.kind(), op.path());

        if let Some(hierarchy) = self.hierarchy.as_mut() {
            hierarchy.on_operation_applied(&op, &mut self.nodes, &self.schemas);
        }
        for observer in self.observers.iter_mut() {
            observer.on_operation_applied(&op, &mut self.nodes, &self.schemas);
        }

        if let Some(event) = self.event_for(&op) {
            self.emit_event(event);
        }
        Ok(op)
    }

    fn commit(&mut self, op: Operation) -> Result<Operation, StoreError> {
        match op {
            Operation::Create { node } => {
                node.validate()?;
                if !self.schemas.contains(&node.node_type) {
                    return Err(StoreError::unknown_node_type(&node.node_type));
                }
                if self.nodes.contains(&node.id) {
                    return Err(StoreError::node_already_exists(&node.id));
                }
                let mut stored = node.clone();
                stored.set_parent_link(Default::default());
                self.nodes.insert(stored);
                Ok(Operation::Create { node })
            }
            Operation::Delete { node } => {
                let removed = self
                    .nodes
                    .remove(&node.id)
                    .ok_or_else(|| StoreError::node_not_found(&node.id))?;
                Ok(Operation::Delete { node: removed })
            }
            Operation::Set {
                path,
                old_value,
                new_value,
            } => {
                let node = property_target(&mut self.nodes, &path)?;
                let current = node
                    .get_path(path.value_path())
                    .cloned()
                    .unwrap_or(Value::Null);
                if current != old_value {
                    return Err(StoreError::value_mismatch(&path, old_value, current));
                }
                node.set_path(path.value_path(), new_value.clone())
                    .map_err(|e| StoreError::invalid_path(&path, e.to_string()))?;
                node.touch();
                Ok(Operation::Set {
                    path,
                    old_value,
                    new_value,
                })
            }
            Operation::Update { path, diff } => {
                let node = property_target(&mut self.nodes, &path)?;
                let target = node
                    .get_path_mut(path.value_path())
                    .ok_or_else(|| StoreError::invalid_path(&path, "no value at path"))?;
                diff.apply(target)?;
                node.touch();
                Ok(Operation::Update { path, diff })
            }
        }
    }

    fn event_for(&self, op: &Operation) -> Option<DomainEvent> {
        match op {
            Operation::Delete { node } => Some(DomainEvent::NodeDeleted {
                id: node.id.clone(),
            }),
            Operation::Create { node } => self.get(&node.id).cloned().map(DomainEvent::NodeCreated),
            Operation::Set { .. } | Operation::Update { .. } => {
                self.get(op.node_id()).cloned().map(DomainEvent::NodeUpdated)
            }
        }
    }

    /// Create a node, returning its id
    pub fn create(&mut self, node: Node) -> Result<String, StoreError> {
        let id = node.id.clone();
        self.apply(Operation::create(node))?;
        Ok(id)
    }

    /// Delete a node, returning the removed record
    ///
    /// References to the id held by other nodes are left alone.
    pub fn delete(&mut self, id: &str) -> Result<Node, StoreError> {
        let node = self
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::node_not_found(id))?;
        self.apply(Operation::delete(node.clone()))?;
        Ok(node)
    }

    /// Replace the value at `path`, returning the previous value
    ///
    /// A missing value is treated as `null`; setting `null` removes the key.
    pub fn set(&mut self, path: OperationPath, value: Value) -> Result<Value, StoreError> {
        let old_value = self
            .get_value(path.segments())
            .cloned()
            .unwrap_or(Value::Null);
        self.apply(Operation::set(path, old_value.clone(), value))?;
        Ok(old_value)
    }

    pub fn set_property(
        &mut self,
        id: &str,
        property: &str,
        value: Value,
    ) -> Result<Value, StoreError> {
        self.set(OperationPath::property(id, property), value)
    }

    /// Insert `value` into the array property `id.property` at `pos`
    pub fn insert_at(
        &mut self,
        id: &str,
        property: &str,
        pos: usize,
        value: impl Into<Value>,
    ) -> Result<(), StoreError> {
        let diff = PropertyDiff::Array(ArrayDiff::insert(pos, value));
        self.apply(Operation::update(OperationPath::property(id, property), diff))?;
        Ok(())
    }

    /// Remove the element at `pos` from the array property `id.property`
    pub fn remove_at(&mut self, id: &str, property: &str, pos: usize) -> Result<Value, StoreError> {
        let path = OperationPath::property(id, property);
        if !self.contains(id) {
            return Err(StoreError::node_not_found(id));
        }
        let items = self
            .get_value(path.segments())
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::invalid_path(&path, "not an array"))?;
        let value = items
            .get(pos)
            .cloned()
            .ok_or_else(|| OperationError::out_of_bounds(pos, items.len()))?;

        self.apply(Operation::update(
            path,
            PropertyDiff::Array(ArrayDiff::delete(pos, value.clone())),
        ))?;
        Ok(value)
    }

    /// Apply a text diff to the string property `id.property`
    pub fn update_text(&mut self, id: &str, property: &str, diff: TextDiff) -> Result<(), StoreError> {
        self.apply(Operation::update(
            OperationPath::property(id, property),
            PropertyDiff::Text(diff),
        ))?;
        Ok(())
    }

    /// Create `node` and insert its id into `parent_id.property` at `pos`
    ///
    /// A missing collection property is initialized to an empty array first.
    /// Bounds are checked before the node is created.
    pub fn insert_node(
        &mut self,
        parent_id: &str,
        property: &str,
        pos: usize,
        node: Node,
    ) -> Result<String, StoreError> {
        let path = OperationPath::property(parent_id, property);
        if !self.contains(parent_id) {
            return Err(StoreError::node_not_found(parent_id));
        }
        let len = match self.get_value(path.segments()) {
            Some(Value::Array(items)) => items.len(),
            Some(_) => return Err(StoreError::invalid_path(&path, "not an array")),
            None => 0,
        };
        if pos > len {
            return Err(OperationError::out_of_bounds(pos, len).into());
        }

        let id = self.create(node)?;
        if len == 0 && self.get_value(path.segments()).is_none() {
            self.set(path, json!([]))?;
        }
        self.insert_at(parent_id, property, pos, id.clone())?;
        Ok(id)
    }

    /// Remove `child_id` from `parent_id.property` and delete it
    ///
    /// Fails without touching the collection if `child_id` is not stored.
    pub fn remove_node(
        &mut self,
        parent_id: &str,
        property: &str,
        child_id: &str,
    ) -> Result<Node, StoreError> {
        if !self.contains(child_id) {
            return Err(StoreError::node_not_found(child_id));
        }
        let path = OperationPath::property(parent_id, property);
        let pos = self
            .get_value(path.segments())
            .and_then(Value::as_array)
            .and_then(|items| items.iter().position(|item| item.as_str() == Some(child_id)))
            .ok_or_else(|| {
                StoreError::invalid_path(&path, format!("'{}' is not a member", child_id))
            })?;

        self.remove_at(parent_id, property, pos)?;
        self.delete(child_id)
    }

    /// The structural parent of a node
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.get(id)?.parent_id().and_then(|parent| self.get(parent))
    }

    /// Stored members of the collection or single-valued child property
    pub fn children(&self, id: &str, property: &str) -> Vec<&Node> {
        self.get(id)
            .map(|node| node.referenced_ids(property))
            .unwrap_or_default()
            .iter()
            .filter_map(|child_id| self.get(child_id))
            .collect()
    }

    /// Chain of segments from the root down to `id`
    ///
    /// Empty if the node does not exist. Stops at a repeated id if the links
    /// ever form a cycle.
    pub fn xpath(&self, id: &str) -> Vec<XPathSegment> {
        let mut segments = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(id);

        while let Some(node) = current {
            if !visited.insert(node.id.as_str()) {
                tracing::warn!("Cycle in parent links at '{}'", node.id);
                break;
            }
            segments.push(XPathSegment {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                property: node.property().map(str::to_string),
                position: node.position(),
            });
            current = node.parent_id().and_then(|parent| self.get(parent));
        }

        segments.reverse();
        segments
    }

    /// Pending parent entries, if hierarchy tracking is enabled
    pub fn pending_parents(&self) -> Option<&PendingParentRegistry> {
        self.hierarchy.as_ref().map(HierarchyResolver::pending_parents)
    }

    /// Fail if references to never-created nodes are left over
    ///
    /// Always succeeds without hierarchy tracking.
    pub fn finalize(&self) -> Result<(), HierarchyError> {
        match &self.hierarchy {
            Some(hierarchy) => hierarchy.finalize(),
            None => Ok(()),
        }
    }

    /// Create nodes in the given order, which need not be dependency order
    ///
    /// Returns the number of nodes created. Stops at the first rejected node.
    pub fn load(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<usize, StoreError> {
        let mut created = 0;
        for node in nodes {
            self.create(node)?;
            created += 1;
        }

        if self.config.warn_on_dangling {
            if let Err(e) = self.finalize() {
                tracing::warn!("Document loaded with unresolved references: {}", e);
            }
        }
        tracing::debug!("Loaded {} nodes", created);
        Ok(created)
    }

    /// Build a hierarchy-tracking store from `{ "nodes": [...] }`
    pub fn from_json(schemas: SchemaRegistry, document: Value) -> anyhow::Result<Self> {
        let snapshot: DocumentSnapshot =
            serde_json::from_value(document).context("Invalid document JSON")?;
        let mut store = Self::with_hierarchy(schemas);
        store
            .load(snapshot.nodes)
            .context("Failed to load document nodes")?;
        Ok(store)
    }

    /// Serialize to `{ "nodes": [...] }`, nodes sorted by id
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(json!({ "nodes": serde_json::to_value(nodes)? }))
    }
}

/// Node addressed by a property path
fn property_target<'a>(
    nodes: &'a mut NodeTable,
    path: &OperationPath,
) -> Result<&'a mut Node, StoreError> {
    if path.property_name().is_none() {
        return Err(StoreError::invalid_path(path, "path must name a property"));
    }
    nodes
        .get_mut(path.node_id())
        .ok_or_else(|| StoreError::node_not_found(path.node_id()))
}
