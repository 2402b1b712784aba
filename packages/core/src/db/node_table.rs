//! Flat node table
//!
//! Id-indexed storage for node records. This is the only place nodes live;
//! everything hierarchical is expressed by ids inside node properties.

use crate::models::Node;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: HashMap<String, Node>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access for the store and the hierarchy layer
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Resolve `[node_id, key, key...]` to a value
    ///
    /// A single-segment path has no value (it names a node, not a property).
    pub fn get_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (id, keys) = path.split_first()?;
        if keys.is_empty() {
            return None;
        }
        self.get(id.as_ref())?.get_path(keys)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}
