//! Schema Registry Types
//!
//! Node schemas declare which properties of a node type hold *owned children*
//! (single id or ordered collection of ids) and whether the type is an inline
//! annotation anchored by a range rather than by containment.
//!
//! ## Example Schema
//!
//! ```json
//! {
//!   "nodeType": "list",
//!   "kind": { "type": "block" },
//!   "childProperties": [
//!     { "name": "items", "cardinality": "collection" },
//!     { "name": "caption", "cardinality": "single" }
//!   ]
//! }
//! ```
//!
//! Annotation types use `{ "type": "annotation", "startProperty": "start" }`;
//! the range start holds `path = [anchor_id, annotated_property]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default name of the range-start property on annotation nodes
pub const DEFAULT_START_PROPERTY: &str = "start";

/// Sub-key of the range start that holds the anchoring path
pub const RANGE_PATH_KEY: &str = "path";

fn default_start_property() -> String {
    DEFAULT_START_PROPERTY.to_string()
}

/// Whether an owned-child property holds one id or an ordered list of ids
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCardinality {
    Single,
    Collection,
}

impl PropertyCardinality {
    pub fn is_collection(self) -> bool {
        matches!(self, PropertyCardinality::Collection)
    }
}

/// Declaration of an owned-child property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChildProperty {
    pub name: String,
    pub cardinality: PropertyCardinality,
}

/// Structural role of a node type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// Regular node, attached to its parent through an owned-child property
    Block,

    /// Inline annotation, attached to the node named by its range start path
    #[serde(rename_all = "camelCase")]
    Annotation {
        #[serde(default = "default_start_property")]
        start_property: String,
    },
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Block
    }
}

/// Schema for one node type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    pub node_type: String,

    #[serde(default)]
    pub kind: NodeKind,

    #[serde(default)]
    pub child_properties: Vec<ChildProperty>,
}

impl NodeSchema {
    /// Block schema without child properties
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            kind: NodeKind::Block,
            child_properties: Vec::new(),
        }
    }

    /// Annotation schema using the default `start` range property
    pub fn annotation(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            kind: NodeKind::Annotation {
                start_property: default_start_property(),
            },
            child_properties: Vec::new(),
        }
    }

    /// Declare a single-valued owned-child property
    pub fn with_child(self, name: impl Into<String>) -> Self {
        self.with_property(name, PropertyCardinality::Single)
    }

    /// Declare a collection-valued owned-child property
    pub fn with_children(self, name: impl Into<String>) -> Self {
        self.with_property(name, PropertyCardinality::Collection)
    }

    fn with_property(mut self, name: impl Into<String>, cardinality: PropertyCardinality) -> Self {
        self.child_properties.push(ChildProperty {
            name: name.into(),
            cardinality,
        });
        self
    }

    pub fn has_child_properties(&self) -> bool {
        !self.child_properties.is_empty()
    }

    /// Get the owned-child declaration for a property
    pub fn child_property(&self, name: &str) -> Option<&ChildProperty> {
        self.child_properties.iter().find(|p| p.name == name)
    }

    pub fn is_owned(&self, name: &str) -> bool {
        self.child_property(name).is_some()
    }

    pub fn is_annotation(&self) -> bool {
        matches!(self.kind, NodeKind::Annotation { .. })
    }

    /// Name of the range-start property for annotation types
    pub fn start_property(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Annotation { start_property } => Some(start_property),
            NodeKind::Block => None,
        }
    }
}

/// Registry of node schemas keyed by node type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: HashMap<String, NodeSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load schemas from a JSON array of schema objects
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let schemas: Vec<NodeSchema> = serde_json::from_value(value)?;
        Ok(schemas.into_iter().collect())
    }

    /// Register a schema, returning any schema it replaced
    pub fn register(&mut self, schema: NodeSchema) -> Option<NodeSchema> {
        self.schemas.insert(schema.node_type.clone(), schema)
    }

    /// Builder-style registration
    pub fn with(mut self, schema: NodeSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, node_type: &str) -> Option<&NodeSchema> {
        self.schemas.get(node_type)
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.schemas.contains_key(node_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<NodeSchema> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = NodeSchema>>(iter: I) -> Self {
        let mut registry = SchemaRegistry::new();
        for schema in iter {
            registry.register(schema);
        }
        registry
    }
}
