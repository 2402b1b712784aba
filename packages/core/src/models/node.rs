//! Node Data Structures
//!
//! This module defines the `Node` record stored in the flat node table.
//!
//! # Architecture
//!
//! - **Flat Storage**: Nodes live in an id-indexed table; no node owns another
//! - **Pure JSON Properties**: All type-specific data is kept in `properties`
//! - **Ids as References**: Children are referenced by id from an owned-child
//!   property on the parent (see [`crate::models::schema`])
//! - **Derived Hierarchy**: The parent link is never stored or serialized; it is
//!   rebuilt by the hierarchy layer from the operation stream
//!
//! # Examples
//!
//! ```rust
//! use flatdoc_core::models::Node;
//! use serde_json::json;
//!
//! let list = Node::new_with_id(
//!     "list-1".to_string(),
//!     "list".to_string(),
//!     json!({ "items": ["item-1", "item-2"] }),
//! );
//!
//! assert_eq!(list.get("items").unwrap()[0], "item-1");
//! assert!(list.parent_id().is_none());
//! ```

use crate::models::xpath::ParentLink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Default version value for serde deserialization (version 1)
fn default_version() -> i64 {
    1
}

fn default_properties() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Validation errors for Node records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid node ID format: {0}")]
    InvalidId(String),

    #[error("Properties validation failed: {0}")]
    InvalidProperties(String),
}

/// A single record of the flat node table.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID unless provided by the caller)
/// - `node_type`: Type identifier resolved against the schema registry
/// - `properties`: JSON object holding every property of the node, including
///   owned-child references (`"items": ["a", "b"]`) and annotation ranges
/// - `version`: Incremented by the store on every mutation
/// - `created_at` / `modified_at`: Timestamps maintained by the store
///
/// The derived parent link is kept next to the record but is skipped by serde
/// and can only be written by the hierarchy layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Node type (e.g., "list", "list-item", "strong")
    #[serde(rename = "type")]
    pub node_type: String,

    /// All node properties (must be a JSON object)
    #[serde(default = "default_properties")]
    pub properties: Value,

    /// Incremented on each committed mutation
    #[serde(default = "default_version")]
    pub version: i64,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,

    /// Derived back-reference to the structural parent
    #[serde(skip)]
    xpath: ParentLink,
}

impl Node {
    /// Create a new Node with auto-generated UUID
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use flatdoc_core::models::Node;
    /// # use serde_json::json;
    /// let paragraph = Node::new("paragraph".to_string(), json!({ "content": "Hello" }));
    /// assert_eq!(paragraph.version, 1);
    /// ```
    pub fn new(node_type: String, properties: Value) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), node_type, properties)
    }

    /// Create a new Node with an explicit ID
    ///
    /// Used when ids are assigned by the caller, e.g. when a document is
    /// deserialized or when a parent already references the id.
    pub fn new_with_id(id: String, node_type: String, properties: Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            node_type,
            properties,
            version: 1,
            created_at: now,
            modified_at: now,
            xpath: ParentLink::default(),
        }
    }

    /// Validate the structural requirements of the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidId(self.id.clone()));
        }
        if self.node_type.trim().is_empty() {
            return Err(ValidationError::MissingField("type".to_string()));
        }
        if !self.properties.is_object() {
            return Err(ValidationError::InvalidProperties(format!(
                "properties of node '{}' must be a JSON object",
                self.id
            )));
        }
        Ok(())
    }

    /// Get a top-level property value
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Get a nested property value, e.g. `["start", "path"]`
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.properties, |value, key| value.get(key.as_ref()))
    }

    /// Mutable access to a nested property value
    pub(crate) fn get_path_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Value> {
        path.iter()
            .try_fold(&mut self.properties, |value, key| value.get_mut(key.as_ref()))
    }

    /// Write a nested property value, creating intermediate objects
    ///
    /// Writing `null` removes the key.
    pub(crate) fn set_path<S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: Value,
    ) -> Result<(), ValidationError> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| ValidationError::MissingField("property".to_string()))?;

        let mut target = &mut self.properties;
        for key in parents {
            let object = target.as_object_mut().ok_or_else(|| {
                ValidationError::InvalidProperties(format!(
                    "cannot descend into '{}': parent is not an object",
                    key.as_ref()
                ))
            })?;
            target = object
                .entry(key.as_ref().to_string())
                .or_insert_with(default_properties);
        }

        let object = target.as_object_mut().ok_or_else(|| {
            ValidationError::InvalidProperties(format!(
                "cannot set '{}': parent is not an object",
                last.as_ref()
            ))
        })?;
        if value.is_null() {
            object.remove(last.as_ref());
        } else {
            object.insert(last.as_ref().to_string(), value);
        }
        Ok(())
    }

    /// Ids held by a property, whether single-valued or a collection.
    ///
    /// Non-string entries are ignored.
    pub fn referenced_ids(&self, property: &str) -> Vec<String> {
        self.get(property).map(ids_of).unwrap_or_default()
    }

    /// The derived parent link
    pub fn parent_link(&self) -> &ParentLink {
        &self.xpath
    }

    /// Id of the structural parent, if attached
    pub fn parent_id(&self) -> Option<&str> {
        self.xpath.parent.as_deref()
    }

    /// Name of the parent property this node is attached under
    pub fn property(&self) -> Option<&str> {
        self.xpath.property.as_deref()
    }

    /// Position inside the parent's collection, if attached to one
    pub fn position(&self) -> Option<usize> {
        self.xpath.position
    }

    pub(crate) fn set_parent_link(&mut self, link: ParentLink) {
        self.xpath = link;
    }

    pub(crate) fn set_position(&mut self, position: Option<usize>) {
        self.xpath.position = position;
    }

    /// Bump version and modification time after a committed mutation
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.modified_at = Utc::now();
    }
}

/// Extract ids from a property value: a single string or an array of strings.
pub fn ids_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(id) => vec![id.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
