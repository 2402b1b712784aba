//! Primitive Operations
//!
//! Every change to the flat node table is expressed as one of four primitive
//! operations, mirroring the operation log used for transformation and merge:
//!
//! - `Create` - add a node record
//! - `Delete` - remove a node record (the inverse of `Create`)
//! - `Set` - replace a property value wholesale (scalar or collection)
//! - `Update` - edit a property in place (see [`diff`])
//!
//! Operations carry enough data to be inverted, so undo is just applying
//! [`Operation::invert`].

pub mod diff;
pub mod error;

pub use diff::{ArrayDiff, PropertyDiff, TextDiff};
pub use error::OperationError;

use crate::models::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of a primitive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Delete,
    Set,
    Update,
}

/// Path addressed by an operation: `[node_id, property, sub_path...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OperationPath(Vec<String>);

impl OperationPath {
    /// Path to a whole node
    pub fn node(id: impl Into<String>) -> Self {
        Self(vec![id.into()])
    }

    /// Path to a property of a node
    pub fn property(id: impl Into<String>, property: impl Into<String>) -> Self {
        Self(vec![id.into(), property.into()])
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, OperationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(OperationError::invalid_path("path must name a node"));
        }
        Ok(Self(segments))
    }

    /// Append a nested key
    pub fn join(mut self, key: impl Into<String>) -> Self {
        self.0.push(key.into());
        self
    }

    pub fn node_id(&self) -> &str {
        &self.0[0]
    }

    pub fn property_name(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Keys below the property, e.g. `["path"]` for `[id, "start", "path"]`
    pub fn sub_path(&self) -> &[String] {
        self.0.get(2..).unwrap_or(&[])
    }

    /// Property keys below the node id
    pub fn value_path(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for OperationPath {
    type Error = OperationError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

impl From<OperationPath> for Vec<String> {
    fn from(path: OperationPath) -> Self {
        path.0
    }
}

impl fmt::Display for OperationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A primitive operation on the flat node table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Create {
        node: Node,
    },
    Delete {
        node: Node,
    },
    #[serde(rename_all = "camelCase")]
    Set {
        path: OperationPath,
        old_value: Value,
        new_value: Value,
    },
    Update {
        path: OperationPath,
        diff: PropertyDiff,
    },
}

impl Operation {
    pub fn create(node: Node) -> Self {
        Operation::Create { node }
    }

    pub fn delete(node: Node) -> Self {
        Operation::Delete { node }
    }

    pub fn set(path: OperationPath, old_value: Value, new_value: Value) -> Self {
        Operation::Set {
            path,
            old_value,
            new_value,
        }
    }

    pub fn update(path: OperationPath, diff: PropertyDiff) -> Self {
        Operation::Update { path, diff }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Create { .. } => OperationKind::Create,
            Operation::Delete { .. } => OperationKind::Delete,
            Operation::Set { .. } => OperationKind::Set,
            Operation::Update { .. } => OperationKind::Update,
        }
    }

    /// Path addressed by the operation
    pub fn path(&self) -> OperationPath {
        match self {
            Operation::Create { node } | Operation::Delete { node } => {
                OperationPath::node(node.id.clone())
            }
            Operation::Set { path, .. } | Operation::Update { path, .. } => path.clone(),
        }
    }

    /// Id of the node the operation applies to
    pub fn node_id(&self) -> &str {
        match self {
            Operation::Create { node } | Operation::Delete { node } => &node.id,
            Operation::Set { path, .. } | Operation::Update { path, .. } => path.node_id(),
        }
    }

    /// Operation that undoes this one
    pub fn invert(&self) -> Operation {
        match self {
            Operation::Create { node } => Operation::Delete { node: node.clone() },
            Operation::Delete { node } => Operation::Create { node: node.clone() },
            Operation::Set {
                path,
                old_value,
                new_value,
            } => Operation::Set {
                path: path.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            },
            Operation::Update { path, diff } => Operation::Update {
                path: path.clone(),
                diff: diff.invert(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_accessors() {
        let path = OperationPath::property("a1", "start").join("path");

        assert_eq!(path.node_id(), "a1");
        assert_eq!(path.property_name(), Some("start"));
        assert_eq!(path.sub_path(), &["path".to_string()]);
        assert_eq!(path.value_path().len(), 2);
        assert_eq!(path.to_string(), "a1.start.path");

        let node_path = OperationPath::node("n1");
        assert!(node_path.property_name().is_none());
        assert!(node_path.sub_path().is_empty());

        assert!(OperationPath::from_segments(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_invert_swaps_kinds_and_values() {
        let node = Node::new_with_id("n1".to_string(), "item".to_string(), json!({}));
        assert_eq!(Operation::create(node.clone()).invert(), Operation::delete(node));

        let set = Operation::set(
            OperationPath::property("p", "items"),
            json!(["x"]),
            json!(["y"]),
        );
        match set.invert() {
            Operation::Set {
                old_value,
                new_value,
                ..
            } => {
                assert_eq!(old_value, json!(["y"]));
                assert_eq!(new_value, json!(["x"]));
            }
            other => panic!("Expected Set, got {:?}", other),
        }

        let update = Operation::update(
            OperationPath::property("p", "items"),
            PropertyDiff::Array(ArrayDiff::insert(0, "x")),
        );
        assert_eq!(
            update.invert(),
            Operation::update(
                OperationPath::property("p", "items"),
                PropertyDiff::Array(ArrayDiff::delete(0, "x")),
            )
        );
    }

    /// Contract test for the serialized operation format
    #[test]
    fn test_operation_serialization_contract() {
        let op = Operation::update(
            OperationPath::property("p1", "items"),
            PropertyDiff::Array(ArrayDiff::delete(1, "x")),
        );
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["type"], "update");
        assert_eq!(json["path"], json!(["p1", "items"]));
        assert_eq!(json["diff"]["kind"], "array");
        assert_eq!(json["diff"]["op"], "delete");
        assert_eq!(json["diff"]["pos"], 1);

        let set = Operation::set(OperationPath::property("p1", "title"), json!(null), json!("T"));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["type"], "set");
        assert_eq!(json["oldValue"], json!(null));
        assert_eq!(json["newValue"], "T");

        let restored: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(restored.kind(), OperationKind::Set);
    }
}
