//! Store Error Types
//!
//! This module defines error types for applying operations to the flat node
//! store. A rejected operation leaves the store, the derived hierarchy and the
//! event stream untouched.

use crate::models::ValidationError;
use crate::operations::{OperationError, OperationPath};
use serde_json::Value;
use thiserror::Error;

/// Flat node store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A node with this id is already stored
    #[error("Node already exists: {id}")]
    NodeAlreadyExists { id: String },

    /// No node with this id is stored
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// The node type has no schema in the registry
    #[error("Unknown node type: {node_type}")]
    UnknownNodeType { node_type: String },

    /// The operation path does not address a value
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The stored value differs from the operation's expected old value
    #[error("Value mismatch at {path}: expected {expected}, found {actual}")]
    ValueMismatch {
        path: String,
        expected: Value,
        actual: Value,
    },

    /// Diff could not be applied
    #[error("Operation failed: {0}")]
    Operation(#[from] OperationError),

    /// Node record failed validation
    #[error("Node validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub fn node_already_exists(id: impl Into<String>) -> Self {
        Self::NodeAlreadyExists { id: id.into() }
    }

    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn unknown_node_type(node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            node_type: node_type.into(),
        }
    }

    pub fn invalid_path(path: &OperationPath, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn value_mismatch(path: &OperationPath, expected: Value, actual: Value) -> Self {
        Self::ValueMismatch {
            path: path.to_string(),
            expected,
            actual,
        }
    }
}
