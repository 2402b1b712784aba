//! Flatdoc Core
//!
//! This crate provides a flat, id-indexed document model together with the
//! layer that keeps its derived hierarchy consistent.
//!
//! # Architecture
//!
//! - **Flat Storage**: Every node lives in one table keyed by id; parents refer
//!   to children only through ids inside their properties
//! - **Primitive Operations**: All mutations are create, delete, set or update
//!   operations, each invertible
//! - **Derived Hierarchy**: Parent links, collection positions and annotation
//!   anchors are recomputed from the operation stream, in any creation order
//! - **Domain Events**: Committed changes are broadcast over a tokio channel
//!
//! # Modules
//!
//! - [`models`] - Node records, parent links and node type schemas
//! - [`operations`] - Primitive operations and property diffs
//! - [`db`] - Node table and `DocumentStore`
//! - [`services`] - Hierarchy resolver, pending parents, position indexer
//!
//! # Examples
//!
//! ```rust
//! use flatdoc_core::{DocumentStore, Node, NodeSchema, SchemaRegistry};
//! use serde_json::json;
//!
//! let schemas = SchemaRegistry::new()
//!     .with(NodeSchema::new("list").with_children("items"))
//!     .with(NodeSchema::new("item"));
//! let mut store = DocumentStore::with_hierarchy(schemas);
//!
//! // Parent first, child later: the link is resolved when the child appears.
//! store
//!     .create(Node::new_with_id("l".into(), "list".into(), json!({ "items": ["a"] })))
//!     .unwrap();
//! store
//!     .create(Node::new_with_id("a".into(), "item".into(), json!({})))
//!     .unwrap();
//!
//! assert_eq!(store.get("a").unwrap().parent_id(), Some("l"));
//! assert_eq!(store.get("a").unwrap().position(), Some(0));
//! assert!(store.finalize().is_ok());
//! ```

pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use db::{DocumentStore, DomainEvent, NodeTable, OperationObserver, StoreError};
pub use models::*;
pub use operations::{ArrayDiff, Operation, OperationError, OperationPath, PropertyDiff, TextDiff};
pub use services::*;
