//! Data Models
//!
//! This module contains the data structures of the flat document model:
//!
//! - `Node` - Record stored in the flat node table
//! - `ParentLink` / `XPathSegment` - Derived hierarchy metadata
//! - `NodeSchema` / `SchemaRegistry` - Owned-child and annotation declarations
//!
//! Nodes never own each other. Hierarchy is expressed by ids stored in
//! owned-child properties and rebuilt as parent links by the services layer.

mod node;
pub mod schema;
mod xpath;

pub use node::{ids_of, Node, ValidationError};
pub use schema::{ChildProperty, NodeKind, NodeSchema, PropertyCardinality, SchemaRegistry};
pub use xpath::{ParentLink, XPathSegment};
