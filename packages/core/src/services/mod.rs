//! Hierarchy Services
//!
//! This module contains the hierarchy-consistency layer that runs on top of the
//! flat node store:
//!
//! - `HierarchyResolver` - Operation observer maintaining parent links
//! - `PendingParentRegistry` - Provisional parents for forward references
//! - `position_indexer` - Ordinal positions inside owned collections
//! - `annotation_anchor` - Parent resolution for range-anchored annotations
//!
//! The layer never decides what edits happen and never rejects an operation;
//! it only keeps derived hierarchy metadata in sync with committed operations.

pub mod annotation_anchor;
pub mod config;
pub mod error;
pub mod hierarchy_resolver;
pub mod pending_parents;
pub mod position_indexer;

pub use annotation_anchor::{anchor_of, AnnotationAnchor};
pub use config::HierarchyConfig;
pub use error::HierarchyError;
pub use hierarchy_resolver::HierarchyResolver;
pub use pending_parents::{PendingKind, PendingParent, PendingParentRegistry};
pub use position_indexer::{position_in, reindex};
