//! Derived parent links
//!
//! A `ParentLink` is the per-node back-reference maintained by the hierarchy
//! layer. It is a relation, not ownership: the parent is referenced by id and
//! resolved through the node table on demand, so removing a parent never
//! requires touching its children.

use serde::{Deserialize, Serialize};

/// Back-reference from a node to its structural parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    /// Id of the parent node
    pub parent: Option<String>,

    /// Name of the owning property on the parent
    pub property: Option<String>,

    /// Zero-based index inside the parent's collection (collections only)
    pub position: Option<usize>,
}

impl ParentLink {
    /// Link to `parent` under `property`
    pub fn attached(
        parent: impl Into<String>,
        property: impl Into<String>,
        position: Option<usize>,
    ) -> Self {
        Self {
            parent: Some(parent.into()),
            property: Some(property.into()),
            position,
        }
    }

    /// The empty link (no parent, no property, no position)
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }
}

/// One step of a node's path from the document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XPathSegment {
    pub id: String,
    pub node_type: String,
    /// Property of the previous segment this node hangs under
    pub property: Option<String>,
    pub position: Option<usize>,
}
