//! Annotation Anchor Resolution
//!
//! Inline annotations are not contained by an owned-child property. Their
//! parent is the node named by the first segment of the range start path, and
//! the property they annotate is the second segment:
//!
//! ```json
//! { "start": { "path": ["p1", "content"], "offset": 4 } }
//! ```
//!
//! Annotations are never positioned members of a collection, so their parent
//! link never carries a position.

use crate::db::NodeTable;
use crate::models::schema::RANGE_PATH_KEY;
use crate::models::{Node, ParentLink};
use crate::services::HierarchyResolver;

/// Node and property an annotation is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationAnchor {
    pub node_id: String,
    pub property: String,
}

/// Read the anchor from `start_property.path` of an annotation node
///
/// Returns `None` when the path is missing or has fewer than two string
/// segments.
pub fn anchor_of(annotation: &Node, start_property: &str) -> Option<AnnotationAnchor> {
    let path = annotation
        .get_path(&[start_property, RANGE_PATH_KEY])?
        .as_array()?;
    let node_id = path.first()?.as_str()?;
    let property = path.get(1)?.as_str()?;

    Some(AnnotationAnchor {
        node_id: node_id.to_string(),
        property: property.to_string(),
    })
}

impl HierarchyResolver {
    /// Attach an annotation to its anchor node
    ///
    /// If the anchor node does not exist yet the annotation is detached and an
    /// anchor entry keyed by the annotation id is recorded; it is resolved when
    /// the anchor node is created.
    pub(crate) fn resolve_anchor(
        &mut self,
        nodes: &mut NodeTable,
        annotation_id: &str,
        start_property: &str,
    ) {
        let anchor = match nodes.get(annotation_id) {
            Some(annotation) => anchor_of(annotation, start_property),
            None => return,
        };

        let link = match anchor {
            Some(anchor) if nodes.contains(&anchor.node_id) => {
                self.pending.clear(annotation_id);
                tracing::debug!(
                    "Anchored annotation '{}' to '{}.{}'",
                    annotation_id,
                    anchor.node_id,
                    anchor.property
                );
                ParentLink::attached(anchor.node_id, anchor.property, None)
            }
            Some(anchor) => {
                self.pending
                    .set_anchor(annotation_id, &anchor.node_id, &anchor.property);
                ParentLink::detached()
            }
            None => {
                self.pending.clear(annotation_id);
                ParentLink::detached()
            }
        };

        if let Some(annotation) = nodes.get_mut(annotation_id) {
            annotation.set_parent_link(link);
        }
    }

    /// Attach annotations that were waiting for `anchor_id` to be created
    pub(crate) fn resolve_waiting_annotations(&mut self, nodes: &mut NodeTable, anchor_id: &str) {
        for (annotation_id, entry) in self.pending.take_awaiting_parent(anchor_id) {
            if let Some(annotation) = nodes.get_mut(&annotation_id) {
                tracing::debug!(
                    "Resolved pending anchor of '{}' to '{}.{}'",
                    annotation_id,
                    anchor_id,
                    entry.property
                );
                annotation.set_parent_link(ParentLink::attached(anchor_id, entry.property, None));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(properties: serde_json::Value) -> Node {
        Node::new_with_id("a1".to_string(), "strong".to_string(), properties)
    }

    #[test]
    fn test_anchor_of_reads_first_two_segments() {
        let node = annotation(json!({ "start": { "path": ["p1", "content", "extra"], "offset": 0 } }));

        assert_eq!(
            anchor_of(&node, "start"),
            Some(AnnotationAnchor {
                node_id: "p1".to_string(),
                property: "content".to_string(),
            })
        );
    }

    #[test]
    fn test_anchor_of_incomplete_paths() {
        assert!(anchor_of(&annotation(json!({})), "start").is_none());
        assert!(anchor_of(&annotation(json!({ "start": { "path": ["p1"] } })), "start").is_none());
        assert!(anchor_of(&annotation(json!({ "start": { "path": "p1" } })), "start").is_none());
        assert!(anchor_of(&annotation(json!({ "start": { "path": [1, "content"] } })), "start").is_none());
    }

    #[test]
    fn test_anchor_of_custom_start_property() {
        let node = annotation(json!({ "from": { "path": ["t1", "title"] } }));

        assert!(anchor_of(&node, "start").is_none());
        assert_eq!(anchor_of(&node, "from").unwrap().node_id, "t1");
    }
}
