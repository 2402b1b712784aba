//! Domain Events for DocumentStore
//!
//! This module defines the domain events emitted by `DocumentStore` after an
//! operation has been committed and every observer, the hierarchy resolver
//! included, has run. Subscribers therefore always see node snapshots whose
//! parent links already reflect the operation.
//!
//! # Architecture
//!
//! Events are emitted using tokio's broadcast channel, allowing multiple
//! subscribers to receive notifications asynchronously while the store itself
//! stays synchronous.
//!
//! # Event Flow
//!
//! 1. DocumentStore commits a primitive operation
//! 2. Observers run synchronously, in registration order
//! 3. A domain event is emitted via the broadcast channel
//! 4. Subscribers receive the event whenever they poll

use crate::models::Node;
use serde::Serialize;

/// Domain events emitted by DocumentStore
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A node was created
    NodeCreated(Node),

    /// A property of an existing node was set or updated
    NodeUpdated(Node),

    /// A node was deleted
    NodeDeleted { id: String },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated(_) => "node:created",
            DomainEvent::NodeUpdated(_) => "node:updated",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
        }
    }

    /// Id of the node the event is about
    pub fn node_id(&self) -> &str {
        match self {
            DomainEvent::NodeCreated(node) | DomainEvent::NodeUpdated(node) => &node.id,
            DomainEvent::NodeDeleted { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Contract test: the event tag is merged with the node fields
    ///
    /// The tag is `event`, not `type`, because nodes already serialize their
    /// node type under `type`.
    #[test]
    fn test_domain_event_serialization_contract() {
        let node = Node::new_with_id("n1".to_string(), "item".to_string(), json!({}));
        let parsed = serde_json::to_value(DomainEvent::NodeCreated(node)).unwrap();

        assert_eq!(parsed["event"], "nodeCreated");
        assert_eq!(parsed["id"], "n1");
        assert_eq!(parsed["type"], "item");
        assert!(
            parsed.get("nodeCreated").is_none(),
            "Should NOT be nested under 'nodeCreated' key"
        );

        let parsed = serde_json::to_value(DomainEvent::NodeDeleted {
            id: "n1".to_string(),
        })
        .unwrap();
        assert_eq!(parsed, json!({ "event": "nodeDeleted", "id": "n1" }));
    }

    #[test]
    fn test_event_type_names() {
        let node = Node::new_with_id("n1".to_string(), "item".to_string(), json!({}));

        assert_eq!(DomainEvent::NodeCreated(node.clone()).event_type(), "node:created");
        assert_eq!(DomainEvent::NodeUpdated(node).event_type(), "node:updated");
        let deleted = DomainEvent::NodeDeleted {
            id: "n1".to_string(),
        };
        assert_eq!(deleted.event_type(), "node:deleted");
        assert_eq!(deleted.node_id(), "n1");
    }
}
