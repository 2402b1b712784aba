//! Hierarchy Consistency Tests
//!
//! Loads documents in arbitrary node order through the public API and checks
//! that the derived hierarchy does not depend on that order.

#[cfg(test)]
mod hierarchy_consistency_tests {
    use anyhow::Result;
    use flatdoc_core::{DocumentStore, HierarchyConfig, HierarchyError, Node, ParentLink, SchemaRegistry};
    use serde_json::{json, Value};
    use std::sync::Once;

    static TRACING: Once = Once::new();

    /// Route resolver logs to the test output (`RUST_LOG=flatdoc_core=debug`)
    fn init_tracing() {
        TRACING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    fn schemas() -> Result<SchemaRegistry> {
        Ok(SchemaRegistry::from_json(json!([
            {
                "nodeType": "article",
                "kind": { "type": "block" },
                "childProperties": [
                    { "name": "body", "cardinality": "collection" },
                    { "name": "title", "cardinality": "single" }
                ]
            },
            {
                "nodeType": "list",
                "kind": { "type": "block" },
                "childProperties": [{ "name": "items", "cardinality": "collection" }]
            },
            { "nodeType": "heading", "kind": { "type": "block" } },
            { "nodeType": "paragraph", "kind": { "type": "block" } },
            { "nodeType": "list-item", "kind": { "type": "block" } },
            { "nodeType": "emphasis", "kind": { "type": "annotation" } }
        ]))?)
    }

    fn document() -> Value {
        json!({
            "nodes": [
                { "id": "art", "type": "article", "properties": { "title": "h1", "body": ["p1", "l1", "p2"] } },
                { "id": "h1", "type": "heading", "properties": { "content": "Title" } },
                { "id": "p1", "type": "paragraph", "properties": { "content": "First" } },
                { "id": "l1", "type": "list", "properties": { "items": ["i1", "i2"] } },
                { "id": "i1", "type": "list-item", "properties": { "content": "one" } },
                { "id": "i2", "type": "list-item", "properties": { "content": "two" } },
                { "id": "p2", "type": "paragraph", "properties": { "content": "Second" } },
                {
                    "id": "em1",
                    "type": "emphasis",
                    "properties": {
                        "start": { "path": ["p2", "content"], "offset": 0 },
                        "end": { "path": ["p2", "content"], "offset": 3 }
                    }
                }
            ]
        })
    }

    fn reordered(mut document: Value, order: &[usize]) -> Value {
        let nodes = document["nodes"].as_array().cloned().unwrap_or_default();
        document["nodes"] = Value::Array(order.iter().map(|&i| nodes[i].clone()).collect());
        document
    }

    fn links(store: &DocumentStore) -> Vec<(String, ParentLink)> {
        let mut links: Vec<(String, ParentLink)> = store
            .nodes()
            .iter()
            .map(|node| (node.id.clone(), node.parent_link().clone()))
            .collect();
        links.sort_by(|a, b| a.0.cmp(&b.0));
        links
    }

    #[test]
    fn test_document_order_does_not_change_links() -> Result<()> {
        init_tracing();
        let natural = DocumentStore::from_json(schemas()?, document())?;

        for order in [
            [7, 6, 5, 4, 3, 2, 1, 0],
            [0, 7, 3, 1, 6, 4, 2, 5],
            [4, 5, 3, 7, 0, 2, 6, 1],
        ] {
            let store = DocumentStore::from_json(schemas()?, reordered(document(), &order))?;
            assert_eq!(links(&store), links(&natural), "order {:?}", order);
            assert!(store.finalize().is_ok());
        }
        Ok(())
    }

    #[test]
    fn test_loaded_document_links() -> Result<()> {
        init_tracing();
        let store = DocumentStore::from_json(schemas()?, reordered(document(), &[7, 6, 5, 4, 3, 2, 1, 0]))?;

        let expect = |id: &str, link: ParentLink| {
            assert_eq!(store.get(id).map(|n| n.parent_link().clone()), Some(link), "{}", id);
        };
        expect("art", ParentLink::detached());
        expect("h1", ParentLink::attached("art", "title", None));
        expect("p1", ParentLink::attached("art", "body", Some(0)));
        expect("l1", ParentLink::attached("art", "body", Some(1)));
        expect("p2", ParentLink::attached("art", "body", Some(2)));
        expect("i2", ParentLink::attached("l1", "items", Some(1)));
        expect("em1", ParentLink::attached("p2", "content", None));

        let path: Vec<String> = store.xpath("i2").into_iter().map(|s| s.id).collect();
        assert_eq!(path, vec!["art", "l1", "i2"]);

        let body: Vec<&str> = store.children("art", "body").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(body, vec!["p1", "l1", "p2"]);
        Ok(())
    }

    #[test]
    fn test_partial_document_keeps_dangling_entries() -> Result<()> {
        init_tracing();
        let config = HierarchyConfig {
            warn_on_dangling: true,
            ..HierarchyConfig::default()
        };
        let mut store = DocumentStore::with_config(schemas()?, config);

        // Streaming load: only the first half of the document has arrived
        let nodes: Vec<Node> = serde_json::from_value(document()["nodes"].clone())?;
        let (head, tail) = nodes.split_at(4);
        store.load(head.to_vec())?;

        match store.finalize() {
            Err(HierarchyError::DanglingPendingParents { ids }) => {
                assert_eq!(ids, vec!["i1", "i2", "p2"]);
            }
            other => panic!("Expected dangling entries, got {:?}", other),
        }

        store.load(tail.to_vec())?;
        store.finalize()?;
        Ok(())
    }

    #[test]
    fn test_serialization_round_trip_rebuilds_links() -> Result<()> {
        init_tracing();
        let store = DocumentStore::from_json(schemas()?, document())?;

        let restored = DocumentStore::from_json(schemas()?, store.to_json()?)?;

        assert_eq!(links(&restored), links(&store));
        assert!(store.to_json()?["nodes"][0].get("xpath").is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_documents_are_rejected() -> Result<()> {
        let err = DocumentStore::from_json(schemas()?, json!({ "nodes": [{ "id": "x" }] }))
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Invalid document JSON"));

        let unknown = json!({ "nodes": [{ "id": "x", "type": "video" }] });
        let err = DocumentStore::from_json(schemas()?, unknown).err();
        assert_eq!(
            err.map(|e| e.to_string()).as_deref(),
            Some("Failed to load document nodes")
        );
        Ok(())
    }
}
