#![allow(dead_code)]

use std::sync::Arc;

use nestcanvas_core::model::{DiagramSnapshot, LayoutMetadata, Node, NodeKind, Settings};
use nestcanvas_engine::{ConsistencyManager, Coordinator, EngineConfig, LiveDiagram};
use nestcanvas_store::{DiagramRecord, MemoryStore};
use serde_json::Value;

pub const T: i64 = 1_700_000_000_000;

/// Engine wired to an in-memory store and host
pub struct Harness {
    pub store: MemoryStore,
    pub live: Arc<LiveDiagram>,
    pub manager: ConsistencyManager,
    pub coordinator: Coordinator,
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let store = MemoryStore::new();
    let live = Arc::new(LiveDiagram::new());
    let manager = ConsistencyManager::new(Arc::new(store.clone()), live.clone(), config);
    let coordinator = Coordinator::new(manager.clone());
    Harness {
        store,
        live,
        manager,
        coordinator,
    }
}

/// `[A(root), B(leaf, parent = A)]`
pub fn tree_ab() -> Vec<Node> {
    vec![
        Node::new("A", NodeKind::Root, 0.0, 0.0, 600.0, 400.0).with_label("Root"),
        Node::new("B", NodeKind::Leaf, 20.0, 20.0, 160.0, 80.0)
            .with_parent("A")
            .with_label("Leaf"),
    ]
}

pub fn tree_xyz() -> Vec<Node> {
    vec![
        Node::new("X", NodeKind::Root, 0.0, 0.0, 900.0, 700.0),
        Node::new("Y", NodeKind::Container, 10.0, 10.0, 300.0, 300.0).with_parent("X"),
        Node::new("Z", NodeKind::Leaf, 20.0, 20.0, 50.0, 50.0).with_parent("Y"),
    ]
}

pub fn snapshot_value(nodes: Vec<Node>, timestamp: i64) -> Value {
    DiagramSnapshot::at(nodes, Settings::default(), LayoutMetadata::default(), timestamp)
        .to_value()
        .unwrap()
}

/// A stored record exactly as a save would have written it
pub fn record(nodes: Vec<Node>, timestamp: i64) -> DiagramRecord {
    DiagramRecord::new(snapshot_value(nodes, timestamp).to_string(), timestamp)
}

pub fn ids(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.id.clone()).collect()
}

/// Node ids inside the record currently in the store
pub fn stored_ids(store: &MemoryStore) -> Vec<String> {
    let record = store.current().expect("a stored record");
    let value: Value = serde_json::from_str(&record.payload).unwrap();
    value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect()
}
