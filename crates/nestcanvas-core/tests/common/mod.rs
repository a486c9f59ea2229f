use nestcanvas_core::{DiagramSnapshot, LayoutMetadata, Node, NodeKind, Settings, FORMAT_VERSION};
use serde_json::{json, Value};

/// Raw node JSON with valid geometry
#[allow(dead_code)]
pub fn raw_node(id: &str, kind: &str, parent: Option<&str>) -> Value {
    let mut node = json!({
        "id": id,
        "kind": kind,
        "x": 10, "y": 10, "w": 120, "h": 80,
        "label": id,
    });
    if let Some(parent) = parent {
        node["parentId"] = json!(parent);
    }
    node
}

/// Raw snapshot JSON around the given nodes with every optional section present
#[allow(dead_code)]
pub fn raw_snapshot(nodes: Vec<Value>) -> Value {
    json!({
        "formatVersion": FORMAT_VERSION,
        "nodes": nodes,
        "settings": {"gridSize": 20, "snapToGrid": true},
        "layoutMetadata": {
            "algorithm": "grid",
            "isUserArranged": false,
            "preservePositions": false,
            "boundingBox": {"w": 0, "h": 0}
        },
        "timestamp": 1_700_000_000_000_i64
    })
}

/// Typed root/container/leaf diagram
#[allow(dead_code)]
pub fn sample_snapshot() -> DiagramSnapshot {
    DiagramSnapshot::at(
        vec![
            Node::new("root", NodeKind::Root, 0.0, 0.0, 800.0, 600.0),
            Node::new("box", NodeKind::Container, 20.0, 20.0, 300.0, 200.0).with_parent("root"),
            Node::new("leaf", NodeKind::Leaf, 40.0, 40.0, 160.0, 80.0)
                .with_parent("box")
                .with_label("Leaf"),
        ],
        Settings::default(),
        LayoutMetadata::default(),
        1_700_000_000_000,
    )
}
