use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DiagramError, DiagramResult};

/// The fixed node taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Container,
    Leaf,
    TextLabel,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Root,
        NodeKind::Container,
        NodeKind::Leaf,
        NodeKind::TextLabel,
    ];

    /// Wire name as it appears in snapshot JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Container => "container",
            NodeKind::Leaf => "leaf",
            NodeKind::TextLabel => "textLabel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Whether nodes of this kind may be the parent of other nodes
    pub fn can_contain(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Container)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rectangle of the diagram
///
/// Geometry is stored flat (`x`, `y`, `w`, `h`) to match the snapshot JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub size_locked: bool,
}

impl Node {
    /// Create a node with default presentation
    pub fn new(id: impl Into<String>, kind: NodeKind, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            x,
            y,
            w,
            h,
            label: String::new(),
            description: None,
            color: None,
            font_size: None,
            font_weight: None,
            locked: false,
            size_locked: false,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Decode a node from JSON the validator has already accepted
    ///
    /// Structural fields (`id`, `kind`, geometry) must be well formed;
    /// presentation fields of the wrong type fall back to their defaults.
    pub fn from_value_lenient(value: &Value) -> DiagramResult<Self> {
        let malformed = |field: &str| DiagramError::Malformed {
            context: "node".to_string(),
            field: field.to_string(),
        };
        let obj = value.as_object().ok_or_else(|| malformed("object"))?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("id"))?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .and_then(NodeKind::parse)
            .ok_or_else(|| malformed("kind"))?;
        let number = |field: &str| {
            obj.get(field)
                .and_then(Value::as_f64)
                .ok_or_else(|| malformed(field))
        };

        let mut node = Node::new(
            id,
            kind,
            number("x")?,
            number("y")?,
            number("w")?,
            number("h")?,
        );
        node.parent_id = obj
            .get("parentId")
            .and_then(Value::as_str)
            .map(str::to_string);

        let text = |field: &str| obj.get(field).and_then(Value::as_str).map(str::to_string);
        node.label = text("label").unwrap_or_default();
        node.description = text("description");
        node.color = text("color");
        node.font_weight = text("fontWeight");
        node.font_size = obj.get("fontSize").and_then(Value::as_f64);
        node.locked = obj.get("locked").and_then(Value::as_bool).unwrap_or(false);
        node.size_locked = obj
            .get("sizeLocked")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(node)
    }
}
