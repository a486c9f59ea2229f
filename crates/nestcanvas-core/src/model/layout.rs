use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::Node;

/// Extent of the diagram in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub w: f64,
    pub h: f64,
}

/// Layout provenance carried with every snapshot
///
/// Tells the reflow collaborators whether they may recompute geometry
/// after the snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutMetadata {
    pub algorithm: String,
    pub is_user_arranged: bool,
    pub preserve_positions: bool,
    pub bounding_box: BoundingBox,
}

impl Default for LayoutMetadata {
    fn default() -> Self {
        Self {
            algorithm: "grid".to_string(),
            is_user_arranged: false,
            preserve_positions: false,
            bounding_box: BoundingBox::default(),
        }
    }
}

impl LayoutMetadata {
    /// Reflow is allowed only for layouts nobody arranged by hand
    pub fn permits_reflow(&self) -> bool {
        !self.is_user_arranged && !self.preserve_positions
    }

    /// Copy with the bounding box recomputed from `nodes`
    pub fn fitted_to(&self, nodes: &[Node]) -> Self {
        let bounding_box = nodes.iter().fold(BoundingBox::default(), |acc, node| {
            BoundingBox {
                w: acc.w.max(node.right()),
                h: acc.h.max(node.bottom()),
            }
        });
        Self {
            bounding_box,
            ..self.clone()
        }
    }

    /// Build layout metadata from untrusted JSON, defaulting bad fields
    pub fn from_value_lenient(value: &Value) -> Self {
        let mut meta = LayoutMetadata::default();
        let Some(map) = value.as_object() else {
            return meta;
        };
        if let Some(v) = map.get("algorithm").and_then(Value::as_str) {
            meta.algorithm = v.to_string();
        }
        if let Some(v) = map.get("isUserArranged").and_then(Value::as_bool) {
            meta.is_user_arranged = v;
        }
        if let Some(v) = map.get("preservePositions").and_then(Value::as_bool) {
            meta.preserve_positions = v;
        }
        if let Some(bbox) = map.get("boundingBox") {
            meta.bounding_box = BoundingBox {
                w: bbox.get("w").and_then(Value::as_f64).unwrap_or(0.0),
                h: bbox.get("h").and_then(Value::as_f64).unwrap_or(0.0),
            };
        }
        meta
    }
}
