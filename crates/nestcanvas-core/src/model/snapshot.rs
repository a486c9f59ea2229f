//! The unit of persistence and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LayoutMetadata, Node, Settings};
use crate::errors::{DiagramError, DiagramResult};

/// The only snapshot schema this build reads or writes
pub const FORMAT_VERSION: &str = "nestcanvas.diagram/1";

/// Immutable diagram value: nodes, settings and layout metadata at one instant
///
/// Fields are private; every save or load produces a fresh snapshot rather
/// than editing an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSnapshot {
    format_version: String,
    nodes: Vec<Node>,
    settings: Settings,
    layout_metadata: LayoutMetadata,
    timestamp: i64,
}

impl DiagramSnapshot {
    /// Capture a snapshot stamped with the current wall-clock time
    ///
    /// The bounding box in `layout_metadata` is recomputed from `nodes`.
    pub fn capture(nodes: Vec<Node>, settings: Settings, layout_metadata: LayoutMetadata) -> Self {
        Self::at(
            nodes,
            settings,
            layout_metadata,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Capture a snapshot with an explicit timestamp (milliseconds since epoch)
    pub fn at(
        nodes: Vec<Node>,
        settings: Settings,
        layout_metadata: LayoutMetadata,
        timestamp: i64,
    ) -> Self {
        let layout_metadata = layout_metadata.fitted_to(&nodes);
        Self {
            format_version: FORMAT_VERSION.to_string(),
            nodes,
            settings,
            layout_metadata,
            timestamp,
        }
    }

    /// Decode a snapshot from JSON that passed validation
    ///
    /// `globalSettings` is accepted in place of `settings`. A missing
    /// timestamp decodes as 0. The format version is checked again here so
    /// this function is safe to call on its own.
    pub fn from_validated_value(value: &Value) -> DiagramResult<Self> {
        let found = value
            .get("formatVersion")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if found != FORMAT_VERSION {
            return Err(DiagramError::UnsupportedFormat {
                found: found.to_string(),
                expected: FORMAT_VERSION.to_string(),
            });
        }

        let nodes = value
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| DiagramError::Malformed {
                context: "snapshot".to_string(),
                field: "nodes".to_string(),
            })?
            .iter()
            .map(Node::from_value_lenient)
            .collect::<DiagramResult<Vec<_>>>()?;

        let settings = value
            .get("settings")
            .or_else(|| value.get("globalSettings"))
            .map(Settings::from_value_lenient)
            .unwrap_or_default();
        let layout_metadata = value
            .get("layoutMetadata")
            .map(LayoutMetadata::from_value_lenient)
            .unwrap_or_default();
        let timestamp = value
            .get("timestamp")
            .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(|f| f as i64)))
            .unwrap_or(0);

        Ok(Self {
            format_version: FORMAT_VERSION.to_string(),
            nodes,
            settings,
            layout_metadata,
            timestamp,
        })
    }

    /// JSON form used for validation, storage and export
    pub fn to_value(&self) -> DiagramResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout_metadata(&self) -> &LayoutMetadata {
        &self.layout_metadata
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Same diagram content with a different node list
    pub fn with_nodes(&self, nodes: Vec<Node>) -> Self {
        Self::at(
            nodes,
            self.settings.clone(),
            self.layout_metadata.clone(),
            self.timestamp,
        )
    }

    /// Split into owned parts, for handing to the live-state collaborator
    pub fn into_parts(self) -> (Vec<Node>, Settings, LayoutMetadata) {
        (self.nodes, self.settings, self.layout_metadata)
    }
}
