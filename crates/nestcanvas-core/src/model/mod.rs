//! Diagram data model.

pub mod layout;
pub mod node;
pub mod settings;
pub mod snapshot;

pub use layout::{BoundingBox, LayoutMetadata};
pub use node::{Node, NodeKind};
pub use settings::{SettingType, Settings, SETTINGS_SCHEMA};
pub use snapshot::{DiagramSnapshot, FORMAT_VERSION};
