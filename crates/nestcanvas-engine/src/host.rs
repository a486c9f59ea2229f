//! The live-diagram collaborator
//!
//! The engine never owns the editable diagram. It reads it through this
//! trait before saving and hands restored or imported state back through it.

use async_trait::async_trait;
use nestcanvas_core::errors::Result;
use nestcanvas_core::model::{LayoutMetadata, Node, Settings};

/// Nodes with freshly assigned ids, plus the host's next id counter
#[derive(Debug, Clone, PartialEq)]
pub struct IdAssignment {
    pub nodes: Vec<Node>,
    pub next_id_counter: u64,
}

#[async_trait]
pub trait DiagramHost: Send + Sync {
    fn nodes(&self) -> Vec<Node>;

    fn settings(&self) -> Settings;

    fn layout_metadata(&self) -> LayoutMetadata;

    /// Replace live nodes, settings and layout metadata in one step
    ///
    /// Implementations also reset their undo history: the applied state is
    /// the new baseline.
    async fn apply_restored_state(
        &self,
        nodes: Vec<Node>,
        settings: Settings,
        layout_metadata: LayoutMetadata,
    ) -> Result<()>;

    /// Whether loaded geometry may be recomputed
    fn can_reflow(&self, layout_metadata: &LayoutMetadata) -> bool {
        layout_metadata.permits_reflow()
    }

    /// Re-impose fixed dimension rules on freshly imported nodes
    fn enforce_fixed_dimensions(
        &self,
        nodes: Vec<Node>,
        layout_metadata: &LayoutMetadata,
        settings: &Settings,
    ) -> Result<Vec<Node>>;

    /// Give imported nodes ids that cannot collide with existing ones
    fn assign_fresh_ids(&self, nodes: Vec<Node>) -> IdAssignment;
}
