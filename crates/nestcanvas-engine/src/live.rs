//! In-memory live diagram
//!
//! Reference [`DiagramHost`] used by the CLI and the test-suite. Holds the
//! editable state behind one mutex and can be told to fail or stall its next
//! apply, which is how the engine's error paths are exercised.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use nestcanvas_core::errors::{ExError, ExErrorKind, Result};
use nestcanvas_core::model::{LayoutMetadata, Node, NodeKind, Settings};

use crate::host::{DiagramHost, IdAssignment};

const ID_PREFIX: &str = "node-";

struct LiveState {
    nodes: Vec<Node>,
    settings: Settings,
    layout_metadata: LayoutMetadata,
    next_id: u64,
    history_generation: u64,
    applied: usize,
    fail_next_apply: Option<String>,
    apply_delay: Option<Duration>,
}

pub struct LiveDiagram {
    state: Mutex<LiveState>,
}

impl Default for LiveDiagram {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_suffix(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// First counter value above every `node-<n>` id in `nodes`
fn counter_after(nodes: &[Node], floor: u64) -> u64 {
    nodes
        .iter()
        .filter_map(|n| numeric_suffix(&n.id))
        .map(|n| n + 1)
        .fold(floor, u64::max)
}

impl LiveDiagram {
    pub fn new() -> Self {
        Self::with_state(Vec::new(), Settings::default(), LayoutMetadata::default())
    }

    pub fn with_state(nodes: Vec<Node>, settings: Settings, layout_metadata: LayoutMetadata) -> Self {
        let next_id = counter_after(&nodes, 1);
        Self {
            state: Mutex::new(LiveState {
                nodes,
                settings,
                layout_metadata,
                next_id,
                history_generation: 0,
                applied: 0,
                fail_next_apply: None,
                apply_delay: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the nodes as an ordinary edit would
    pub fn set_nodes(&self, nodes: Vec<Node>) {
        let mut state = self.lock();
        state.next_id = counter_after(&nodes, state.next_id);
        state.nodes = nodes;
    }

    pub fn set_settings(&self, settings: Settings) {
        self.lock().settings = settings;
    }

    pub fn set_layout_metadata(&self, layout_metadata: LayoutMetadata) {
        self.lock().layout_metadata = layout_metadata;
    }

    /// Bumped every time undo history is reset by an apply
    pub fn history_generation(&self) -> u64 {
        self.lock().history_generation
    }

    /// Number of successful applies
    pub fn apply_count(&self) -> usize {
        self.lock().applied
    }

    pub fn next_id_counter(&self) -> u64 {
        self.lock().next_id
    }

    /// Make the next apply fail with `message` without touching state
    pub fn fail_next_apply(&self, message: impl Into<String>) {
        self.lock().fail_next_apply = Some(message.into());
    }

    /// Stall every apply by `delay` (tokio time)
    pub fn set_apply_delay(&self, delay: Option<Duration>) {
        self.lock().apply_delay = delay;
    }
}

#[async_trait]
impl DiagramHost for LiveDiagram {
    fn nodes(&self) -> Vec<Node> {
        self.lock().nodes.clone()
    }

    fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    fn layout_metadata(&self) -> LayoutMetadata {
        self.lock().layout_metadata.clone()
    }

    async fn apply_restored_state(
        &self,
        nodes: Vec<Node>,
        settings: Settings,
        layout_metadata: LayoutMetadata,
    ) -> Result<()> {
        let delay = self.lock().apply_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if let Some(message) = state.fail_next_apply.take() {
            return Err(ExError::new(ExErrorKind::Collaborator)
                .with_op("apply_restored_state")
                .with_message(message));
        }
        state.next_id = counter_after(&nodes, state.next_id);
        state.nodes = nodes;
        state.settings = settings;
        state.layout_metadata = layout_metadata;
        state.history_generation += 1;
        state.applied += 1;
        Ok(())
    }

    /// Leaves take the fixed leaf size unless their size is locked
    fn enforce_fixed_dimensions(
        &self,
        nodes: Vec<Node>,
        _layout_metadata: &LayoutMetadata,
        settings: &Settings,
    ) -> Result<Vec<Node>> {
        let (w, h) = (settings.fixed_leaf_width, settings.fixed_leaf_height);
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ExError::new(ExErrorKind::Collaborator)
                .with_op("enforce_fixed_dimensions")
                .with_message(format!("fixed leaf size {}x{} is not usable", w, h)));
        }
        Ok(nodes
            .into_iter()
            .map(|mut node| {
                if node.kind == NodeKind::Leaf && !node.size_locked {
                    node.w = w;
                    node.h = h;
                }
                node
            })
            .collect())
    }

    fn assign_fresh_ids(&self, nodes: Vec<Node>) -> IdAssignment {
        let mut state = self.lock();
        let mut renamed: HashMap<String, String> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            renamed
                .entry(node.id.clone())
                .or_insert_with(|| {
                    let id = format!("{}{}", ID_PREFIX, state.next_id);
                    state.next_id += 1;
                    id
                });
        }

        let nodes = nodes
            .into_iter()
            .map(|mut node| {
                if let Some(id) = renamed.get(&node.id) {
                    node.id = id.clone();
                }
                node.parent_id = node
                    .parent_id
                    .as_ref()
                    .and_then(|p| renamed.get(p).cloned());
                node
            })
            .collect();

        IdAssignment {
            nodes,
            next_id_counter: state.next_id,
        }
    }
}
