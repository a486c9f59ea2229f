use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::model::NodeKind;

/// Graph-relevant view of one raw node
///
/// Built from untrusted JSON, so `kind` is `None` when the value is missing
/// or unknown. Nodes without a usable string id are not indexed at all.
#[derive(Debug, Clone, Copy)]
pub struct NodeEntry<'a> {
    pub index: usize,
    pub id: &'a str,
    pub kind: Option<NodeKind>,
    pub parent_id: Option<&'a str>,
}

/// Index the raw node list for the cross-node checks below
pub fn index_nodes(nodes: &[Value]) -> Vec<NodeEntry<'_>> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let id = node.get("id").and_then(Value::as_str)?;
            if id.is_empty() {
                return None;
            }
            Some(NodeEntry {
                index,
                id,
                kind: node
                    .get("kind")
                    .and_then(Value::as_str)
                    .and_then(NodeKind::parse),
                parent_id: node.get("parentId").and_then(Value::as_str),
            })
        })
        .collect()
}

/// Lookup from id to the first node carrying it
fn first_by_id<'e, 'a>(entries: &'e [NodeEntry<'a>]) -> HashMap<&'a str, &'e NodeEntry<'a>> {
    let mut by_id = HashMap::new();
    for entry in entries {
        by_id.entry(entry.id).or_insert(entry);
    }
    by_id
}

/// Find ids used by more than one node
///
/// Returns (id, node indices) in order of first appearance.
pub fn find_duplicate_ids(entries: &[NodeEntry<'_>]) -> Vec<(String, Vec<usize>)> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();
    for entry in entries {
        let slot = positions.entry(entry.id).or_default();
        if slot.is_empty() {
            order.push(entry.id);
        }
        slot.push(entry.index);
    }
    order
        .into_iter()
        .filter_map(|id| {
            let indices = positions.remove(id)?;
            (indices.len() > 1).then(|| (id.to_string(), indices))
        })
        .collect()
}

/// Find nodes whose parentId names no node in the snapshot
///
/// Returns (node index, node id, parent id)
pub fn find_dangling_parents(entries: &[NodeEntry<'_>]) -> Vec<(usize, String, String)> {
    let ids: HashSet<&str> = entries.iter().map(|e| e.id).collect();
    entries
        .iter()
        .filter_map(|entry| {
            let parent = entry.parent_id?;
            (!ids.contains(parent))
                .then(|| (entry.index, entry.id.to_string(), parent.to_string()))
        })
        .collect()
}

/// Find nodes whose parent exists but cannot hold children
///
/// Returns (node index, node id, parent id, parent kind)
pub fn find_non_container_parents(
    entries: &[NodeEntry<'_>],
) -> Vec<(usize, String, String, NodeKind)> {
    let by_id = first_by_id(entries);
    entries
        .iter()
        .filter_map(|entry| {
            let parent = by_id.get(entry.parent_id?)?;
            let parent_kind = parent.kind?;
            (!parent_kind.can_contain()).then(|| {
                (
                    entry.index,
                    entry.id.to_string(),
                    parent.id.to_string(),
                    parent_kind,
                )
            })
        })
        .collect()
}

/// Find every cycle in the parent chains
///
/// Walks each chain once with a visited set; a chain that re-enters a node
/// already on the current path closes a cycle. Each cycle is reported once,
/// as its member ids in walk order.
pub fn find_cycles(entries: &[NodeEntry<'_>]) -> Vec<Vec<String>> {
    let by_id = first_by_id(entries);
    let mut settled: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for entry in entries {
        if settled.contains(entry.id) {
            continue;
        }

        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = Some(entry.id);

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !on_path.insert(id) {
                if let Some(start) = path.iter().position(|p| *p == id) {
                    cycles.push(path[start..].iter().map(|s| s.to_string()).collect());
                }
                break;
            }
            path.push(id);
            current = by_id.get(id).and_then(|e| e.parent_id);
        }

        settled.extend(path);
    }

    cycles
}
