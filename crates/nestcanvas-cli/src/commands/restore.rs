//! Restore command
//!
//! Loads the saved diagram into a fresh session and prints it as an
//! indented outline.

use std::collections::HashMap;

use clap::Args;
use nestcanvas_core::errors::Result;
use nestcanvas_core::model::Node;
use nestcanvas_engine::{DiagramHost, RestoreOutcome};

use super::{format_timestamp, print_json, Context};

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Print the restored nodes as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: RestoreArgs) -> Result<()> {
    let session = ctx.session()?;
    let outcome = session.coordinator.restore().await?;

    let timestamp = match outcome {
        RestoreOutcome::Restored { timestamp } => timestamp,
        RestoreOutcome::RolledBack { timestamp } => {
            println!("Saved data was unusable; reverted to the last good state");
            timestamp
        }
        _ => {
            println!("No saved diagram");
            return Ok(());
        }
    };

    let nodes = session.live.nodes();
    if args.json {
        return print_json(&nodes);
    }
    println!(
        "Restored {} nodes saved at {}",
        nodes.len(),
        format_timestamp(timestamp)
    );
    for line in outline(&nodes) {
        println!("{}", line);
    }
    Ok(())
}

/// Depth-first outline; parentless nodes start at the left margin
pub fn outline(nodes: &[Node]) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&Node>> = HashMap::new();
    let mut tops = Vec::new();
    for node in nodes {
        match node.parent_id.as_deref() {
            Some(parent) => children.entry(parent).or_default().push(node),
            None => tops.push(node),
        }
    }

    let mut lines = Vec::with_capacity(nodes.len());
    let mut stack: Vec<(&Node, usize)> = tops.into_iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let label = if node.label.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", node.label)
        };
        lines.push(format!(
            "{}- {} [{}]{}",
            "  ".repeat(depth),
            node.id,
            node.kind.as_str(),
            label
        ));
        if let Some(kids) = children.get(node.id.as_str()) {
            stack.extend(kids.iter().rev().map(|k| (*k, depth + 1)));
        }
    }
    lines
}
