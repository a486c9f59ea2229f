//! Status command
//!
//! Reads the stored record directly; nothing is validated or applied.

use clap::Args;
use nestcanvas_core::errors::Result;
use nestcanvas_store::DurableStore;
use serde_json::{json, Value};

use super::{format_timestamp, print_json, Context};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: StatusArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let stored = store.get().await;

    let report = match &stored {
        None => json!({ "db": ctx.db.display().to_string(), "saved": false }),
        Some(stored) => {
            let node_count = serde_json::from_str::<Value>(&stored.record.payload)
                .ok()
                .and_then(|v| v.get("nodes").and_then(|n| n.as_array()).map(Vec::len));
            json!({
                "db": ctx.db.display().to_string(),
                "saved": true,
                "timestamp": stored.record.timestamp,
                "cleared": stored.record.cleared,
                "intact": stored.intact,
                "nodeCount": node_count,
            })
        }
    };

    if args.json {
        return print_json(&report);
    }

    match stored {
        None => println!("No saved diagram in {}", ctx.db.display()),
        Some(stored) => {
            println!("Saved diagram in {}", ctx.db.display());
            println!("  saved_at: {}", format_timestamp(stored.record.timestamp));
            if let Some(count) = report["nodeCount"].as_u64() {
                println!("  nodes: {}", count);
            }
            if stored.record.cleared {
                println!("  cleared: yes (not restored at startup)");
            }
            if !stored.intact {
                println!("  WARNING: payload does not match its digest");
            }
        }
    }
    Ok(())
}
