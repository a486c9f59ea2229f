//! Import command
//!
//! Usage: nestcanvas import <PATH> [--json]

use std::path::PathBuf;

use clap::Args;
use nestcanvas_core::errors::{ExError, ExErrorKind, Result};
use nestcanvas_engine::{ImportOutcome, SaveOutcome};

use super::{format_timestamp, print_json, Context};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Diagram file (JSON) to import
    pub path: PathBuf,

    /// Print the import summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(ctx: &Context, args: ImportArgs) -> Result<()> {
    let session = ctx.session()?;

    let summary = match session.coordinator.import_file(&args.path).await? {
        ImportOutcome::Imported(summary) => summary,
        ImportOutcome::Busy => {
            return Err(ExError::new(ExErrorKind::OperationInFlight)
                .with_op("import")
                .with_message("Another import or restore is in progress"))
        }
    };

    if args.json {
        print_json(&summary)?;
    } else {
        println!(
            "Imported {} nodes from {}",
            summary.node_count,
            args.path.display()
        );
        for warning in &summary.warnings {
            println!("  warning: {}", warning);
        }
        if summary.reflowed {
            println!("  leaf sizes reset to the fixed dimensions");
        }
    }

    match summary.save {
        SaveOutcome::Saved { timestamp } => {
            if !args.json {
                println!("Saved at {}", format_timestamp(timestamp));
            }
            Ok(())
        }
        other => Err(ExError::new(ExErrorKind::StorageUnavailable)
            .with_op("import")
            .with_message(format!(
                "Diagram imported but not saved to {} ({:?})",
                ctx.db.display(),
                other
            ))),
    }
}
