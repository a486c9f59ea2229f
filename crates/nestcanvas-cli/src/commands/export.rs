//! Export command
//!
//! Usage: nestcanvas export <PATH>

use std::path::PathBuf;

use clap::Args;
use nestcanvas_core::errors::{ExError, ExErrorKind, Result};

use super::Context;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Destination file; replaced atomically
    pub path: PathBuf,
}

pub async fn execute(ctx: &Context, args: ExportArgs) -> Result<()> {
    let session = ctx.session()?;
    let outcome = session.coordinator.restore().await?;
    if !outcome.applied() {
        return Err(ExError::new(ExErrorKind::NotFound)
            .with_op("export")
            .with_message(format!("No saved diagram in {}", ctx.db.display())));
    }

    let node_count = session.coordinator.export_to(&args.path).await?;
    println!("Exported {} nodes to {}", node_count, args.path.display());
    Ok(())
}
