//! Validate command
//!
//! Usage: nestcanvas validate <PATH> [--json]

use std::path::PathBuf;

use clap::Args;
use nestcanvas_core::errors::{DiagramError, ExError, Result};
use nestcanvas_core::rules::validate_value;

use super::{print_json, read_file};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Diagram file (JSON)
    pub path: PathBuf,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Exits non-zero when the file has errors; warnings alone pass
pub async fn execute(args: ValidateArgs) -> Result<()> {
    let bytes = read_file(&args.path).await?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ExError::from(DiagramError::from(e)).with_op("validate"))?;

    let report = validate_value(&value);
    if args.json {
        print_json(&report)?;
    } else {
        for warning in &report.warnings {
            println!("warning: {}", warning);
        }
        for error in &report.errors {
            println!("error: {}", error);
        }
    }

    let node_count = value
        .get("nodes")
        .and_then(|n| n.as_array())
        .map_or(0, Vec::len);
    let warnings = report
        .into_result()
        .map_err(|e| ExError::from(e).with_op("validate"))?;

    if !args.json {
        println!(
            "{}: valid ({} nodes, {} warnings)",
            args.path.display(),
            node_count,
            warnings.len()
        );
    }
    Ok(())
}
