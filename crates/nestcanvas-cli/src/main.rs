//! nestcanvas CLI
//!
//! Command-line front end for the diagram persistence engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nestcanvas_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "nestcanvas")]
#[command(about = "nestcanvas - Durable storage for nested diagrams", long_about = None)]
struct Cli {
    /// SQLite file holding the saved diagram
    #[arg(long, global = true, default_value = ".nestcanvas/diagram.db")]
    db: PathBuf,

    /// Engine settings (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check a diagram file without storing it
    Validate(commands::validate::ValidateArgs),
    /// Import a diagram file and make it the saved diagram
    Import(commands::import::ImportArgs),
    /// Load the saved diagram and print its outline
    Restore(commands::restore::RestoreArgs),
    /// Write the saved diagram to a file
    Export(commands::export::ExportArgs),
    /// Delete the saved diagram
    Clear,
    /// Show what is currently saved
    Status(commands::status::StatusArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let ctx = commands::Context {
        db: cli.db,
        config: cli.config,
    };
    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Import(args) => commands::import::execute(&ctx, args).await,
        Commands::Restore(args) => commands::restore::execute(&ctx, args).await,
        Commands::Export(args) => commands::export::execute(&ctx, args).await,
        Commands::Clear => commands::clear::execute(&ctx).await,
        Commands::Status(args) => commands::status::execute(&ctx, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}
