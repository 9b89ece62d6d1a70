//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// slipway - a native dependency build orchestrator
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all native dependencies, compile the extension, and stage the
    /// runtime bundle
    Install(CommonArgs),

    /// Build all native dependencies and compile the extension
    Build(CommonArgs),

    /// Editable install: compile the extension in place next to its source
    Develop(CommonArgs),
}

#[derive(Args)]
pub struct CommonArgs {
    /// Shared install prefix for the native dependencies
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Extension source unit to compile
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output directory for the compiled extension
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
}
