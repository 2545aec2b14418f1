//! Kiln CLI - project tooling for Kiln safety checks
//!
//! # Commands
//!
//! - `kiln checks status` - Show check groups with their state and call counts
//! - `kiln checks enable` - Enable check groups in the vendored manifest
//! - `kiln checks disable` - Disable check groups in the vendored manifest
//! - `kiln checks count` - Count check call sites per group
//! - `kiln simd set-path` - Pin every SIMD guard to one dispatch path
//! - `kiln simd const-eval` - Pin the constant-folding guard
//! - `kiln simd testing` - Toggle the `testing` feature of the project
//! - `kiln simd release` - Undo every override for a release build
//!
//! # Configuration (kiln.toml, optional)
//!
//! ```toml
//! [checks]
//! manifest = "vendor/kiln-devtools/Cargo.toml"
//!
//! [scan]
//! exclude = ["third_party"]
//!
//! [simd]
//! root = "src/simd"
//! ```

mod checks;
mod config;
mod scan;
mod simd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

/// Kiln CLI - project tooling for Kiln safety checks
#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Project tooling for Kiln safety checks and SIMD guards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and toggle safety check groups
    Checks {
        #[command(subcommand)]
        command: checks::ChecksCommand,
    },

    /// Rewrite SIMD guard call sites
    Simd {
        #[command(subcommand)]
        command: simd::SimdCommand,
    },
}

/// Arguments shared by commands that operate on a project tree
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project root directory
    #[arg(long, default_value = ".")]
    pub project: PathBuf,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Checks { command } => checks::execute(command),
        Commands::Simd { command } => simd::execute(command),
    }
}
