//! CLI command definitions and dispatch.

mod build;
mod version;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A3S Build: resolve image build configurations.
#[derive(Parser)]
#[command(name = "a3s-build", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Resolve the configuration for building an image from a Containerfile
    Build(build::BuildArgs),
    /// Show version information
    Version(version::VersionArgs),
}

impl Cli {
    /// Log file requested for this invocation, if any.
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.command {
            Command::Build(args) => args.inputs.bud.logfile.clone(),
            Command::Version(_) => None,
        }
    }
}

/// Dispatch a parsed CLI command to its handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build(args) => build::execute(args).await,
        Command::Version(args) => version::execute(args).await,
    }
}
