//! `a3s-build version` command.

use clap::Args;

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("a3s-build version {}", a3s_build_core::VERSION);
    Ok(())
}
