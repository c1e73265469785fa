//! `a3s-build build` command: resolve the configuration of an image build.
//!
//! Loads the user's build defaults, resolves the flags and context argument,
//! and prints the resulting configuration. Temporary files created while
//! resolving (staged remote contexts, mirrored auth files) are removed before
//! the command returns.

use clap::Args;

use a3s_build_core::BuildDefaults;

use crate::build::cleanup::CleanupList;
use crate::build::inputs::BuildInputs;
use crate::build::BuildResolver;

#[derive(Args)]
pub struct BuildArgs {
    /// Build context: directory, file, URL, git repository, or "-" for stdin
    #[arg(value_name = "CONTEXT")]
    pub context: Vec<String>,

    /// Print the resolved configuration as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub inputs: BuildInputs,
}

pub async fn execute(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = BuildDefaults::load_or_default()?;
    let resolver = BuildResolver::new(defaults)?;

    let mut cleanup = CleanupList::new();
    let result = resolver
        .resolve(&args.context, &args.inputs, &mut cleanup)
        .await;
    let resolved = match result {
        Ok(resolved) => resolved,
        Err(e) => {
            cleanup.remove_all();
            return Err(e.into());
        }
    };

    if args.json {
        let json = serde_json::json!({
            "containerfiles": resolved.containerfiles,
            "options": resolved.options,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", crate::output::build_table(&resolved));
    }

    cleanup.remove_all();
    Ok(())
}
