//! Build arguments and the additional build-context map.

use std::collections::HashMap;
use std::path::Path;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::AdditionalBuildContext;

use crate::parse::additional_context::additional_build_context;

/// Merge `--build-arg` values in order.
///
/// `KEY=VALUE` sets the key (the value may itself contain `=`). A bare `KEY`
/// takes the value of the environment variable of that name, or removes any
/// earlier entry when the variable is unset.
pub fn build_args<F>(raw: &[String], lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut args = HashMap::new();
    for arg in raw {
        match arg.split_once('=') {
            Some((key, value)) => {
                args.insert(key.to_string(), value.to_string());
            }
            None => match lookup(arg) {
                Some(value) => {
                    args.insert(arg.clone(), value);
                }
                None => {
                    args.remove(arg);
                }
            },
        }
    }
    args
}

/// Parse `--build-context NAME=VALUE` entries into a map keyed by name.
pub fn build_contexts(
    raw: &[String],
    cwd: &Path,
) -> Result<HashMap<String, AdditionalBuildContext>> {
    let mut contexts = HashMap::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once('=') else {
            return Err(BuildError::malformed(
                "while parsing additional build context, accepts value in the form of key=value",
                entry.as_str(),
            ));
        };
        let context = additional_build_context(value, cwd)
            .map_err(|e| BuildError::delegated("while parsing additional build context", e))?;
        contexts.insert(name.to_string(), context);
    }
    Ok(contexts)
}
