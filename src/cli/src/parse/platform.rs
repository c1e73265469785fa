//! Target platform selection.

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::Platform;

use crate::build::inputs::BudInputs;

/// Platforms to build for.
///
/// `--platform` entries (comma separated, repeatable) take precedence; without
/// them a single platform is formed from `--os`/`--arch`/`--variant`, with the
/// host filling whatever was not given.
pub fn platforms(bud: &BudInputs) -> Result<Vec<Platform>> {
    let specs: Vec<&str> = bud
        .platform
        .iter()
        .flat_map(|p| p.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let overrides = bud.os.is_some() || bud.arch.is_some() || bud.variant.is_some();

    if !bud.platform.is_empty() {
        if overrides {
            return Err(BuildError::conflict(
                "can't specify --os, --arch, or --variant along with --platform",
            ));
        }
        if specs.is_empty() {
            return Err(BuildError::malformed("no platform specified", bud.platform.join(",")));
        }
        return specs
            .into_iter()
            .map(|spec| {
                spec.parse::<Platform>()
                    .map_err(|e| BuildError::delegated(format!("unable to parse platform {spec:?}"), e))
            })
            .collect();
    }

    let host = Platform::host();
    Ok(vec![Platform {
        os: bud.os.clone().unwrap_or(host.os),
        arch: bud.arch.clone().unwrap_or(host.arch),
        variant: bud.variant.clone().or(host.variant),
    }])
}
