//! Registry and platform context for pulls and pushes.

use std::path::PathBuf;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{Platform, RegistryCredentials, SystemContext};

use crate::build::inputs::BudInputs;

/// Build the system context.
///
/// `auth_file` is the already checked (and possibly mirrored) auth file.
/// When exactly one platform was requested with `--platform`, it also sets
/// the OS, architecture and variant choices.
pub fn system_context(
    bud: &BudInputs,
    auth_file: Option<PathBuf>,
    platforms: &[Platform],
) -> Result<SystemContext> {
    let credentials = bud.creds.as_deref().map(credentials).transpose()?;

    let mut ctx = SystemContext {
        auth_file_path: auth_file,
        cert_dir: bud.cert_dir.clone(),
        docker_insecure_skip_tls_verify: bud.tls_verify.map(|verify| !verify),
        credentials,
        signature_policy_path: bud.signature_policy.clone(),
        registries_conf_path: bud.registries_conf.clone(),
        os_choice: bud.os.clone(),
        arch_choice: bud.arch.clone(),
        variant_choice: bud.variant.clone(),
    };

    if let [platform] = platforms {
        if !bud.platform.is_empty() {
            ctx.os_choice = Some(platform.os.clone());
            ctx.arch_choice = Some(platform.arch.clone());
            ctx.variant_choice = platform.variant.clone();
        }
    }
    Ok(ctx)
}

/// Parse `USERNAME:PASSWORD`.
pub fn credentials(creds: &str) -> Result<RegistryCredentials> {
    match creds.split_once(':') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            Ok(RegistryCredentials {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        _ => Err(BuildError::malformed(
            "credentials must be USERNAME:PASSWORD",
            redact(creds),
        )),
    }
}

fn redact(creds: &str) -> String {
    match creds.split_once(':') {
        Some((username, _)) => format!("{username}:***"),
        None => creds.to_string(),
    }
}
