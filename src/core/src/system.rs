//! Target platforms and the registry/system context handed to the engine.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{BuildError, Result};

/// A target platform, `os/arch[/variant]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
    pub variant: Option<String>,
}

impl Platform {
    /// Platform of the running host, using OCI architecture names.
    pub fn host() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "powerpc64" => "ppc64le",
            other => other,
        };
        Self {
            os: std::env::consts::OS.to_string(),
            arch: arch.to_string(),
            variant: None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)?;
        if let Some(ref variant) = self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let valid = (2..=3).contains(&parts.len()) && parts.iter().all(|p| !p.is_empty());
        if !valid {
            return Err(BuildError::malformed(
                "invalid platform, expected os/arch[/variant]",
                s,
            ));
        }
        Ok(Self {
            os: parts[0].to_ascii_lowercase(),
            arch: parts[1].to_ascii_lowercase(),
            variant: parts.get(2).map(|v| v.to_ascii_lowercase()),
        })
    }
}

/// Registry credentials from `--creds`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegistryCredentials {
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registry and platform context used for pulls and pushes during the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemContext {
    pub auth_file_path: Option<PathBuf>,
    pub cert_dir: Option<PathBuf>,
    /// `Some(true)` when `--tls-verify=false` was given
    pub docker_insecure_skip_tls_verify: Option<bool>,
    pub credentials: Option<RegistryCredentials>,
    pub signature_policy_path: Option<PathBuf>,
    pub registries_conf_path: Option<PathBuf>,
    pub os_choice: Option<String>,
    pub arch_choice: Option<String>,
    pub variant_choice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        let p: Platform = "linux/arm64/v8".parse().unwrap();
        assert_eq!(p.os, "linux");
        assert_eq!(p.arch, "arm64");
        assert_eq!(p.variant.as_deref(), Some("v8"));
        assert_eq!(p.to_string(), "linux/arm64/v8");
    }

    #[test]
    fn test_platform_parse_without_variant() {
        let p: Platform = "Linux/AMD64".parse().unwrap();
        assert_eq!(p.to_string(), "linux/amd64");
    }

    #[test]
    fn test_platform_parse_invalid() {
        assert!("linux".parse::<Platform>().is_err());
        assert!("linux//v7".parse::<Platform>().is_err());
        assert!("a/b/c/d".parse::<Platform>().is_err());
    }

    #[test]
    fn test_host_platform_uses_oci_arch_names() {
        let host = Platform::host();
        assert_ne!(host.arch, "x86_64");
        assert_ne!(host.arch, "aarch64");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = RegistryCredentials {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
    }
}
