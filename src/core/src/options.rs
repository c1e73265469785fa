//! Resolved build configuration consumed by the image-build engine.
//!
//! A [`BuildOptions`] value is produced once per invocation and never mutated
//! afterwards.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::CommonBuildOptions;
use crate::crypto::{DecryptConfig, EncryptConfig};
use crate::error::{BuildError, Result};
use crate::log::BuildStreams;
use crate::namespace::{IdMappingOptions, NamespaceOptions, NetworkPolicy};
use crate::system::{Platform, SystemContext};

/// Manifest media type for OCI v1 images.
pub const OCI_V1_IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// Manifest media type for Docker v2 schema 2 images.
pub const DOCKER_V2_IMAGE_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// When the build engine should fetch base images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullPolicy {
    /// Pull only when no local copy exists (default).
    #[default]
    IfMissing,
    /// Pull when the registry has a newer image.
    IfNewer,
    /// Always pull.
    Always,
    /// Never pull, use local storage only.
    Never,
}

impl std::fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IfMissing => write!(f, "missing"),
            Self::IfNewer => write!(f, "newer"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Output image format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Oci,
    Docker,
}

impl ImageFormat {
    /// Manifest media type written for this format.
    pub fn manifest_type(&self) -> &'static str {
        match self {
            Self::Oci => OCI_V1_IMAGE_MANIFEST,
            Self::Docker => DOCKER_V2_IMAGE_MANIFEST,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oci => write!(f, "oci"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "oci" => Ok(Self::Oci),
            "docker" => Ok(Self::Docker),
            _ => Err(BuildError::malformed("unrecognized image type", s)),
        }
    }
}

/// Layer blob compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Uncompressed,
    Gzip,
}

/// How RUN instructions are isolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Isolation {
    #[default]
    Oci,
    OciRootless,
    Chroot,
}

impl std::fmt::Display for Isolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oci => write!(f, "oci"),
            Self::OciRootless => write!(f, "rootless"),
            Self::Chroot => write!(f, "chroot"),
        }
    }
}

impl std::str::FromStr for Isolation {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oci" | "default" => Ok(Self::Oci),
            "rootless" => Ok(Self::OciRootless),
            "chroot" => Ok(Self::Chroot),
            _ => Err(BuildError::malformed("unrecognized isolation type", s)),
        }
    }
}

/// Where the final image contents are exported in addition to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "dest")]
pub enum BuildOutput {
    /// Write the root filesystem into a local directory.
    Local(PathBuf),
    /// Write a tar archive to a file.
    Tar(PathBuf),
    /// Write a tar archive to standard output.
    Stdout,
}

impl BuildOutput {
    pub fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }
}

/// A named build context usable from the build description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum AdditionalBuildContext {
    /// Absolute local directory
    Local(PathBuf),
    /// Remote archive or repository, fetched by the engine
    Url(String),
    /// Image whose root filesystem is used as the context
    Image(String),
}

/// Fully resolved build configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOptions {
    /// Symlink-resolved absolute build context directory
    pub context_directory: PathBuf,
    pub pull_policy: PullPolicy,
    /// Primary output reference (first `--tag`)
    pub output: Option<String>,
    pub additional_tags: Vec<String>,
    pub manifest: Option<String>,
    /// Build-time variables
    pub args: HashMap<String, String>,
    pub additional_build_contexts: HashMap<String, AdditionalBuildContext>,
    pub output_format: ImageFormat,
    pub layers: bool,
    pub no_cache: bool,
    pub remove_intermediate_ctrs: bool,
    pub force_rm_intermediate_ctrs: bool,
    pub compression: Compression,
    pub isolation: Isolation,
    pub runtime: String,
    pub runtime_args: Vec<String>,
    pub system_context: SystemContext,
    pub common_build_opts: CommonBuildOptions,
    pub namespace_options: NamespaceOptions,
    pub configure_network: NetworkPolicy,
    pub id_mapping_options: IdMappingOptions,
    pub platforms: Vec<Platform>,
    pub all_platforms: bool,
    #[serde(skip)]
    pub oci_decrypt_config: DecryptConfig,
    #[serde(skip)]
    pub oci_encrypt_config: Option<EncryptConfig>,
    pub oci_encrypt_layers: Option<Vec<i32>>,
    pub streams: BuildStreams,
    pub quiet: bool,
    /// Fixed creation timestamp for reproducible images
    pub timestamp: Option<DateTime<Utc>>,
    pub max_pull_push_retries: u32,
    pub pull_push_retry_delay: Duration,
    /// Patterns excluded from the context
    pub excludes: Vec<String>,
    pub ignore_file: Option<PathBuf>,
    pub build_output: Option<BuildOutput>,
    pub labels: Vec<String>,
    pub annotations: Vec<String>,
    pub add_capabilities: Vec<String>,
    pub drop_capabilities: Vec<String>,
    pub devices: Vec<String>,
    pub iid_file: Option<PathBuf>,
    pub sign_by: Option<String>,
    pub signature_policy_path: Option<PathBuf>,
    pub squash: bool,
    /// Final stage to build
    pub target: Option<String>,
    /// Base image override for the first stage
    pub from: Option<String>,
    pub transient_mounts: Vec<String>,
    pub jobs: usize,
    pub log_file: Option<PathBuf>,
    pub log_split_by_platform: bool,
    pub log_rusage: bool,
    pub rusage_log_file: Option<PathBuf>,
    pub cni_config_dir: Option<PathBuf>,
    pub cni_plugin_path: Option<String>,
    pub blob_directory: Option<PathBuf>,
    pub cpp_flags: Vec<String>,
    pub envs: Vec<String>,
    pub unset_envs: Vec<String>,
    pub os_features: Vec<String>,
    pub os_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_from_str() {
        assert_eq!("oci".parse::<ImageFormat>().unwrap(), ImageFormat::Oci);
        assert_eq!("docker".parse::<ImageFormat>().unwrap(), ImageFormat::Docker);
        let err = "v2s1".parse::<ImageFormat>().unwrap_err();
        assert!(err.to_string().contains("unrecognized image type"));
    }

    #[test]
    fn test_image_format_manifest_type() {
        assert_eq!(ImageFormat::Oci.manifest_type(), OCI_V1_IMAGE_MANIFEST);
        assert_eq!(ImageFormat::Docker.manifest_type(), DOCKER_V2_IMAGE_MANIFEST);
    }

    #[test]
    fn test_isolation_from_str() {
        assert_eq!("oci".parse::<Isolation>().unwrap(), Isolation::Oci);
        assert_eq!("default".parse::<Isolation>().unwrap(), Isolation::Oci);
        assert_eq!("Rootless".parse::<Isolation>().unwrap(), Isolation::OciRootless);
        assert_eq!("chroot".parse::<Isolation>().unwrap(), Isolation::Chroot);
        assert!("vm".parse::<Isolation>().is_err());
    }

    #[test]
    fn test_pull_policy_display() {
        assert_eq!(PullPolicy::default().to_string(), "missing");
        assert_eq!(PullPolicy::IfNewer.to_string(), "newer");
        assert_eq!(PullPolicy::Never.to_string(), "never");
    }

    #[test]
    fn test_build_output_serialization() {
        let json = serde_json::to_string(&BuildOutput::Tar(PathBuf::from("/tmp/out.tar"))).unwrap();
        assert_eq!(json, r#"{"type":"tar","dest":"/tmp/out.tar"}"#);
        assert!(BuildOutput::Stdout.is_stdout());
    }
}
