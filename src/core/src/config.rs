use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};

/// Environment variable naming an alternate defaults file.
pub const CONFIG_ENV: &str = "A3S_BUILD_CONFIG";

/// Default for `--layers` when the flag is not given.
pub const LAYERS_ENV: &str = "A3S_BUILD_LAYERS";

/// Default for `--isolation` when the flag is not given.
pub const ISOLATION_ENV: &str = "A3S_BUILD_ISOLATION";

/// Default for `--format` when the flag is not given.
pub const FORMAT_ENV: &str = "A3S_BUILD_FORMAT";

/// Default registry auth file.
pub const AUTH_FILE_ENV: &str = "REGISTRY_AUTH_FILE";

/// Site and user defaults applied beneath explicit flags.
///
/// Loaded from `~/.a3s/build.yaml` (or the file named by `A3S_BUILD_CONFIG`),
/// then overridden by environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildDefaults {
    /// Cache intermediate images
    pub layers: bool,

    /// Isolation type name (oci, rootless, chroot)
    pub isolation: Option<String>,

    /// Output format name (oci, docker)
    pub format: String,

    /// OCI runtime binary
    pub runtime: String,

    /// Pull/push retry attempts handed to the engine
    pub retry: u32,

    /// Delay between pull/push retries, in seconds
    pub retry_delay_secs: u64,

    /// Parallel stage builds
    pub jobs: usize,

    /// Where remote contexts and mirrored files are staged
    pub temp_dir: Option<PathBuf>,

    /// Timeout for remote context downloads, in seconds (none = wait forever)
    pub fetch_timeout_secs: Option<u64>,

    /// Registry auth file used when `--authfile` is not given
    pub auth_file: Option<PathBuf>,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            layers: false,
            isolation: None,
            format: "oci".to_string(),
            runtime: "runc".to_string(),
            retry: 3,
            retry_delay_secs: 2,
            jobs: 1,
            temp_dir: None,
            fetch_timeout_secs: None,
            auth_file: None,
        }
    }
}

impl BuildDefaults {
    /// `~/.a3s/build.yaml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".a3s"))
            .unwrap_or_else(|| PathBuf::from(".a3s"))
            .join("build.yaml")
    }

    /// Load defaults from a YAML or JSON (`.json`) file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::acquisition(format!("reading build defaults {}", path.display()), e)
        })?;
        let defaults = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(defaults)
    }

    /// Load the user's defaults file if present, then apply the process
    /// environment.
    pub fn load_or_default() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);

        let defaults = if path.exists() {
            tracing::debug!(path = %path.display(), "Loading build defaults");
            Self::load(&path)?
        } else {
            Self::default()
        };

        defaults.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment variables resolved by `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(LAYERS_ENV) {
            self.layers = parse_bool(&value)
                .ok_or_else(|| BuildError::malformed(format!("invalid {LAYERS_ENV}"), value))?;
        }
        if let Some(value) = lookup(ISOLATION_ENV).filter(|v| !v.is_empty()) {
            self.isolation = Some(value);
        }
        if let Some(value) = lookup(FORMAT_ENV).filter(|v| !v.is_empty()) {
            self.format = value;
        }
        if let Some(value) = lookup(AUTH_FILE_ENV).filter(|v| !v.is_empty()) {
            self.auth_file = Some(PathBuf::from(value));
        }
        Ok(self)
    }

    /// Directory used for staging temporary files.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
