//! `--ipc`, `--network`, `--pid`, `--uts` and `--cgroupns`.

use std::path::Path;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{NamespaceOption, NamespaceOptions, NetworkPolicy};

use crate::build::inputs::NamespaceInputs;

/// Namespace options and the network policy implied by `--network`.
///
/// Each flag accepts `host`, `private` (or `container`, or empty), `ns:<path>`
/// or a path to an existing namespace. `--network=none` disables networking;
/// any other non-path `--network` value is kept as a network list.
pub fn namespace_options(inputs: &NamespaceInputs) -> Result<(NamespaceOptions, NetworkPolicy)> {
    let mut options = NamespaceOptions::new();
    let mut policy = NetworkPolicy::Default;

    let flags = [
        ("cgroup", &inputs.cgroupns),
        ("ipc", &inputs.ipc),
        ("network", &inputs.network),
        ("pid", &inputs.pid),
        ("uts", &inputs.uts),
    ];

    for (name, value) in flags {
        let Some(how) = value.as_deref() else {
            continue;
        };
        let is_network = name == "network";

        let option = match how {
            "" | "container" | "private" => NamespaceOption::private(name),
            "host" => NamespaceOption::host(name),
            "none" if is_network => {
                tracing::debug!("Network disabled");
                options.add_or_replace([NamespaceOption::private(name)]);
                policy = NetworkPolicy::Disabled;
                continue;
            }
            other => {
                let target = other.strip_prefix("ns:").unwrap_or(other);
                if Path::new(target).is_absolute() || !is_network {
                    std::fs::metadata(target).map_err(|e| {
                        BuildError::acquisition(format!("checking {name} namespace"), e)
                    })?;
                }
                NamespaceOption::joined(name, target)
            }
        };

        tracing::debug!(namespace = name, value = how, "Namespace setting");
        if is_network {
            policy = NetworkPolicy::Enabled;
        }
        options.add_or_replace([option]);
    }

    Ok((options, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_no_flags() {
        let (options, policy) = namespace_options(&NamespaceInputs::default()).unwrap();
        assert!(options.is_empty());
        assert_eq!(policy, NetworkPolicy::Default);
    }

    #[test]
    fn test_host_and_private() {
        let inputs = NamespaceInputs {
            ipc: Some("host".to_string()),
            pid: Some("private".to_string()),
            cgroupns: Some("host".to_string()),
            ..Default::default()
        };
        let (options, policy) = namespace_options(&inputs).unwrap();
        assert_eq!(options.len(), 3);
        assert!(options.find("ipc").unwrap().host);
        assert!(!options.find("pid").unwrap().host);
        assert!(options.find("cgroup").unwrap().host);
        assert_eq!(policy, NetworkPolicy::Default);
    }

    #[test]
    fn test_network_none_disables() {
        let inputs = NamespaceInputs {
            network: Some("none".to_string()),
            ..Default::default()
        };
        let (options, policy) = namespace_options(&inputs).unwrap();
        assert_eq!(policy, NetworkPolicy::Disabled);
        assert!(!options.find("network").unwrap().host);
    }

    #[test]
    fn test_network_host_enables() {
        let inputs = NamespaceInputs {
            network: Some("host".to_string()),
            ..Default::default()
        };
        let (_, policy) = namespace_options(&inputs).unwrap();
        assert_eq!(policy, NetworkPolicy::Enabled);
    }

    #[test]
    fn test_network_list_is_not_a_path() {
        let inputs = NamespaceInputs {
            network: Some("podman,backend".to_string()),
            ..Default::default()
        };
        let (options, _) = namespace_options(&inputs).unwrap();
        assert_eq!(
            options.find("network").unwrap().path,
            Some(PathBuf::from("podman,backend"))
        );
    }

    #[test]
    fn test_namespace_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let ns = dir.path().join("uts");
        std::fs::write(&ns, "").unwrap();

        let inputs = NamespaceInputs {
            uts: Some(format!("ns:{}", ns.display())),
            ..Default::default()
        };
        let (options, _) = namespace_options(&inputs).unwrap();
        assert_eq!(options.find("uts").unwrap().path, Some(ns));

        let inputs = NamespaceInputs {
            ipc: Some("/nonexistent/ns/ipc".to_string()),
            ..Default::default()
        };
        let err = namespace_options(&inputs).unwrap_err();
        assert!(err.to_string().starts_with("checking ipc namespace"));
    }
}
