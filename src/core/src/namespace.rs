//! Namespace and user-namespace ID mapping configuration.

use std::path::PathBuf;

use serde::Serialize;

/// Configuration for a single Linux namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceOption {
    /// Namespace name: "ipc", "network", "pid", "uts", "cgroup" or "user"
    pub name: String,
    /// Share the host's namespace
    pub host: bool,
    /// Join an existing namespace at this path
    pub path: Option<PathBuf>,
}

impl NamespaceOption {
    pub fn host(name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: true,
            path: None,
        }
    }

    pub fn private(name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: false,
            path: None,
        }
    }

    pub fn joined(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            host: false,
            path: Some(path.into()),
        }
    }
}

/// Ordered set of namespace options, at most one per name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceOptions(Vec<NamespaceOption>);

impl NamespaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert each option, replacing an existing entry with the same name.
    pub fn add_or_replace(&mut self, options: impl IntoIterator<Item = NamespaceOption>) {
        for option in options {
            match self.0.iter_mut().find(|o| o.name == option.name) {
                Some(existing) => *existing = option,
                None => self.0.push(option),
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<&NamespaceOption> {
        self.0.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespaceOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Whether RUN instructions get a configured network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPolicy {
    #[default]
    Default,
    Disabled,
    Enabled,
}

/// One contiguous range of a user-namespace ID mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdMap {
    pub container_id: u32,
    pub host_id: u32,
    pub size: u32,
}

impl std::fmt::Display for IdMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.container_id, self.host_id, self.size)
    }
}

/// User-namespace ID mapping for build containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdMappingOptions {
    pub host_uid_mapping: bool,
    pub host_gid_mapping: bool,
    pub uid_map: Vec<IdMap>,
    pub gid_map: Vec<IdMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_or_replace_replaces_by_name() {
        let mut opts = NamespaceOptions::new();
        opts.add_or_replace([NamespaceOption::private("ipc"), NamespaceOption::private("pid")]);
        opts.add_or_replace([NamespaceOption::host("pid")]);
        assert_eq!(opts.len(), 2);
        assert!(opts.find("pid").unwrap().host);
        assert!(!opts.find("ipc").unwrap().host);
    }

    #[test]
    fn test_add_or_replace_keeps_order() {
        let mut opts = NamespaceOptions::new();
        opts.add_or_replace([NamespaceOption::private("uts")]);
        opts.add_or_replace([NamespaceOption::joined("user", "/proc/1/ns/user")]);
        let names: Vec<&str> = opts.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["uts", "user"]);
    }

    #[test]
    fn test_id_map_display() {
        let map = IdMap {
            container_id: 0,
            host_id: 100000,
            size: 65536,
        };
        assert_eq!(map.to_string(), "0:100000:65536");
    }
}
