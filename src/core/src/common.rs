//! Resource, DNS and mount settings shared by every RUN step of a build.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// A process resource limit, `name=soft[:hard]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ulimit {
    pub name: String,
    pub soft: i64,
    pub hard: i64,
}

/// Where a build secret is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "source")]
pub enum SecretSource {
    File(PathBuf),
    Env(String),
}

/// Options applied to every container created while building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommonBuildOptions {
    /// Extra `/etc/hosts` entries as `host:ip`
    pub add_host: Vec<String>,
    pub cgroup_parent: Option<String>,
    pub cpu_period: Option<u64>,
    pub cpu_quota: Option<i64>,
    pub cpu_shares: Option<u64>,
    pub cpuset_cpus: Option<String>,
    pub cpuset_mems: Option<String>,
    pub dns_servers: Vec<String>,
    pub dns_search: Vec<String>,
    pub dns_options: Vec<String>,
    pub http_proxy: bool,
    /// Memory limit in bytes
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes, `-1` for unlimited
    pub memory_swap: Option<i64>,
    /// Size of `/dev/shm` in bytes
    pub shm_size: Option<u64>,
    pub ulimit: Vec<Ulimit>,
    pub volumes: Vec<String>,
    pub label_opts: Vec<String>,
    pub seccomp_profile_path: Option<String>,
    pub apparmor_profile: Option<String>,
    pub no_new_privileges: bool,
    pub secrets: BTreeMap<String, SecretSource>,
    pub ssh_sources: Vec<String>,
    pub identity_label: Option<bool>,
}
