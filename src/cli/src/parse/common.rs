//! Resource, DNS, security and mount settings shared by RUN steps.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{CommonBuildOptions, SecretSource, Ulimit};

use crate::build::inputs::FromAndBudInputs;

const ULIMIT_NAMES: [&str; 15] = [
    "core",
    "cpu",
    "data",
    "fsize",
    "locks",
    "memlock",
    "msgqueue",
    "nice",
    "nofile",
    "nproc",
    "rss",
    "rtprio",
    "rttime",
    "sigpending",
    "stack",
];

/// Build the common options.
///
/// `lookup` resolves environment variables (used to type secrets) and `cwd`
/// anchors relative secret sources.
pub fn common_build_options<F>(
    inputs: &FromAndBudInputs,
    lookup: F,
    cwd: &Path,
) -> Result<CommonBuildOptions>
where
    F: Fn(&str) -> Option<String>,
{
    let memory = inputs
        .memory
        .as_deref()
        .map(|v| {
            signed_size(v).ok_or_else(|| BuildError::malformed("invalid value for memory", v))
        })
        .transpose()?;

    let memory_swap = inputs
        .memory_swap
        .as_deref()
        .map(|v| {
            if v.trim() == "-1" {
                return Ok(-1);
            }
            signed_size(v)
                .ok_or_else(|| BuildError::malformed("invalid value for memory-swap", v))
        })
        .transpose()?;

    let shm_size = inputs
        .shm_size
        .as_deref()
        .map(|v| parse_size(v).map_err(|_| BuildError::malformed("invalid --shm-size", v)))
        .transpose()?;

    check_dns(inputs)?;
    for host in &inputs.add_host {
        validate_extra_host(host)?;
    }
    for volume in &inputs.volume {
        validate_volume(volume)?;
    }

    let mut opts = CommonBuildOptions {
        add_host: inputs.add_host.clone(),
        cgroup_parent: inputs.cgroup_parent.clone(),
        cpu_period: inputs.cpu_period,
        cpu_quota: inputs.cpu_quota,
        cpu_shares: inputs.cpu_shares,
        cpuset_cpus: inputs.cpuset_cpus.clone(),
        cpuset_mems: inputs.cpuset_mems.clone(),
        dns_servers: inputs.dns.clone(),
        dns_search: inputs.dns_search.clone(),
        dns_options: inputs.dns_option.clone(),
        http_proxy: inputs.http_proxy.unwrap_or(true),
        memory,
        memory_swap,
        shm_size,
        ulimit: inputs
            .ulimit
            .iter()
            .map(|u| parse_ulimit(u))
            .collect::<Result<_>>()?,
        volumes: inputs.volume.clone(),
        secrets: secrets(&inputs.secret, &lookup, cwd)?,
        ssh_sources: inputs.ssh.clone(),
        identity_label: inputs.identity_label,
        ..Default::default()
    };
    apply_security_opts(&mut opts, &inputs.security_opt)?;
    Ok(opts)
}

/// A size that must also fit the signed limit fields.
fn signed_size(value: &str) -> Option<i64> {
    parse_size(value).ok().and_then(|n| i64::try_from(n).ok())
}

/// Parse a size like `512m`, `2g` or `4096` into bytes (binary units).
pub fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err("empty size value".to_string());
    }
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }

    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    let unit_start = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("invalid size value: {s}"))?;
    let (num, unit) = s.split_at(unit_start);
    let multiplier = match unit.trim() {
        "b" => 1,
        "k" | "kb" | "kib" => KB,
        "m" | "mb" | "mib" => MB,
        "g" | "gb" | "gib" => GB,
        "t" | "tb" | "tib" => TB,
        _ => return Err(format!("unrecognized size unit: {s}")),
    };
    let n: u64 = num.parse().map_err(|_| format!("invalid size value: {s}"))?;
    n.checked_mul(multiplier)
        .ok_or_else(|| format!("size out of range: {s}"))
}

fn check_dns(inputs: &FromAndBudInputs) -> Result<()> {
    let no_dns = inputs.dns.iter().any(|s| s.eq_ignore_ascii_case("none"));
    if no_dns {
        if inputs.dns.len() > 1 {
            return Err(BuildError::conflict(
                "invalid --dns, --dns=none may not be used with any other --dns options",
            ));
        }
        if !inputs.dns_search.is_empty() {
            return Err(BuildError::conflict(
                "invalid --dns-search, --dns-search may not be used with --dns=none",
            ));
        }
        if !inputs.dns_option.is_empty() {
            return Err(BuildError::conflict(
                "invalid --dns-option, --dns-option may not be used with --dns=none",
            ));
        }
        return Ok(());
    }
    for server in &inputs.dns {
        server
            .parse::<IpAddr>()
            .map_err(|_| BuildError::malformed("invalid --dns server address", server.as_str()))?;
    }
    Ok(())
}

fn validate_extra_host(value: &str) -> Result<()> {
    let valid = match value.split_once(':') {
        Some((host, ip)) => {
            !host.is_empty() && (ip == "host-gateway" || ip.parse::<IpAddr>().is_ok())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(BuildError::malformed("invalid --add-host, expected HOST:IP", value))
    }
}

fn validate_volume(value: &str) -> Result<()> {
    let parts: Vec<&str> = value.split(':').collect();
    let valid = matches!(parts.len(), 2 | 3)
        && !parts[0].is_empty()
        && Path::new(parts[1]).is_absolute();
    if valid {
        Ok(())
    } else {
        Err(BuildError::malformed(
            "incorrect volume format, should be host-dir:ctr-dir[:option]",
            value,
        ))
    }
}

/// Parse `name=soft[:hard]`; `-1` means unlimited.
pub fn parse_ulimit(value: &str) -> Result<Ulimit> {
    let malformed = || BuildError::malformed("invalid ulimit, expected name=soft[:hard]", value);
    let (name, limits) = value.split_once('=').ok_or_else(malformed)?;
    if !ULIMIT_NAMES.contains(&name) {
        return Err(BuildError::malformed("invalid ulimit type", value));
    }
    let (soft, hard) = match limits.split_once(':') {
        Some((soft, hard)) => (soft, hard),
        None => (limits, limits),
    };
    let soft: i64 = soft.parse().map_err(|_| malformed())?;
    let hard: i64 = hard.parse().map_err(|_| malformed())?;
    if soft != -1 && hard != -1 && soft > hard {
        return Err(BuildError::malformed(
            "ulimit soft limit must be less than or equal to hard limit",
            value,
        ));
    }
    Ok(Ulimit {
        name: name.to_string(),
        soft,
        hard,
    })
}

fn secrets<F>(raw: &[String], lookup: &F, cwd: &Path) -> Result<BTreeMap<String, SecretSource>>
where
    F: Fn(&str) -> Option<String>,
{
    const SYNTAX: &str =
        "incorrect secret flag format: should be --secret id=foo,src=bar[,env=ENV][,type=file|env]";

    let mut parsed = BTreeMap::new();
    for secret in raw {
        let mut id = None;
        let mut src = None;
        let mut kind = None;
        for token in secret.split(',') {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| BuildError::malformed(SYNTAX, secret.as_str()))?;
            match key {
                "id" => id = Some(value),
                "src" => src = Some(value),
                "env" => {
                    src = Some(value);
                    kind = Some("env");
                }
                "type" => match value {
                    "file" | "env" => kind = Some(value),
                    _ => {
                        return Err(BuildError::malformed(
                            "invalid secret type, must be file or env",
                            secret.as_str(),
                        ))
                    }
                },
                _ => return Err(BuildError::malformed(SYNTAX, secret.as_str())),
            }
        }

        let id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BuildError::malformed(SYNTAX, secret.as_str()))?;
        let src = src.unwrap_or(id);
        let kind = kind.unwrap_or(if lookup(id).is_some() { "env" } else { "file" });

        let source = if kind == "env" {
            SecretSource::Env(src.to_string())
        } else {
            let path = cwd.join(src);
            std::fs::metadata(&path)
                .map_err(|e| BuildError::acquisition("could not parse secrets", e))?;
            SecretSource::File(path)
        };
        parsed.insert(id.to_string(), source);
    }
    Ok(parsed)
}

fn apply_security_opts(opts: &mut CommonBuildOptions, raw: &[String]) -> Result<()> {
    for opt in raw {
        if opt == "no-new-privileges" {
            opts.no_new_privileges = true;
            continue;
        }
        let (key, value) = opt.split_once('=').ok_or_else(|| {
            BuildError::malformed("invalid --security-opt name=value pair", opt.as_str())
        })?;
        match key {
            "label" => opts.label_opts.push(value.to_string()),
            "apparmor" => opts.apparmor_profile = Some(value.to_string()),
            "seccomp" => opts.seccomp_profile_path = Some(value.to_string()),
            _ => {
                return Err(BuildError::malformed(
                    "invalid --security-opt",
                    opt.as_str(),
                ))
            }
        }
    }
    Ok(())
}
