//! User namespace and ID mapping options.

use std::path::{Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{IdMap, IdMappingOptions, NamespaceOption};

use crate::build::inputs::UserNsInputs;

/// Locations of the subordinate ID files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubIdFiles {
    pub subuid: PathBuf,
    pub subgid: PathBuf,
}

impl Default for SubIdFiles {
    fn default() -> Self {
        Self {
            subuid: PathBuf::from("/etc/subuid"),
            subgid: PathBuf::from("/etc/subgid"),
        }
    }
}

/// User namespace option and ID mappings.
///
/// Name-based mappings from the subordinate ID files come first, followed by
/// explicit `--userns-uid-map`/`--userns-gid-map` ranges. When only one of
/// the two maps ends up populated the other copies it. Mappings imply a
/// private user namespace unless `--userns` says otherwise; mappings together
/// with `--userns=host` are a conflict.
pub fn id_mapping_options(
    inputs: &UserNsInputs,
    subid: &SubIdFiles,
) -> Result<(NamespaceOption, IdMappingOptions)> {
    let user = inputs
        .userns_uid_map_user
        .clone()
        .or_else(|| inputs.userns_gid_map_group.clone());
    let group = inputs
        .userns_gid_map_group
        .clone()
        .or_else(|| inputs.userns_uid_map_user.clone());

    let mut uid_map = Vec::new();
    let mut gid_map = Vec::new();
    if let (Some(user), Some(group)) = (&user, &group) {
        uid_map = subordinate_ranges(&subid.subuid, user)?;
        gid_map = subordinate_ranges(&subid.subgid, group)?;
    }
    uid_map.extend(parse_id_maps(&inputs.userns_uid_map)?);
    gid_map.extend(parse_id_maps(&inputs.userns_gid_map)?);

    if uid_map.is_empty() && !gid_map.is_empty() {
        uid_map = gid_map.clone();
    }
    if gid_map.is_empty() && !uid_map.is_empty() {
        gid_map = uid_map.clone();
    }

    let mut userns = if uid_map.is_empty() && gid_map.is_empty() {
        NamespaceOption::host("user")
    } else {
        NamespaceOption::private("user")
    };

    if let Some(how) = inputs.userns.as_deref() {
        match how {
            "" | "container" | "private" => userns = NamespaceOption::private("user"),
            "host" => userns = NamespaceOption::host("user"),
            other => {
                let path = other.strip_prefix("ns:").unwrap_or(other);
                std::fs::metadata(path)
                    .map_err(|e| BuildError::acquisition("checking user namespace", e))?;
                tracing::debug!(path, "Joining user namespace");
                userns = NamespaceOption::joined("user", path);
            }
        }
    }

    if userns.host && !(uid_map.is_empty() && gid_map.is_empty()) {
        return Err(BuildError::conflict(
            "can not specify ID mappings while using host's user namespace",
        ));
    }

    let options = IdMappingOptions {
        host_uid_mapping: userns.host,
        host_gid_mapping: userns.host,
        uid_map,
        gid_map,
    };
    Ok((userns, options))
}

/// Parse `container:host:size` triples, comma separated, repeatable.
pub fn parse_id_maps(values: &[String]) -> Result<Vec<IdMap>> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_id_map)
        .collect()
}

fn parse_id_map(triple: &str) -> Result<IdMap> {
    let fields: Vec<&str> = triple.split(':').collect();
    let parsed: Option<Vec<u32>> = fields.iter().map(|f| f.parse().ok()).collect();
    match parsed.as_deref() {
        Some(&[container_id, host_id, size]) if size > 0 => Ok(IdMap {
            container_id,
            host_id,
            size,
        }),
        _ => Err(BuildError::malformed(
            "error parsing ID mapping, expected container:host:size",
            triple,
        )),
    }
}

/// Ranges for `name` in a subordinate ID file, mapped to consecutive
/// container IDs starting at 0.
pub fn subordinate_ranges(file: &Path, name: &str) -> Result<Vec<IdMap>> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| BuildError::acquisition(format!("reading {}", file.display()), e))?;

    let mut maps = Vec::new();
    let mut next_container_id: u32 = 0;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(':');
        let (Some(owner), Some(start), Some(count)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if owner != name {
            continue;
        }
        let (Ok(host_id), Ok(size)) = (start.parse::<u32>(), count.parse::<u32>()) else {
            return Err(BuildError::malformed(
                format!("invalid entry in {}", file.display()),
                line,
            ));
        };
        maps.push(IdMap {
            container_id: next_container_id,
            host_id,
            size,
        });
        next_container_id = next_container_id.saturating_add(size);
    }

    if maps.is_empty() {
        return Err(BuildError::acquisition_msg(format!(
            "no subordinate ID ranges found for {name:?} in {}",
            file.display()
        )));
    }
    Ok(maps)
}
