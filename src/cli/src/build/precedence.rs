//! Overlapping and interdependent flags.
//!
//! Each check either normalizes a group of flags to one effective value or
//! fails with a conflict naming the flags involved.

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{ImageReference, PullPolicy};

use super::inputs::{BudInputs, LayerInputs};

/// At most one of `--pull`, `--pull-always`, `--pull-never` may be given.
pub fn check_pull_flags(bud: &BudInputs) -> Result<()> {
    let count = [
        bud.pull.is_some(),
        bud.pull_always.is_some(),
        bud.pull_never.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    if count > 1 {
        return Err(BuildError::conflict(
            "can only set one of 'pull' or 'pull-always' or 'pull-never'",
        ));
    }
    Ok(())
}

/// Effective pull policy; `never` beats `always` beats `newer`.
pub fn pull_policy(bud: &BudInputs) -> Result<PullPolicy> {
    let value = bud
        .pull
        .as_deref()
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let from_value = match value.as_str() {
        "" | "false" | "missing" | "ifmissing" => PullPolicy::IfMissing,
        "true" | "newer" | "ifnewer" => PullPolicy::IfNewer,
        "always" => PullPolicy::Always,
        "never" => PullPolicy::Never,
        _ => {
            return Err(BuildError::malformed(
                "unrecognized pull policy",
                bud.pull.clone().unwrap_or_default(),
            ))
        }
    };

    let policy = if bud.pull_never == Some(true) || from_value == PullPolicy::Never {
        PullPolicy::Never
    } else if bud.pull_always == Some(true) || from_value == PullPolicy::Always {
        PullPolicy::Always
    } else {
        from_value
    };

    tracing::debug!(%policy, "Pull policy");
    Ok(policy)
}

/// Output tag and additional tags from `--tag`, validated against `--manifest`.
///
/// No tag may name the manifest list. Every tag and the manifest must be a
/// valid image reference.
pub fn split_tags(tags: &[String], manifest: Option<&str>) -> Result<(Option<String>, Vec<String>)> {
    if let Some(manifest) = manifest {
        if tags.iter().any(|t| t == manifest) {
            return Err(BuildError::conflict(
                "the same name must not be specified for both '--tag' and '--manifest'",
            ));
        }
        ImageReference::parse(manifest)?;
    }
    for tag in tags {
        ImageReference::parse(tag)?;
    }

    let mut iter = tags.iter().cloned();
    let output = iter.next();
    Ok((output, iter.collect()))
}

/// `--rm`/`--force-rm` only make sense alongside `--layers` or `--no-cache`.
pub fn check_rm_flags(layer: &LayerInputs, bud: &BudInputs) -> Result<()> {
    let rm_set = bud.rm.is_some() || layer.force_rm.is_some();
    let cache_set = layer.layers.is_some() || bud.no_cache.is_some();
    if rm_set && !cache_set {
        return Err(BuildError::conflict(
            "'rm' and 'force-rm' can only be set with either 'layers' or 'no-cache'",
        ));
    }
    Ok(())
}

/// `--logsplit` requires `--logfile`.
pub fn check_logsplit(bud: &BudInputs) -> Result<()> {
    if bud.logsplit == Some(true) && bud.logfile.is_none() {
        return Err(BuildError::conflict("cannot use --logsplit without --logfile"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a3s_build_core::ErrorKind;
    use std::path::PathBuf;

    fn bud() -> BudInputs {
        BudInputs::default()
    }

    #[test]
    fn test_pull_flags_single_is_fine() {
        let mut b = bud();
        b.pull_always = Some(true);
        assert!(check_pull_flags(&b).is_ok());
        assert!(check_pull_flags(&bud()).is_ok());
    }

    #[test]
    fn test_pull_flags_conflict() {
        let mut b = bud();
        b.pull = Some("true".to_string());
        b.pull_never = Some(true);
        let err = check_pull_flags(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("pull-never"));
    }

    #[test]
    fn test_pull_policy_default() {
        assert_eq!(pull_policy(&bud()).unwrap(), PullPolicy::IfMissing);
    }

    #[test]
    fn test_pull_policy_values() {
        for (value, expected) in [
            ("true", PullPolicy::IfNewer),
            (" Newer ", PullPolicy::IfNewer),
            ("ifnewer", PullPolicy::IfNewer),
            ("false", PullPolicy::IfMissing),
            ("missing", PullPolicy::IfMissing),
            ("ALWAYS", PullPolicy::Always),
            ("never", PullPolicy::Never),
        ] {
            let mut b = bud();
            b.pull = Some(value.to_string());
            assert_eq!(pull_policy(&b).unwrap(), expected, "value {value:?}");
        }
    }

    #[test]
    fn test_pull_policy_flags() {
        let mut b = bud();
        b.pull_always = Some(true);
        assert_eq!(pull_policy(&b).unwrap(), PullPolicy::Always);

        let mut b = bud();
        b.pull_never = Some(true);
        assert_eq!(pull_policy(&b).unwrap(), PullPolicy::Never);

        let mut b = bud();
        b.pull_always = Some(false);
        assert_eq!(pull_policy(&b).unwrap(), PullPolicy::IfMissing);
    }

    #[test]
    fn test_pull_policy_unknown_value() {
        let mut b = bud();
        b.pull = Some("sometimes".to_string());
        let err = pull_policy(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_split_tags() {
        let tags = vec!["app:1.0".to_string(), "app:latest".to_string()];
        let (output, extra) = split_tags(&tags, None).unwrap();
        assert_eq!(output.as_deref(), Some("app:1.0"));
        assert_eq!(extra, vec!["app:latest".to_string()]);

        let (output, extra) = split_tags(&[], Some("app-list")).unwrap();
        assert!(output.is_none());
        assert!(extra.is_empty());
    }

    #[test]
    fn test_split_tags_numeric_tags() {
        let tags = vec!["app:1".to_string(), "app:20240101".to_string()];
        let (output, extra) = split_tags(&tags, None).unwrap();
        assert_eq!(output.as_deref(), Some("app:1"));
        assert_eq!(extra, vec!["app:20240101".to_string()]);
    }

    #[test]
    fn test_split_tags_manifest_conflict_on_any_tag() {
        let tags = vec!["app:1.0".to_string(), "app-list".to_string()];
        let err = split_tags(&tags, Some("app-list")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = split_tags(&tags[..1], Some("app:1.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_split_tags_invalid_reference() {
        let tags = vec!["app:bad tag".to_string()];
        let err = split_tags(&tags, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_rm_requires_layers_or_no_cache() {
        let layer = LayerInputs::default();
        let mut b = bud();
        b.rm = Some(false);
        assert_eq!(
            check_rm_flags(&layer, &b).unwrap_err().kind(),
            ErrorKind::Conflict
        );

        b.no_cache = Some(true);
        assert!(check_rm_flags(&layer, &b).is_ok());

        let layer = LayerInputs {
            force_rm: Some(true),
            layers: Some(true),
        };
        assert!(check_rm_flags(&layer, &bud()).is_ok());
    }

    #[test]
    fn test_logsplit_requires_logfile() {
        let mut b = bud();
        b.logsplit = Some(true);
        assert!(check_logsplit(&b).is_err());

        b.logfile = Some(PathBuf::from("/tmp/build.log"));
        assert!(check_logsplit(&b).is_ok());

        let mut b = bud();
        b.logsplit = Some(false);
        assert!(check_logsplit(&b).is_ok());
    }
}
