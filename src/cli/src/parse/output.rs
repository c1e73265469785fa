//! `--output` export targets.

use std::path::PathBuf;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::BuildOutput;

/// Parse an export target.
///
/// - `-` writes a tar stream to stdout
/// - a value without commas is a local directory
/// - otherwise `type=local|tar,dest=<path>`, where `dest=-` needs `type=tar`
pub fn build_output(value: &str) -> Result<BuildOutput> {
    if value == "-" {
        return Ok(BuildOutput::Stdout);
    }
    if !value.contains(',') {
        return Ok(BuildOutput::Local(PathBuf::from(value)));
    }

    let mut is_dir: Option<bool> = None;
    let mut dest: Option<&str> = None;
    for option in value.split(',') {
        let (key, val) = option.split_once('=').ok_or_else(|| {
            BuildError::malformed("invalid build output option, expected format key=value", value)
        })?;
        match key {
            "type" => {
                if is_dir.is_some() {
                    return Err(BuildError::malformed("duplicate \"type\" not supported", value));
                }
                is_dir = Some(match val {
                    "local" => true,
                    "tar" => false,
                    _ => {
                        return Err(BuildError::malformed(
                            format!("invalid type {val:?} selected for build output options"),
                            value,
                        ))
                    }
                });
            }
            "dest" => {
                if dest.is_some() {
                    return Err(BuildError::malformed("duplicate \"dest\" not supported", value));
                }
                dest = Some(val);
            }
            _ => {
                return Err(BuildError::malformed(
                    format!("unrecognized key {key:?} in build output option"),
                    value,
                ))
            }
        }
    }

    let (Some(is_dir), Some(dest)) = (is_dir, dest) else {
        return Err(BuildError::malformed(
            "invalid build output option, accepted keys are type and dest and both must be present",
            value,
        ));
    };

    match (is_dir, dest) {
        (true, "-") => Err(BuildError::malformed(
            "invalid build output option, type=local and dest=- is not supported",
            value,
        )),
        (false, "-") => Ok(BuildOutput::Stdout),
        (true, dest) => Ok(BuildOutput::Local(PathBuf::from(dest))),
        (false, dest) => Ok(BuildOutput::Tar(PathBuf::from(dest))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_forms() {
        assert_eq!(build_output("-").unwrap(), BuildOutput::Stdout);
        assert_eq!(
            build_output("./rootfs").unwrap(),
            BuildOutput::Local(PathBuf::from("./rootfs"))
        );
    }

    #[test]
    fn test_typed_forms() {
        assert_eq!(
            build_output("type=tar,dest=/tmp/out.tar").unwrap(),
            BuildOutput::Tar(PathBuf::from("/tmp/out.tar"))
        );
        assert_eq!(
            build_output("dest=/srv/rootfs,type=local").unwrap(),
            BuildOutput::Local(PathBuf::from("/srv/rootfs"))
        );
        assert_eq!(build_output("type=tar,dest=-").unwrap(), BuildOutput::Stdout);
    }

    #[test]
    fn test_invalid_forms() {
        for value in [
            "type=local,dest=-",
            "type=tar,type=local,dest=x",
            "type=tar,dest=a,dest=b",
            "type=zip,dest=x",
            "type=tar,dst=x",
            "type=tar,",
            "dest=x,foo",
        ] {
            let err = build_output(value).unwrap_err();
            assert_eq!(err.kind(), a3s_build_core::ErrorKind::MalformedInput, "{value}");
        }
    }
}
