//! Registry auth file handling.

use std::io::Write;
use std::path::{Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};

use crate::build::cleanup::CleanupList;

const DESCRIPTOR_PREFIX: &str = "/dev/fd/";

/// A given auth file must exist.
pub fn check_auth_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => {
            std::fs::metadata(path)
                .map_err(|e| BuildError::acquisition("checking authfile", e))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Copy an auth file passed as `/dev/fd/N` into a regular temporary file.
///
/// A descriptor can be read once, while the engine may read the auth file
/// several times. Other paths are returned unchanged. The copy is registered
/// in `cleanup` before it is written.
pub fn mirror_descriptor(
    path: &Path,
    temp_root: &Path,
    cleanup: &mut CleanupList,
) -> Result<PathBuf> {
    if !path.to_string_lossy().starts_with(DESCRIPTOR_PREFIX) {
        return Ok(path.to_path_buf());
    }

    let content = std::fs::read(path)
        .map_err(|e| BuildError::acquisition(format!("reading {}", path.display()), e))?;

    let (mut file, mirror) = tempfile::Builder::new()
        .prefix("a3s-build-auth")
        .suffix(".json")
        .tempfile_in(temp_root)
        .map_err(|e| BuildError::acquisition("creating temporary auth file", e))?
        .keep()
        .map_err(|e| BuildError::acquisition("creating temporary auth file", e.error))?;
    cleanup.push(&mirror);

    file.write_all(&content)
        .map_err(|e| BuildError::acquisition(format!("writing {}", mirror.display()), e))?;
    tracing::debug!(from = %path.display(), to = %mirror.display(), "Mirrored auth file descriptor");
    Ok(mirror)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_auth_file() {
        let dir = TempDir::new().unwrap();
        let auth = dir.path().join("auth.json");
        std::fs::write(&auth, "{}").unwrap();

        assert!(check_auth_file(None).is_ok());
        assert!(check_auth_file(Some(Path::new(""))).is_ok());
        assert!(check_auth_file(Some(&auth)).is_ok());

        let err = check_auth_file(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(err.to_string().starts_with("checking authfile"));
    }

    #[test]
    fn test_mirror_regular_path_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut cleanup = CleanupList::new();
        let path = Path::new("/run/containers/0/auth.json");
        assert_eq!(mirror_descriptor(path, dir.path(), &mut cleanup).unwrap(), path);
        assert!(cleanup.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_mirror_descriptor_copies_content() {
        use std::os::unix::io::AsRawFd;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.json");
        std::fs::write(&source, r#"{"auths":{}}"#).unwrap();
        let handle = std::fs::File::open(&source).unwrap();
        let fd_path = PathBuf::from(format!("/dev/fd/{}", handle.as_raw_fd()));

        let mut cleanup = CleanupList::new();
        let mirror = mirror_descriptor(&fd_path, dir.path(), &mut cleanup).unwrap();
        assert_ne!(mirror, fd_path);
        assert_eq!(std::fs::read_to_string(&mirror).unwrap(), r#"{"auths":{}}"#);
        assert_eq!(cleanup.paths(), &[mirror]);
    }
}
