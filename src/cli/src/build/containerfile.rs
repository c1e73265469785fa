//! Locating build-description files.

use std::path::{Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};

/// Path substituted for `-` in the list of build files.
pub const STDIN_PATH: &str = "/dev/stdin";

/// File names tried, in order, when no build file is given.
pub const DEFAULT_NAMES: [&str; 2] = ["Containerfile", "Dockerfile"];

/// Explicit build files, with `-` replaced by the standard-input device.
pub fn containerfiles(explicit: &[String]) -> Vec<String> {
    explicit
        .iter()
        .map(|f| {
            if f == "-" {
                STDIN_PATH.to_string()
            } else {
                f.clone()
            }
        })
        .collect()
}

/// Find the build file for `context`.
///
/// A directory is searched for `Containerfile`, then `Dockerfile`; the match
/// must be a regular file once symlinks are followed. A regular file is its
/// own build file.
pub fn discover(context: &Path) -> Result<PathBuf> {
    let meta = std::fs::metadata(context)
        .map_err(|e| BuildError::acquisition("discovering Containerfile", e))?;

    if meta.is_file() {
        return Ok(context.to_path_buf());
    }
    if !meta.is_dir() {
        return Err(BuildError::acquisition_msg(format!(
            "build context {} is neither a directory nor a file",
            context.display()
        )));
    }

    let mut last_err = None;
    for name in DEFAULT_NAMES {
        let candidate = context.join(name);
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => {
                tracing::debug!(file = %candidate.display(), "Discovered build file");
                return Ok(candidate);
            }
            Ok(_) => {
                return Err(BuildError::acquisition_msg(format!(
                    "assumed Containerfile {:?} is not a file",
                    candidate.display().to_string()
                )));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(BuildError::Acquisition {
        message: "cannot find Containerfile or Dockerfile in context directory".to_string(),
        source: last_err.map(Into::into),
    })
}

/// Symlink-resolve the context directory; it must be a directory.
pub fn resolve_context_dir(dir: &Path) -> Result<PathBuf> {
    let resolved = dir
        .canonicalize()
        .map_err(|e| BuildError::acquisition("evaluating symlinks in build context path", e))?;
    if !resolved.is_dir() {
        return Err(BuildError::acquisition_msg(format!(
            "build context {} is not a directory",
            resolved.display()
        )));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_containerfiles_maps_dash_to_stdin() {
        let files = containerfiles(&["-".to_string(), "build/Containerfile".to_string()]);
        assert_eq!(files, vec!["/dev/stdin", "build/Containerfile"]);
        assert!(containerfiles(&[]).is_empty());
    }

    #[test]
    fn test_discover_prefers_containerfile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM a\n").unwrap();
        std::fs::write(dir.path().join("Containerfile"), "FROM b\n").unwrap();
        assert_eq!(
            discover(dir.path()).unwrap(),
            dir.path().join("Containerfile")
        );
    }

    #[test]
    fn test_discover_falls_back_to_dockerfile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM a\n").unwrap();
        assert_eq!(discover(dir.path()).unwrap(), dir.path().join("Dockerfile"));
    }

    #[test]
    fn test_discover_context_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.containerfile");
        std::fs::write(&file, "FROM a\n").unwrap();
        assert_eq!(discover(&file).unwrap(), file);
    }

    #[test]
    fn test_discover_rejects_directory_named_containerfile() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Containerfile")).unwrap();
        let err = discover(dir.path()).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = discover(dir.path()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("cannot find Containerfile or Dockerfile in context directory"));
        assert_eq!(err.kind(), a3s_build_core::ErrorKind::Acquisition);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_context_dir_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert_eq!(
            resolve_context_dir(&link).unwrap(),
            real.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_resolve_context_dir_missing() {
        assert!(resolve_context_dir(Path::new("/nonexistent/a3s-build-ctx")).is_err());
    }
}
