//! Build context acquisition.
//!
//! A positional argument names either a local directory or a remote source.
//! Remote sources are staged into a fresh directory under the temporary root
//! and that directory is registered for cleanup before anything is written
//! into it.

use std::path::{Component, Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};

use super::archive;
use super::cleanup::CleanupList;
use super::fetch::ContextFetcher;

/// Prefix of staging directories created for remote contexts.
pub const STAGING_PREFIX: &str = "a3s-build";

/// Where a build context comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// Local path, possibly relative
    Local(PathBuf),
    /// Remote archive (or single build file) downloaded over HTTP
    Archive {
        url: String,
        subdir: Option<String>,
    },
    /// Repository cloned with git
    Git {
        url: String,
        reference: Option<String>,
        subdir: Option<String>,
    },
    /// Archive or build file piped on standard input
    Stdin,
}

impl ContextSource {
    /// Classify a positional context argument by its shape.
    pub fn classify(arg: &str) -> Self {
        if arg == "-" {
            return Self::Stdin;
        }

        let is_http = arg.starts_with("http://") || arg.starts_with("https://");
        let (base, fragment) = match arg.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (arg, None),
        };

        if arg.starts_with("git://") || (is_http && base.ends_with(".git")) {
            let (reference, subdir) = match fragment {
                Some(fragment) => match fragment.split_once(':') {
                    Some((reference, subdir)) => (non_empty(reference), non_empty(subdir)),
                    None => (non_empty(fragment), None),
                },
                None => (None, None),
            };
            return Self::Git {
                url: base.to_string(),
                reference,
                subdir,
            };
        }

        if let Some(repo_path) = arg.strip_prefix("github.com/") {
            let repo = repo_path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(repo_path);
            return Self::Archive {
                url: format!("https://{}/archive/master.tar.gz", arg.trim_end_matches('/')),
                subdir: Some(format!("{repo}-master")),
            };
        }

        if is_http {
            return Self::Archive {
                url: arg.to_string(),
                subdir: None,
            };
        }

        Self::Local(PathBuf::from(arg))
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Local(_))
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Produce the local directory holding the build context.
///
/// With no positional argument the working directory is used. When several
/// are given, the last one wins. The returned path is absolute but not yet
/// symlink-resolved.
pub async fn acquire(
    positional: &[String],
    fetcher: &dyn ContextFetcher,
    temp_root: &Path,
    cleanup: &mut CleanupList,
) -> Result<PathBuf> {
    let cwd = || {
        std::env::current_dir()
            .map_err(|e| BuildError::acquisition("unable to choose current working directory as build context", e))
    };

    let Some(arg) = positional.last() else {
        return cwd();
    };
    if positional.len() > 1 {
        tracing::debug!(count = positional.len(), context = %arg, "Several context arguments given, using the last");
    }

    let source = ContextSource::classify(arg);
    let (staging, subdir) = match source {
        ContextSource::Local(path) => {
            return if path.is_absolute() {
                Ok(path)
            } else {
                Ok(cwd()?.join(path))
            };
        }
        ContextSource::Git {
            url,
            reference,
            subdir,
        } => {
            check_subdir(subdir.as_deref())?;
            let staging = staging_dir(temp_root, cleanup)?;
            fetcher
                .clone_repo(&url, reference.as_deref(), &staging)
                .await
                .map_err(|e| BuildError::acquisition(format!("cloning {url:?}"), e))?;
            tracing::debug!(url = %url, dir = %staging.display(), "Cloned build context");
            (staging, subdir)
        }
        ContextSource::Archive { url, subdir } => {
            check_subdir(subdir.as_deref())?;
            let staging = staging_dir(temp_root, cleanup)?;
            let data = fetcher
                .download(&url)
                .await
                .map_err(|e| BuildError::acquisition(format!("downloading {url:?}"), e))?;
            if data.is_empty() {
                return Err(BuildError::acquisition_msg(format!("no contents in {url:?}")));
            }
            archive::stage(&data, &staging)?;
            (staging, subdir)
        }
        ContextSource::Stdin => {
            let staging = staging_dir(temp_root, cleanup)?;
            let data = fetcher
                .read_stdin()
                .await
                .map_err(|e| BuildError::acquisition("reading build context from stdin", e))?;
            if data.is_empty() {
                return Err(BuildError::acquisition_msg(
                    "no contents in build context from stdin",
                ));
            }
            archive::stage(&data, &staging)?;
            (staging, None)
        }
    };

    Ok(match subdir {
        Some(subdir) => staging.join(subdir),
        None => staging,
    })
}

/// Subdirectories of a staged context must stay inside the staging directory.
fn check_subdir(subdir: Option<&str>) -> Result<()> {
    let Some(subdir) = subdir else {
        return Ok(());
    };
    let escapes = Path::new(subdir)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BuildError::malformed(
            "context subdirectory must be a relative path inside the repository",
            subdir,
        ));
    }
    Ok(())
}

fn staging_dir(temp_root: &Path, cleanup: &mut CleanupList) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(temp_root)
        .map_err(|e| {
            BuildError::acquisition(
                format!("creating staging directory in {}", temp_root.display()),
                e,
            )
        })?
        .into_path();
    cleanup.push(&dir);
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::fetch::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeFetcher {
        body: Vec<u8>,
        fail: bool,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_body(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContextFetcher for FakeFetcher {
        async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(FetchError::Status { status: 404 });
            }
            Ok(self.body.clone())
        }

        async fn clone_repo(
            &self,
            url: &str,
            reference: Option<&str>,
            dest: &Path,
        ) -> std::result::Result<(), FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("{url}@{}", reference.unwrap_or("HEAD")));
            std::fs::create_dir_all(dest.join("docker"))?;
            std::fs::write(dest.join("docker/Containerfile"), "FROM alpine\n")?;
            Ok(())
        }

        async fn read_stdin(&self) -> std::result::Result<Vec<u8>, FetchError> {
            Ok(self.body.clone())
        }
    }

    #[test]
    fn test_classify_local() {
        assert_eq!(
            ContextSource::classify("./ctx"),
            ContextSource::Local(PathBuf::from("./ctx"))
        );
        assert!(!ContextSource::classify("/srv/app").is_remote());
    }

    #[test]
    fn test_classify_git() {
        assert_eq!(
            ContextSource::classify("https://example.com/org/app.git#v1.2:docker"),
            ContextSource::Git {
                url: "https://example.com/org/app.git".to_string(),
                reference: Some("v1.2".to_string()),
                subdir: Some("docker".to_string()),
            }
        );
        assert_eq!(
            ContextSource::classify("git://example.com/app"),
            ContextSource::Git {
                url: "git://example.com/app".to_string(),
                reference: None,
                subdir: None,
            }
        );
    }

    #[test]
    fn test_classify_github_rewrite() {
        assert_eq!(
            ContextSource::classify("github.com/a3s-lab/box"),
            ContextSource::Archive {
                url: "https://github.com/a3s-lab/box/archive/master.tar.gz".to_string(),
                subdir: Some("box-master".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_http_and_stdin() {
        assert_eq!(
            ContextSource::classify("https://example.com/ctx.tar.gz"),
            ContextSource::Archive {
                url: "https://example.com/ctx.tar.gz".to_string(),
                subdir: None,
            }
        );
        assert_eq!(ContextSource::classify("-"), ContextSource::Stdin);
    }

    #[tokio::test]
    async fn test_acquire_defaults_to_cwd() {
        let fetcher = FakeFetcher::default();
        let mut cleanup = CleanupList::new();
        let dir = acquire(&[], &fetcher, Path::new("/tmp"), &mut cleanup)
            .await
            .unwrap();
        assert_eq!(dir, std::env::current_dir().unwrap());
        assert!(cleanup.is_empty());
    }

    #[tokio::test]
    async fn test_acquire_relative_local_is_absolute() {
        let fetcher = FakeFetcher::default();
        let mut cleanup = CleanupList::new();
        let args = vec!["first".to_string(), "ctx".to_string()];
        let dir = acquire(&args, &fetcher, Path::new("/tmp"), &mut cleanup)
            .await
            .unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("ctx"));
    }

    #[tokio::test]
    async fn test_acquire_download_writes_dockerfile() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::with_body(b"FROM alpine\n");
        let mut cleanup = CleanupList::new();
        let args = vec!["https://example.com/Dockerfile".to_string()];
        let dir = acquire(&args, &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap();

        assert!(dir.join("Dockerfile").is_file());
        assert_eq!(cleanup.paths(), &[dir.clone()]);
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));
    }

    #[tokio::test]
    async fn test_acquire_empty_download_is_error_but_registered() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let mut cleanup = CleanupList::new();
        let args = vec!["http://example.com/empty".to_string()];
        let err = acquire(&args, &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no contents in"));
        assert_eq!(cleanup.paths().len(), 1);
    }

    #[tokio::test]
    async fn test_acquire_failed_download_is_acquisition_error() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher {
            fail: true,
            ..Default::default()
        };
        let mut cleanup = CleanupList::new();
        let args = vec!["https://example.com/ctx.tar".to_string()];
        let err = acquire(&args, &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), a3s_build_core::ErrorKind::Acquisition);
        assert!(err.to_string().contains("404"));
        assert_eq!(cleanup.paths().len(), 1);
    }

    #[tokio::test]
    async fn test_acquire_github_requests_master_archive() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::with_body(b"FROM alpine\n");
        let mut cleanup = CleanupList::new();
        let args = vec!["github.com/a3s-lab/box".to_string()];
        let dir = acquire(&args, &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap();
        assert_eq!(
            fetcher.requests(),
            vec!["https://github.com/a3s-lab/box/archive/master.tar.gz".to_string()]
        );
        assert!(dir.ends_with("box-master"));
    }

    #[tokio::test]
    async fn test_acquire_git_with_reference_and_subdir() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let mut cleanup = CleanupList::new();
        let args = vec!["git://example.com/app#main:docker".to_string()];
        let dir = acquire(&args, &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap();
        assert_eq!(fetcher.requests(), vec!["git://example.com/app@main".to_string()]);
        assert!(dir.join("Containerfile").is_file());
        assert!(dir.ends_with("docker"));
    }

    #[tokio::test]
    async fn test_acquire_rejects_escaping_subdir() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        for arg in [
            "git://example.com/app#main:../../x",
            "https://example.com/app.git#main:/etc",
        ] {
            let mut cleanup = CleanupList::new();
            let err = acquire(&[arg.to_string()], &fetcher, tmp.path(), &mut cleanup)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), a3s_build_core::ErrorKind::MalformedInput, "{arg}");
            assert!(cleanup.is_empty());
        }
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_acquire_empty_stdin_is_error_but_registered() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let mut cleanup = CleanupList::new();
        let err = acquire(&["-".to_string()], &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), a3s_build_core::ErrorKind::Acquisition);
        assert!(err.to_string().contains("no contents"));
        assert_eq!(cleanup.paths().len(), 1);
        assert!(!cleanup.paths()[0].join("Dockerfile").exists());
    }

    #[tokio::test]
    async fn test_acquire_stdin() {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::with_body(b"FROM busybox\n");
        let mut cleanup = CleanupList::new();
        let dir = acquire(&["-".to_string()], &fetcher, tmp.path(), &mut cleanup)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.join("Dockerfile")).unwrap(),
            "FROM busybox\n"
        );
    }
}
