//! Retrieval of remote build contexts.
//!
//! [`ContextFetcher`] is the seam between the context acquirer and the network.
//! [`HttpFetcher`] downloads with `reqwest`, clones with the `git` binary and
//! reads piped contexts from standard input.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

/// Failures while fetching a remote context.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: u16 },

    #[error("git clone failed ({status}):\n{output}")]
    Git { status: String, output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches remote build context payloads.
#[async_trait]
pub trait ContextFetcher: Send + Sync {
    /// Download the body at `url`.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Clone the repository at `url` (optionally at `reference`) into `dest`.
    async fn clone_repo(
        &self,
        url: &str,
        reference: Option<&str>,
        dest: &Path,
    ) -> Result<(), FetchError>;

    /// Read the whole of standard input.
    async fn read_stdin(&self) -> Result<Vec<u8>, FetchError>;
}

/// Default fetcher: HTTP via `reqwest`, repositories via `git`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher that blocks until each transfer completes or fails.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetcher whose downloads fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextFetcher for HttpFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url, "Downloading build context");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn clone_repo(
        &self,
        url: &str,
        reference: Option<&str>,
        dest: &Path,
    ) -> Result<(), FetchError> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.arg("clone");
        if let Some(reference) = reference {
            cmd.arg("-b").arg(reference);
        }
        cmd.arg(url).arg(dest);

        tracing::debug!(url, ?reference, dest = %dest.display(), "Cloning build context");
        let output = cmd.output().await?;
        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(FetchError::Git {
                status: output.status.to_string(),
                output: combined,
            });
        }
        Ok(())
    }

    async fn read_stdin(&self) -> Result<Vec<u8>, FetchError> {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status { status: 404 };
        assert_eq!(err.to_string(), "server returned 404");

        let err = FetchError::Git {
            status: "exit status: 128".to_string(),
            output: "fatal: repository not found".to_string(),
        };
        assert!(err.to_string().contains("repository not found"));
    }

    #[test]
    fn test_with_timeout_builds_client() {
        assert!(HttpFetcher::with_timeout(Duration::from_secs(30)).is_ok());
    }
}
