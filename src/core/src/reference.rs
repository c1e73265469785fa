//! Image reference parsing.
//!
//! Used to validate `--tag`, `--manifest` and `docker-image://` build-context
//! values before any acquisition happens.

use crate::error::{BuildError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when none is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "quay.io", "docker.io")
    pub registry: String,
    /// Repository path (e.g., "library/alpine")
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// - `alpine` → docker.io/library/alpine:latest
    /// - `localhost:5000/app:v2` → localhost:5000/app:v2
    /// - `quay.io/org/app@sha256:...` → digest reference, no tag
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(BuildError::malformed("empty image reference", reference));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(BuildError::malformed(
                "image reference must not contain whitespace",
                reference,
            ));
        }

        let (name_tag, digest) = match reference.rsplit_once('@') {
            Some((name, digest)) => {
                let valid = digest
                    .split_once(':')
                    .map(|(algo, hex)| !algo.is_empty() && !hex.is_empty())
                    .unwrap_or(false);
                if !valid {
                    return Err(BuildError::malformed(
                        "invalid digest, expected algorithm:hex",
                        reference,
                    ));
                }
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // The tag separator is the last colon after the last slash. A
        // registry port is always followed by a slash, so it never matches.
        let last_segment_start = name_tag.rfind('/').map(|p| p + 1).unwrap_or(0);
        let (name, tag) = match name_tag[last_segment_start..].rfind(':') {
            Some(colon) => {
                let colon = last_segment_start + colon;
                (&name_tag[..colon], Some(name_tag[colon + 1..].to_string()))
            }
            None => (name_tag, None),
        };

        if let Some(ref tag) = tag {
            validate_tag(tag, reference)?;
        }

        let (registry, repository) = split_registry_repository(name, reference)?;

        let tag = if tag.is_none() && digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            tag
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Get the fully-qualified reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

impl std::str::FromStr for ImageReference {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn validate_tag(tag: &str, reference: &str) -> Result<()> {
    let valid = !tag.is_empty()
        && tag.len() <= 128
        && !tag.starts_with(['.', '-'])
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(BuildError::malformed("invalid tag in image reference", reference))
    }
}

/// Split a name into registry and repository components.
fn split_registry_repository(name: &str, reference: &str) -> Result<(String, String)> {
    let (registry, repository) = match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first.to_string(), rest.to_string())
        }
        Some(_) => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        None => (DEFAULT_REGISTRY.to_string(), format!("library/{}", name)),
    };

    let valid = !repository.is_empty()
        && repository.split('/').all(|component| {
            !component.is_empty()
                && component.chars().all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
                })
        });
    if !valid {
        return Err(BuildError::malformed(
            "repository name must be lowercase alphanumeric components",
            reference,
        ));
    }

    Ok((registry, repository))
}
