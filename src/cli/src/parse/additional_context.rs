//! `--build-context NAME=VALUE` values.

use std::path::Path;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::AdditionalBuildContext;

const IMAGE_PREFIXES: [&str; 3] = ["docker-image://", "container-image://", "docker://"];

/// Classify an additional build context value.
///
/// Image prefixes are stripped, http(s) URLs are kept verbatim and anything
/// else is a local path made absolute against `cwd`.
pub fn additional_build_context(value: &str, cwd: &Path) -> Result<AdditionalBuildContext> {
    for prefix in IMAGE_PREFIXES {
        if let Some(image) = value.strip_prefix(prefix) {
            if image.is_empty() {
                return Err(BuildError::malformed("missing image name", value));
            }
            return Ok(AdditionalBuildContext::Image(image.to_string()));
        }
    }

    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(AdditionalBuildContext::Url(value.to_string()));
    }

    if value.is_empty() {
        return Err(BuildError::malformed("empty build context path", value));
    }
    let path = Path::new(value);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    Ok(AdditionalBuildContext::Local(path))
}
