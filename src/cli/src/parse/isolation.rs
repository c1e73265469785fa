//! Isolation type and image format selection.

use a3s_build_core::error::Result;
use a3s_build_core::{ImageFormat, Isolation};

/// Isolation from the flag, else the configured default, else by privilege.
pub fn isolation(flag: Option<&str>, default: Option<&str>) -> Result<Isolation> {
    match flag.or(default).filter(|v| !v.is_empty()) {
        Some(value) => value.parse(),
        None if is_rootless() => Ok(Isolation::OciRootless),
        None => Ok(Isolation::Oci),
    }
}

/// Output format from the flag, else the configured default.
pub fn image_format(flag: Option<&str>, default: &str) -> Result<ImageFormat> {
    flag.unwrap_or(default).parse()
}

#[cfg(unix)]
fn is_rootless() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() != 0 }
}

#[cfg(not(unix))]
fn is_rootless() -> bool {
    false
}
