//! Staging of downloaded or piped build contexts.
//!
//! The payload is unpacked as a tar archive (plain, gzip, bzip2 or xz). Anything
//! that does not unpack is assumed to be a build description and written as
//! `Dockerfile`.

use std::io::{Read, Write};
use std::path::Path;

use a3s_build_core::error::{BuildError, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

/// Compression detected from the payload's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl ArchiveCompression {
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(b"BZh") {
            Self::Bzip2
        } else if data.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else {
            Self::None
        }
    }
}

/// What ended up in the staging directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedContent {
    /// An archive with this many entries was unpacked
    Archive { entries: usize },
    /// The payload was written as `Dockerfile`
    Dockerfile,
}

/// Unpack `data` into `dir`, falling back to writing it as `dir/Dockerfile`.
pub fn stage(data: &[u8], dir: &Path) -> Result<StagedContent> {
    let compression = ArchiveCompression::detect(data);
    match unpack(data, compression, dir) {
        Ok(entries) if entries > 0 => {
            tracing::debug!(dir = %dir.display(), entries, ?compression, "Unpacked build context archive");
            Ok(StagedContent::Archive { entries })
        }
        result => {
            if let Err(e) = result {
                tracing::debug!(error = %e, "Context payload is not an archive, treating it as a Dockerfile");
            }
            clear_dir(dir)?;
            write_dockerfile(data, dir)?;
            Ok(StagedContent::Dockerfile)
        }
    }
}

fn unpack(data: &[u8], compression: ArchiveCompression, dir: &Path) -> std::io::Result<usize> {
    let reader: Box<dyn Read + '_> = match compression {
        ArchiveCompression::Gzip => Box::new(GzDecoder::new(data)),
        ArchiveCompression::Bzip2 => Box::new(BzDecoder::new(data)),
        ArchiveCompression::Xz => Box::new(XzDecoder::new(data)),
        ArchiveCompression::None => Box::new(data),
    };

    let mut archive = tar::Archive::new(reader);
    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        entry.unpack_in(dir)?;
        count += 1;
    }
    Ok(count)
}

fn clear_dir(dir: &Path) -> Result<()> {
    let read_err = |e: std::io::Error| {
        BuildError::acquisition(format!("reading staging directory {}", dir.display()), e)
    };
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.map_err(|e| {
            BuildError::acquisition(format!("clearing staging directory {}", dir.display()), e)
        })?;
    }
    Ok(())
}

fn write_dockerfile(data: &[u8], dir: &Path) -> Result<()> {
    let target = dir.join("Dockerfile");
    let write_err =
        |e: std::io::Error| BuildError::acquisition(format!("writing {}", target.display()), e);

    // NamedTempFile is created with mode 0600; persist renames it atomically.
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.persist(&target).map_err(|e| write_err(e.error))?;
    Ok(())
}
