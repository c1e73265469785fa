//! Context ignore files.

use std::path::Path;

use a3s_build_core::error::{BuildError, Result};

/// Exclude patterns from an ignore file: trimmed lines, minus blanks and comments.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BuildError::acquisition(format!("reading ignore file {}", path.display()), e))?;
    Ok(parse_ignore(&content))
}

pub fn parse_ignore(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ignore() {
        let content = "# build artifacts\ntarget/\n\n  *.log  \n#secret\n!keep.log\r\n";
        assert_eq!(parse_ignore(content), vec!["target/", "*.log", "!keep.log"]);
    }

    #[test]
    fn test_read_ignore_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".containerignore");
        std::fs::write(&path, "node_modules\n.git\n").unwrap();
        assert_eq!(read_ignore_file(&path).unwrap(), vec!["node_modules", ".git"]);
        assert!(read_ignore_file(&dir.path().join("missing")).is_err());
    }
}
