//! Archive path normalization
//!
//! Every name written into the zip container goes through [`ArchivePath`]:
//! forward slashes only, relative, no `.`/empty components, and never
//! climbing above the namespace root it was created under.

use crate::exceptions::{PyfuzeError, Result};
use std::fmt;
use std::path::{Component, Path};

/// A normalized, forward-slash separated path inside the archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivePath(String);

/// Normalize a relative path string into its components.
///
/// Both `/` and `\` separate components. `..` pops a previous component and
/// is rejected if nothing is left to pop.
fn normalize_components(raw: &str) -> Result<Vec<&str>> {
    if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
        return Err(PyfuzeError::UnsafePath(format!("'{raw}' is absolute")));
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in raw.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(PyfuzeError::UnsafePath(format!(
                        "'{raw}' escapes its root"
                    )));
                }
            }
            other => parts.push(other),
        }
    }

    Ok(parts)
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl ArchivePath {
    /// Normalize a path relative to the archive root.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = normalize_components(raw)?;
        if parts.is_empty() {
            return Err(PyfuzeError::UnsafePath(format!("'{raw}' is empty")));
        }
        Ok(ArchivePath(parts.join("/")))
    }

    /// Join a relative path under this one; `rel` cannot climb out of `self`.
    pub fn join(&self, rel: &str) -> Result<Self> {
        let parts = normalize_components(rel)?;
        if parts.is_empty() {
            return Ok(self.clone());
        }
        Ok(ArchivePath(format!("{}/{}", self.0, parts.join("/"))))
    }

    /// Join a filesystem-relative path (as produced by `strip_prefix`).
    pub fn join_fs(&self, rel: &Path) -> Result<Self> {
        let mut joined = self.clone();
        for component in rel.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        PyfuzeError::UnsafePath(format!(
                            "'{}' is not valid UTF-8",
                            rel.display()
                        ))
                    })?;
                    joined = joined.join(name)?;
                }
                Component::CurDir => {}
                _ => {
                    return Err(PyfuzeError::UnsafePath(format!(
                        "'{}' is not a plain relative path",
                        rel.display()
                    )));
                }
            }
        }
        Ok(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(ArchivePath::parse("src/./pkg//mod.py").unwrap().as_str(), "src/pkg/mod.py");
        assert_eq!(ArchivePath::parse("src\\pkg\\mod.py").unwrap().as_str(), "src/pkg/mod.py");
        assert_eq!(ArchivePath::parse("a/b/../c").unwrap().as_str(), "a/c");
    }

    #[test]
    fn test_parse_rejects_unsafe() {
        assert!(matches!(ArchivePath::parse("/etc/passwd"), Err(PyfuzeError::UnsafePath(_))));
        assert!(matches!(ArchivePath::parse("C:\\x"), Err(PyfuzeError::UnsafePath(_))));
        assert!(matches!(ArchivePath::parse("../x"), Err(PyfuzeError::UnsafePath(_))));
        assert!(matches!(ArchivePath::parse("./"), Err(PyfuzeError::UnsafePath(_))));
    }

    #[test]
    fn test_join_cannot_escape_namespace() {
        let src = ArchivePath::parse("src").unwrap();
        assert_eq!(src.join("static/a.png").unwrap().as_str(), "src/static/a.png");
        assert_eq!(src.join("x/../y").unwrap().as_str(), "src/y");
        assert!(src.join("../uv.lock").is_err());
        assert!(src.join("x/../../uv.lock").is_err());
    }

    #[test]
    fn test_join_fs() {
        let src = ArchivePath::parse("src").unwrap();
        let rel = PathBuf::from("pkg").join("sub").join("mod.py");
        assert_eq!(src.join_fs(&rel).unwrap().as_str(), "src/pkg/sub/mod.py");
        assert!(src.join_fs(Path::new("../x")).is_err());
    }
}
