//! Project tree selection policies
//!
//! Two policies decide which files of a directory project land under `src/`.
//! `copy-all` is the default. `package-roots` keeps only Python sources that
//! sit at the project root or inside a directory carrying `__init__.py`.

use super::constants::{PACKAGE_MARKER, PYTHON_SOURCE_EXT};
use std::fmt;
use std::path::Path;

/// Decides whether a regular file under the project root is packaged
pub trait SelectionPolicy: fmt::Debug {
    /// Short name shown in logs
    fn name(&self) -> &'static str;

    /// `file` is an absolute path below `project_root`
    fn accepts(&self, project_root: &Path, file: &Path) -> bool;
}

/// Every regular file
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyAll;

impl SelectionPolicy for CopyAll {
    fn name(&self) -> &'static str {
        "copy-all"
    }

    fn accepts(&self, _project_root: &Path, _file: &Path) -> bool {
        true
    }
}

/// `.py` files at the root or in package directories
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageRootsOnly;

impl SelectionPolicy for PackageRootsOnly {
    fn name(&self) -> &'static str {
        "package-roots"
    }

    fn accepts(&self, project_root: &Path, file: &Path) -> bool {
        if file.extension().and_then(|e| e.to_str()) != Some(PYTHON_SOURCE_EXT) {
            return false;
        }
        match file.parent() {
            Some(parent) => parent == project_root || parent.join(PACKAGE_MARKER).is_file(),
            None => false,
        }
    }
}

/// Command-line selector for the policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SelectionKind {
    #[default]
    CopyAll,
    PackageRoots,
}

impl SelectionKind {
    pub fn policy(self) -> Box<dyn SelectionPolicy> {
        match self {
            SelectionKind::CopyAll => Box::new(CopyAll),
            SelectionKind::PackageRoots => Box::new(PackageRootsOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_all_accepts_everything() {
        let root = Path::new("/project");
        assert!(CopyAll.accepts(root, Path::new("/project/data/blob.bin")));
        assert!(CopyAll.accepts(root, Path::new("/project/README")));
    }

    #[test]
    fn test_package_roots_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("scripts")).unwrap();
        fs::write(root.join("pkg").join(PACKAGE_MARKER), "").unwrap();

        let policy = PackageRootsOnly;
        assert!(policy.accepts(root, &root.join("main.py")));
        assert!(policy.accepts(root, &root.join("pkg").join("core.py")));
        assert!(!policy.accepts(root, &root.join("scripts").join("tool.py")));
        assert!(!policy.accepts(root, &root.join("notes.txt")));
        assert!(!policy.accepts(root, &root.join("pkg").join("data.json")));
    }

    #[test]
    fn test_kind_maps_to_policy() {
        assert_eq!(SelectionKind::default(), SelectionKind::CopyAll);
        assert_eq!(SelectionKind::CopyAll.policy().name(), "copy-all");
        assert_eq!(SelectionKind::PackageRoots.policy().name(), "package-roots");
    }
}
