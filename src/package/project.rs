//! Project identity and exclusion resolution

use crate::exceptions::{PyfuzeError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Shape of the project input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// A single script
    File,
    /// A directory tree
    Directory,
}

/// The Python project being packaged, resolved to an absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub kind: ProjectKind,
    /// File name of the project path (`app.py`, `myproject`)
    pub name: String,
    /// File stem, used for default output and unpack names
    pub stem: String,
}

impl Project {
    pub fn resolve(path: &Path) -> Result<Self> {
        let root = fs::canonicalize(path).map_err(|e| {
            PyfuzeError::InvalidInput(format!(
                "project path '{}' cannot be resolved: {e}",
                path.display()
            ))
        })?;

        let kind = if root.is_file() {
            ProjectKind::File
        } else if root.is_dir() {
            ProjectKind::Directory
        } else {
            return Err(PyfuzeError::InvalidInput(format!(
                "project path '{}' is neither a file nor a directory",
                root.display()
            )));
        };

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PyfuzeError::InvalidInput(format!(
                    "project path '{}' has no usable name",
                    root.display()
                ))
            })?
            .to_string();
        let stem = root
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(&name)
            .to_string();

        debug!("Resolved project {} ({:?})", root.display(), kind);
        Ok(Project {
            root,
            kind,
            name,
            stem,
        })
    }

    /// A single-file project always runs itself, whatever entry was requested.
    pub fn effective_entry(&self, requested: &str) -> String {
        match self.kind {
            ProjectKind::File => self.name.clone(),
            ProjectKind::Directory => requested.to_string(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == ProjectKind::File
    }
}

/// Resolved absolute paths excluded from the project tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    paths: Vec<PathBuf>,
}

fn is_glob(spec: &str) -> bool {
    spec.contains(['*', '?', '['])
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

impl ExclusionSet {
    /// Resolve `--exclude` specs relative to the project root. Glob patterns
    /// are expanded; plain paths that do not exist are kept lexically.
    pub fn resolve(project_root: &Path, specs: &[String]) -> Result<Self> {
        let mut paths = Vec::new();
        for spec in specs {
            if is_glob(spec) {
                let root = project_root.to_str().ok_or_else(|| {
                    PyfuzeError::InvalidInput(format!(
                        "project root '{}' is not valid UTF-8",
                        project_root.display()
                    ))
                })?;
                let pattern = format!("{}/{}", glob::Pattern::escape(root), spec);
                let mut matched = 0;
                for entry in glob::glob(&pattern)? {
                    match entry {
                        Ok(path) => {
                            paths.push(fs::canonicalize(&path).unwrap_or(path));
                            matched += 1;
                        }
                        Err(e) => warn!("Skipping unreadable exclude match: {e}"),
                    }
                }
                debug!("Exclude pattern '{spec}' matched {matched} path(s)");
            } else {
                let joined = project_root.join(spec);
                match fs::canonicalize(&joined) {
                    Ok(resolved) => paths.push(resolved),
                    Err(_) => {
                        debug!("Exclude path {} does not exist", joined.display());
                        paths.push(normalize_lexically(&joined));
                    }
                }
            }
        }
        Ok(Self { paths })
    }

    /// True if `path` is an excluded path or lies beneath one
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|excluded| path.starts_with(excluded))
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
