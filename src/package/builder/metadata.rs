//! Root-level metadata files: interpreter pin, requirements, pyproject, lock

use super::super::constants::{
    PYPROJECT_FILE, PYTHON_VERSION_FILE, REQUIREMENTS_FILE, UV_LOCK_FILE,
};
use super::super::paths::ArchivePath;
use super::super::payload::PayloadEntry;
use crate::exceptions::{PyfuzeError, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// A requirements list ready to be written as `requirements.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements {
    pub text: String,
    pub count: usize,
}

impl Requirements {
    /// `value` is either a path to an existing requirements file (copied
    /// verbatim) or a comma-separated list of specifiers.
    pub fn parse(value: &str) -> Result<Self> {
        let path = Path::new(value);
        if path.is_file() {
            let text = fs::read_to_string(path).map_err(|e| PyfuzeError::file(path, e))?;
            let count = text.lines().filter(|l| !l.trim().is_empty()).count();
            return Ok(Requirements { text, count });
        }

        let specifiers: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if specifiers.is_empty() {
            return Err(PyfuzeError::InvalidInput(format!(
                "requirements '{value}' is neither a file nor a comma-separated list"
            )));
        }
        Ok(Requirements {
            text: specifiers.join("\n"),
            count: specifiers.len(),
        })
    }
}

/// Optional files placed at the archive root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxFiles {
    pub python_version: Option<String>,
    pub requirements: Option<Requirements>,
    pub pyproject: Option<PathBuf>,
    pub uv_lock: Option<PathBuf>,
}

fn existing_file(path: &Path, what: &str) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(PyfuzeError::InvalidInput(format!(
            "{what} '{}' is not a file",
            path.display()
        )))
    }
}

impl AuxFiles {
    /// Validate raw command-line values
    pub fn from_options(
        python_version: Option<&str>,
        requirements: Option<&str>,
        pyproject: Option<&Path>,
        uv_lock: Option<&Path>,
    ) -> Result<Self> {
        let python_version = match python_version.map(str::trim) {
            Some("") => {
                return Err(PyfuzeError::InvalidInput(
                    "python version must not be empty".to_string(),
                ));
            }
            Some(v) if v.contains(['\n', '\r']) => {
                return Err(PyfuzeError::InvalidInput(
                    "python version must be a single line".to_string(),
                ));
            }
            other => other.map(str::to_string),
        };

        Ok(AuxFiles {
            python_version,
            requirements: requirements.map(Requirements::parse).transpose()?,
            pyproject: pyproject
                .map(|p| existing_file(p, "pyproject"))
                .transpose()?,
            uv_lock: uv_lock.map(|p| existing_file(p, "uv lock")).transpose()?,
        })
    }

    /// Payload entries for every configured file
    pub fn entries(&self) -> Result<Vec<PayloadEntry>> {
        let mut entries = Vec::new();

        if let Some(version) = &self.python_version {
            entries.push(PayloadEntry::bytes(
                ArchivePath::parse(PYTHON_VERSION_FILE)?,
                version.as_bytes(),
            ));
            info!("✓ wrote {PYTHON_VERSION_FILE} ({version})");
        }

        if let Some(requirements) = &self.requirements {
            entries.push(PayloadEntry::bytes(
                ArchivePath::parse(REQUIREMENTS_FILE)?,
                requirements.text.as_bytes(),
            ));
            info!(
                "✓ wrote {REQUIREMENTS_FILE} ({} packages)",
                requirements.count
            );
        }

        if let Some(pyproject) = &self.pyproject {
            entries.push(PayloadEntry::file(
                ArchivePath::parse(PYPROJECT_FILE)?,
                pyproject,
            ));
            info!("✓ wrote {PYPROJECT_FILE}");
        }

        if let Some(uv_lock) = &self.uv_lock {
            entries.push(PayloadEntry::file(ArchivePath::parse(UV_LOCK_FILE)?, uv_lock));
            info!("✓ wrote {UV_LOCK_FILE}");
        }

        Ok(entries)
    }
}
