//! `--include source[::destination]` specifications

use super::constants::{INCLUDE_SEPARATOR, SRC_DIR};
use super::paths::ArchivePath;
use crate::exceptions::{PyfuzeError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// An extra file or directory copied under `src/<destination>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    pub source: PathBuf,
    pub destination: ArchivePath,
}

impl IncludeSpec {
    /// Build a spec; `destination` defaults to the base name of `source`.
    pub fn new(source: &str, destination: Option<&str>) -> Result<Self> {
        if source.is_empty() {
            return Err(PyfuzeError::InvalidInput(
                "include source must not be empty".to_string(),
            ));
        }

        let source_path = PathBuf::from(source);
        let destination = match destination {
            Some(dest) => dest.to_string(),
            None => base_name(&source_path).ok_or_else(|| {
                PyfuzeError::InvalidInput(format!(
                    "include '{source}' has no base name; use source::destination"
                ))
            })?,
        };

        let src_root = ArchivePath::parse(SRC_DIR)?;
        let destination = src_root.join(&destination).map_err(|e| {
            PyfuzeError::InvalidInput(format!("include destination for '{source}': {e}"))
        })?;
        if destination == src_root {
            return Err(PyfuzeError::InvalidInput(format!(
                "include '{source}' needs a non-empty destination"
            )));
        }

        Ok(IncludeSpec {
            source: source_path,
            destination,
        })
    }
}

impl FromStr for IncludeSpec {
    type Err = PyfuzeError;

    /// The last `::` separates source from destination.
    fn from_str(s: &str) -> Result<Self> {
        match s.rsplit_once(INCLUDE_SEPARATOR) {
            Some((source, destination)) => IncludeSpec::new(source, Some(destination)),
            None => IncludeSpec::new(s, None),
        }
    }
}

/// Base name of a path, resolving `.`/`..`/trailing separators via the filesystem
fn base_name(path: &Path) -> Option<String> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        return Some(name.to_string());
    }
    std::fs::canonicalize(path)
        .ok()?
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_destination() {
        let spec: IncludeSpec = "assets::static".parse().unwrap();
        assert_eq!(spec.source, PathBuf::from("assets"));
        assert_eq!(spec.destination.as_str(), "src/static");
    }

    #[test]
    fn test_destination_defaults_to_base_name() {
        let spec: IncludeSpec = "data/config.yaml".parse().unwrap();
        assert_eq!(spec.destination.as_str(), "src/config.yaml");

        let spec: IncludeSpec = "vendor/libs/".parse().unwrap();
        assert_eq!(spec.destination.as_str(), "src/libs");
    }

    #[test]
    fn test_last_separator_wins() {
        let spec: IncludeSpec = "weird::name::dest/sub".parse().unwrap();
        assert_eq!(spec.source, PathBuf::from("weird::name"));
        assert_eq!(spec.destination.as_str(), "src/dest/sub");
    }

    #[test]
    fn test_rejects_escaping_destination() {
        assert!(matches!(
            "assets::../uv.lock".parse::<IncludeSpec>(),
            Err(PyfuzeError::InvalidInput(_))
        ));
        assert!("assets::/abs".parse::<IncludeSpec>().is_err());
        assert!("assets::.".parse::<IncludeSpec>().is_err());
        assert!("::dest".parse::<IncludeSpec>().is_err());
    }
}
