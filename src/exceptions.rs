//! Error types for pyfuze

use crate::exit_codes::{
    EXIT_ARCHIVE_ERROR, EXIT_BUILD_ERROR, EXIT_INVALID_INPUT, EXIT_IO_ERROR, EXIT_PACKAGE_ERROR,
    EXIT_STUB_ERROR,
};
use std::fmt;
use std::path::PathBuf;

/// Main error type for pyfuze operations
#[derive(Debug)]
pub enum PyfuzeError {
    /// Malformed user input (project path, include/exclude spec, env entry)
    InvalidInput(String),

    /// Archive path that is absolute or escapes its namespace root
    UnsafePath(String),

    /// Launcher stub could not be located
    StubNotFound(String),

    /// File is not a dual-format package
    NotAPackage(String),

    /// IO error tied to a specific file
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error
    IoError(std::io::Error),

    /// Zip container error
    ZipError(zip::result::ZipError),

    /// JSON serialization error
    JsonError(serde_json::Error),

    /// Generic error with message
    Generic(String),
}

impl PyfuzeError {
    /// Wrap an IO error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PyfuzeError::File {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for PyfuzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyfuzeError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            PyfuzeError::UnsafePath(msg) => write!(f, "Unsafe archive path: {msg}"),
            PyfuzeError::StubNotFound(msg) => write!(f, "Launcher stub not found: {msg}"),
            PyfuzeError::NotAPackage(msg) => write!(f, "Not a pyfuze package: {msg}"),
            PyfuzeError::File { path, source } => write!(f, "{}: {source}", path.display()),
            PyfuzeError::IoError(err) => write!(f, "IO error: {err}"),
            PyfuzeError::ZipError(err) => write!(f, "Zip error: {err}"),
            PyfuzeError::JsonError(err) => write!(f, "JSON error: {err}"),
            PyfuzeError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PyfuzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PyfuzeError::File { source, .. } => Some(source),
            PyfuzeError::IoError(err) => Some(err),
            PyfuzeError::ZipError(err) => Some(err),
            PyfuzeError::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PyfuzeError {
    fn from(err: std::io::Error) -> Self {
        PyfuzeError::IoError(err)
    }
}

impl From<zip::result::ZipError> for PyfuzeError {
    fn from(err: zip::result::ZipError) -> Self {
        PyfuzeError::ZipError(err)
    }
}

impl From<walkdir::Error> for PyfuzeError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        match path {
            Some(path) => PyfuzeError::file(path, err.into()),
            None => PyfuzeError::IoError(err.into()),
        }
    }
}

impl From<glob::PatternError> for PyfuzeError {
    fn from(err: glob::PatternError) -> Self {
        PyfuzeError::InvalidInput(format!("bad glob pattern: {err}"))
    }
}

impl From<serde_json::Error> for PyfuzeError {
    fn from(err: serde_json::Error) -> Self {
        PyfuzeError::JsonError(err)
    }
}

impl From<anyhow::Error> for PyfuzeError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        PyfuzeError::Generic(format!("{err:#}"))
    }
}

/// Result type for pyfuze operations
pub type Result<T> = std::result::Result<T, PyfuzeError>;

/// Steps of a build, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// Resolve project identity and validate inputs
    Resolve,
    /// Copy the launcher stub to the output path
    CopyStub,
    /// Patch the PE subsystem field
    PatchHeader,
    /// Collect payload entries
    BuildPayload,
    /// Append the zip container to the stub copy
    AppendArchive,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::Resolve => "resolve",
            BuildStep::CopyStub => "copy-stub",
            BuildStep::PatchHeader => "patch-header",
            BuildStep::BuildPayload => "build-payload",
            BuildStep::AppendArchive => "append-archive",
        };
        f.write_str(name)
    }
}

/// A build failure tagged with the step that produced it
#[derive(Debug)]
pub struct BuildFailure {
    pub step: BuildStep,
    pub error: PyfuzeError,
}

impl BuildFailure {
    pub fn new(step: BuildStep, error: impl Into<PyfuzeError>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            PyfuzeError::InvalidInput(_) | PyfuzeError::UnsafePath(_) => EXIT_INVALID_INPUT,
            PyfuzeError::StubNotFound(_) => EXIT_STUB_ERROR,
            PyfuzeError::NotAPackage(_) => EXIT_PACKAGE_ERROR,
            PyfuzeError::ZipError(_) => EXIT_ARCHIVE_ERROR,
            PyfuzeError::File { .. } | PyfuzeError::IoError(_) => EXIT_IO_ERROR,
            PyfuzeError::JsonError(_) | PyfuzeError::Generic(_) => EXIT_BUILD_ERROR,
        }
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Attach a build step to a fallible result
pub trait StepContext<T> {
    fn step(self, step: BuildStep) -> std::result::Result<T, BuildFailure>;
}

impl<T, E: Into<PyfuzeError>> StepContext<T> for std::result::Result<T, E> {
    fn step(self, step: BuildStep) -> std::result::Result<T, BuildFailure> {
        self.map_err(|e| BuildFailure::new(step, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_names_step() {
        let failure = BuildFailure::new(
            BuildStep::PatchHeader,
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read"),
        );
        assert_eq!(
            failure.to_string(),
            "patch-header failed: IO error: short read"
        );
        assert_eq!(failure.exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_step_context() {
        let result: std::result::Result<(), PyfuzeError> =
            Err(PyfuzeError::InvalidInput("bad env".into()));
        let failure = result.step(BuildStep::Resolve).unwrap_err();
        assert_eq!(failure.step, BuildStep::Resolve);
        assert_eq!(failure.exit_code(), EXIT_INVALID_INPUT);
    }
}
