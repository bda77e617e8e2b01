//! High-level API for pyfuze operations

use crate::exceptions::{BuildFailure, Result};
use crate::package::builder::{self, BuildReport};
use crate::package::defaults::{
    DEFAULT_ENTRY, DEFAULT_OUT_DIR, DEFAULT_UV_INSTALL_SCRIPT_UNIX,
    DEFAULT_UV_INSTALL_SCRIPT_WINDOWS,
};
use crate::package::reader::{PackageInfo, PackageReader};
use crate::package::selection::SelectionKind;
use std::path::{Path, PathBuf};

/// Options for building a package
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Python project: a single script or a directory
    pub project: PathBuf,
    /// Output file name, defaults to `<project stem>.com`
    pub output_name: Option<String>,
    /// Directory the packaged executable is written to
    pub out_dir: PathBuf,
    /// Unpack directory on the target, defaults to `/tmp/<project stem>`
    pub unzip_path: Option<String>,
    pub python_version: Option<String>,
    /// Requirements file path or comma-separated specifiers
    pub requirements: Option<String>,
    pub pyproject: Option<PathBuf>,
    pub uv_lock: Option<PathBuf>,
    /// Entry script inside `src/` (ignored for single-file projects)
    pub entry: String,
    /// Keep the windowed subsystem instead of patching to console
    pub win_gui: bool,
    /// `SRC[::DEST]` include specs
    pub includes: Vec<String>,
    /// Exclusions relative to the project root, globs allowed
    pub excludes: Vec<String>,
    /// `KEY=VALUE` runtime environment entries
    pub env: Vec<String>,
    pub uv_install_script_windows: String,
    pub uv_install_script_unix: String,
    pub selection: SelectionKind,
    /// Launcher stub path override
    pub stub: Option<PathBuf>,
    /// Report failures with full detail
    pub debug: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            project: PathBuf::new(),
            output_name: None,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            unzip_path: None,
            python_version: None,
            requirements: None,
            pyproject: None,
            uv_lock: None,
            entry: DEFAULT_ENTRY.to_string(),
            win_gui: false,
            includes: Vec::new(),
            excludes: Vec::new(),
            env: Vec::new(),
            uv_install_script_windows: DEFAULT_UV_INSTALL_SCRIPT_WINDOWS.to_string(),
            uv_install_script_unix: DEFAULT_UV_INSTALL_SCRIPT_UNIX.to_string(),
            selection: SelectionKind::default(),
            stub: None,
            debug: false,
        }
    }
}

impl BuildOptions {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        BuildOptions {
            project: project.into(),
            ..Default::default()
        }
    }
}

/// Build a packaged executable from a Python project
pub fn build_package(options: &BuildOptions) -> std::result::Result<BuildReport, BuildFailure> {
    builder::build(options)
}

/// Summarize an existing packaged executable
pub fn inspect_package(package_path: &Path) -> Result<PackageInfo> {
    PackageReader::open(package_path)?.info()
}
