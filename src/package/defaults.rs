// src/package/defaults.rs
// Centralized default values for the build command line

// =================================
// Launcher stub
// =================================
pub const DEFAULT_STUB_NAME: &str = "pyfuze.com"; // Looked up next to the running binary
pub const STUB_ENV: &str = "PYFUZE_STUB"; // Explicit stub path override

// =================================
// Output
// =================================
pub const DEFAULT_OUT_DIR: &str = "build";
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".com";
pub const DEFAULT_UNZIP_ROOT: &str = "/tmp"; // unzip_path = /tmp/<project stem>

// =================================
// Project
// =================================
pub const DEFAULT_ENTRY: &str = "main.py";

// =================================
// uv bootstrap scripts
// =================================
pub const DEFAULT_UV_INSTALL_SCRIPT_WINDOWS: &str = "https://astral.sh/uv/install.ps1";
pub const DEFAULT_UV_INSTALL_SCRIPT_UNIX: &str = "https://astral.sh/uv/install.sh";

// =================================
// File permissions
// =================================
pub const DEFAULT_EXECUTABLE_PERMS: u32 = 0o755; // Final packaged executable
pub const DEFAULT_ENTRY_PERMS: u32 = 0o644; // Mode recorded for archive entries
pub const DEFAULT_STAGING_PERMS: u32 = 0o644; // Stub copy while it is patched and appended to

// =================================
// Debug switch
// =================================
pub const DEBUG_ENV: &str = "PYFUZE_DEBUG";

/// Extensions whose content is already compressed; stored raw in the archive
pub const PRECOMPRESSED_EXTENSIONS: &[&str] = &[
    "zip", "whl", "gz", "tgz", "bz2", "xz", "zst", "7z", "png", "jpg", "jpeg", "gif", "webp",
    "mp3", "mp4", "ogg",
];

/// Default output file name for a project stem
pub fn default_output_name(project_stem: &str) -> String {
    format!("{project_stem}{DEFAULT_OUTPUT_SUFFIX}")
}

/// Default unpack target for a project stem
pub fn default_unzip_path(project_stem: &str) -> String {
    format!("{DEFAULT_UNZIP_ROOT}/{project_stem}")
}
