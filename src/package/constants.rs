// src/package/constants.rs
// Binary layout and archive names that the launcher stub depends on.
// For user-facing defaults, see defaults.rs

/// Fixed PE header offsets used to locate the subsystem field.
///
/// The stub is trusted to be a PE image: the DOS header stores the file
/// offset of the `PE\0\0` signature at `header_pointer_offset`, and the
/// optional header's `Subsystem` field sits `subsystem_delta` bytes after
/// that signature (4 signature + 20 COFF header + 68 into the optional
/// header, identical for PE32 and PE32+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeLayout {
    /// Offset of `e_lfanew` in the DOS header
    pub header_pointer_offset: u64,
    /// Distance from the PE signature to the subsystem field
    pub subsystem_delta: u64,
    /// Width of the subsystem field in bytes
    pub subsystem_width: usize,
}

pub const PE_LAYOUT: PeLayout = PeLayout {
    header_pointer_offset: 0x3C,
    subsystem_delta: 92,
    subsystem_width: 2,
};

pub const DOS_MAGIC: &[u8; 2] = b"MZ";

// Subsystem codes
pub const SUBSYSTEM_WINDOWS_GUI: u16 = 0x02;
pub const SUBSYSTEM_WINDOWS_CUI: u16 = 0x03;

// Archive namespaces and root metadata files
pub const SRC_DIR: &str = "src";
pub const CONFIG_FILE: &str = ".pyfuze_config.txt";
pub const PYTHON_VERSION_FILE: &str = ".python-version";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const UV_LOCK_FILE: &str = "uv.lock";

// Python package marker for the package-roots selection policy
pub const PACKAGE_MARKER: &str = "__init__.py";
pub const PYTHON_SOURCE_EXT: &str = "py";

// Include spec separator (source::destination)
pub const INCLUDE_SEPARATOR: &str = "::";

// BuildConfig keys
pub const KEY_UNZIP_PATH: &str = "unzip_path";
pub const KEY_ENTRY: &str = "entry";
pub const KEY_WIN_GUI: &str = "win_gui";
pub const KEY_UV_INSTALL_SCRIPT_WINDOWS: &str = "uv_install_script_windows";
pub const KEY_UV_INSTALL_SCRIPT_UNIX: &str = "uv_install_script_unix";
pub const ENV_KEY_PREFIX: &str = "env_";

/// Keys the launcher refuses to start without
pub const REQUIRED_CONFIG_KEYS: [&str; 5] = [
    KEY_UNZIP_PATH,
    KEY_ENTRY,
    KEY_WIN_GUI,
    KEY_UV_INSTALL_SCRIPT_WINDOWS,
    KEY_UV_INSTALL_SCRIPT_UNIX,
];
