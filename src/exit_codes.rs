//! Standard exit codes for pyfuze binaries
//!
//! Shared by the builder and the inspector so scripts can tell failure
//! kinds apart.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Generic error (avoid using - be more specific)
pub const EXIT_ERROR: i32 = 1;

/// Panic or unrecoverable error
pub const EXIT_PANIC: i32 = 101;

/// File is not a dual-format package (no zip container found)
pub const EXIT_PACKAGE_ERROR: i32 = 102;

/// Zip container could not be written or read
pub const EXIT_ARCHIVE_ERROR: i32 = 103;

/// Invalid project path, include/exclude spec or env entry
pub const EXIT_INVALID_INPUT: i32 = 105;

/// I/O error (file not found, permission denied, disk error)
pub const EXIT_IO_ERROR: i32 = 106;

/// Build/packaging error
pub const EXIT_BUILD_ERROR: i32 = 108;

/// Launcher stub missing
pub const EXIT_STUB_ERROR: i32 = 110;
