//! Version information for pyfuze binaries

/// Current version, exported by build.rs
pub const VERSION: &str = env!("PYFUZE_VERSION");

/// UTC build timestamp from build.rs, honoring `SOURCE_DATE_EPOCH`
pub const BUILD_TIME: Option<&str> = option_env!("BUILD_TIME");

/// Git commit hash; unset when building outside a git checkout
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Get full version string with optional build information
pub fn full_version() -> String {
    let mut version = VERSION.to_string();

    if let Some(commit) = GIT_COMMIT {
        version.push_str(&format!(" ({})", &commit[..8.min(commit.len())]));
    }

    if let Some(time) = BUILD_TIME {
        version.push_str(&format!(" built {}", time));
    }

    version
}
