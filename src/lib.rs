//! pyfuze - package Python projects into a single self-extracting executable
//!
//! The output is a dual-format file: a launcher stub followed by a zip
//! container holding the project sources, dependency metadata and the
//! `.pyfuze_config.txt` control file the stub reads at run time.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Correctness
    missing_debug_implementations,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_enum_variant,

    // Code clarity and maintainability
    clippy::cognitive_complexity,
    clippy::too_many_arguments,
    clippy::type_complexity,

    // Best practices
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::single_match_else,
    clippy::needless_continue,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
)]

pub mod api;
pub mod exceptions;
pub mod exit_codes;
pub mod logger;
pub mod package;
pub mod utils;
pub mod version;

// Re-export main API functions
pub use api::{BuildOptions, build_package, inspect_package};
pub use exceptions::{BuildFailure, BuildStep, PyfuzeError};
pub use package::{BuildReport, PackageInfo};
