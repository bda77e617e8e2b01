//! Dual-format package implementation
//!
//! A package is a launcher stub with a zip container appended to it.

pub mod builder;
pub mod cli;
pub mod config;
pub mod constants;
pub mod defaults;
pub mod includes;
pub mod paths;
pub mod payload;
pub mod pe_utils;
pub mod project;
pub mod reader;
pub mod selection;

// Re-export main functions
pub use builder::{BuildReport, build};

// Re-export types for advanced usage
pub use config::{BuildConfig, EnvVar, RuntimeSettings};
pub use paths::ArchivePath;
pub use payload::{Payload, PayloadEntry};
pub use pe_utils::Subsystem;
pub use reader::{PackageInfo, PackageReader};
pub use selection::{SelectionKind, SelectionPolicy};
