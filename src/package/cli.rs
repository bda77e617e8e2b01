//! CLI command handlers for packaged executables

use super::reader::PackageReader;
use crate::exceptions::PyfuzeError;
use crate::exit_codes::{EXIT_ERROR, EXIT_PACKAGE_ERROR, EXIT_SUCCESS};
use crate::utils::format_size;
use std::path::Path;

/// Show package information, as text or JSON
pub fn show_info(package_path: &Path, json: bool) -> i32 {
    log::trace!("show_info starting for: {:?}", package_path);
    let info = match PackageReader::open(package_path).and_then(PackageReader::info) {
        Ok(info) => info,
        Err(e @ PyfuzeError::NotAPackage(_)) => {
            eprintln!("Error: {e}");
            return EXIT_PACKAGE_ERROR;
        }
        Err(e) => {
            eprintln!("Error: Failed to read package: {e}");
            return EXIT_ERROR;
        }
    };

    if json {
        return match serde_json::to_string_pretty(&info) {
            Ok(text) => {
                println!("{text}");
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Error: Failed to encode package info: {e}");
                EXIT_ERROR
            }
        };
    }

    println!("📦 Package Information:");
    println!("  Path: {}", info.path.display());
    println!("  Size: {}", format_size(info.file_size));
    match info.stub_size {
        Some(size) => println!("  Stub: {}", format_size(size)),
        None => println!("  Stub: unknown (empty archive)"),
    }
    println!(
        "  Subsystem: {}",
        info.subsystem.as_deref().unwrap_or("not a PE image")
    );
    println!("  Digest: {}", info.digest);
    println!();
    println!("🔧 Configuration:");
    for (key, value) in info.config.iter() {
        println!("  {key}={value}");
    }
    for key in &info.missing_config_keys {
        println!("  ⚠️  missing {key}");
    }
    println!();
    println!("📊 Entries ({}):", info.entries.len());
    for entry in &info.entries {
        println!(
            "  {:>10}  {:<8} {}",
            format_size(entry.size),
            entry.compression,
            entry.name
        );
    }

    EXIT_SUCCESS
}
