use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    // Version precedence: PYFUZE_VERSION env, then the VERSION file, then Cargo.toml
    let version = if let Ok(v) = env::var("PYFUZE_VERSION") {
        v
    } else {
        let version_file = Path::new("VERSION");
        if version_file.exists() {
            fs::read_to_string(version_file)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string())
        } else {
            env!("CARGO_PKG_VERSION").to_string()
        }
    };

    println!("cargo:rustc-env=PYFUZE_VERSION={}", version);
    println!("cargo:rerun-if-changed=VERSION");
    println!("cargo:rerun-if-env-changed=PYFUZE_VERSION");

    // Outside a git checkout (e.g. a packaged crate) the commit is left unset
    let commit = env::var("GIT_COMMIT").ok().or_else(|| {
        Command::new("git")
            .args(["rev-parse", "HEAD"])
            .output()
            .ok()
            .filter(|out| out.status.success())
            .and_then(|out| String::from_utf8(out.stdout).ok())
            .map(|hash| hash.trim().to_string())
            .filter(|hash| !hash.is_empty())
    });
    if let Some(commit) = commit {
        println!("cargo:rustc-env=GIT_COMMIT={}", commit);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=GIT_COMMIT");

    // SOURCE_DATE_EPOCH pins the timestamp for reproducible builds
    let build_time = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|epoch| epoch.trim().parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(chrono::Utc::now);
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        build_time.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
