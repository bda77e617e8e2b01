//! Package builder
//!
//! Runs the build steps in order and stops at the first failure:
//! resolve inputs, copy the stub, patch its subsystem, collect the payload,
//! append the zip container. Every input is validated during resolve, so an
//! input error never touches the output path.

pub mod assembler;
pub mod metadata;
pub mod payload_builder;

use assembler::append_archive;
use metadata::AuxFiles;
use payload_builder::PayloadBuilder;

use super::config::{EnvVar, RuntimeSettings};
use super::defaults::{
    DEFAULT_STAGING_PERMS, DEFAULT_STUB_NAME, STUB_ENV, default_output_name, default_unzip_path,
};
use super::includes::IncludeSpec;
use super::pe_utils::{Subsystem, set_subsystem};
use super::project::{ExclusionSet, Project};
use crate::api::BuildOptions;
use crate::exceptions::{BuildFailure, BuildStep, PyfuzeError, Result, StepContext};
use crate::utils::{format_size, set_mode};
use log::{debug, info, trace};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of a successful build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub output: PathBuf,
    /// Subsystem the output runs under on Windows
    pub subsystem: String,
    /// Archive entry names in write order
    pub entries: Vec<String>,
    pub digest: String,
    pub stub_size: u64,
    pub archive_size: u64,
}

/// Validated inputs produced by the resolve step
#[derive(Debug)]
struct ResolvedBuild {
    stub: PathBuf,
    output: PathBuf,
    subsystem: Subsystem,
    payload: PayloadBuilder,
}

/// Build a packaged executable
pub fn build(options: &BuildOptions) -> std::result::Result<BuildReport, BuildFailure> {
    let start_time = Instant::now();
    info!("📦 Packaging {}", options.project.display());
    trace!("🔍 Build options: {:?}", options);

    let resolved = resolve(options).step(BuildStep::Resolve)?;

    copy_stub(&resolved.stub, &resolved.output).step(BuildStep::CopyStub)?;

    match resolved.subsystem {
        Subsystem::Console => {
            set_subsystem(&resolved.output, Subsystem::Console).step(BuildStep::PatchHeader)?;
            info!("✓ patched subsystem to {}", Subsystem::Console);
        }
        Subsystem::Windowed => debug!("Keeping windowed subsystem of the stub"),
    }

    let (payload, digest) = resolved
        .payload
        .build()
        .and_then(|payload| {
            let digest = payload.digest()?;
            Ok((payload, digest))
        })
        .step(BuildStep::BuildPayload)?;
    if let Ok(total) = payload.total_size() {
        debug!("Payload holds {} uncompressed", format_size(total));
    }

    let summary = append_archive(&resolved.output, &payload).step(BuildStep::AppendArchive)?;

    info!(
        "✅ Built {} ({}, {} entries) in {:?}",
        resolved.output.display(),
        format_size(summary.stub_size + summary.archive_size),
        summary.entry_count,
        start_time.elapsed()
    );

    Ok(BuildReport {
        output: resolved.output,
        subsystem: resolved.subsystem.to_string(),
        entries: payload.paths().into_iter().map(str::to_string).collect(),
        digest,
        stub_size: summary.stub_size,
        archive_size: summary.archive_size,
    })
}

fn resolve(options: &BuildOptions) -> Result<ResolvedBuild> {
    let project = Project::resolve(&options.project)?;

    let env_vars = options
        .env
        .iter()
        .map(|e| e.parse::<EnvVar>())
        .collect::<Result<Vec<_>>>()?;
    let includes = options
        .includes
        .iter()
        .map(|i| i.parse::<IncludeSpec>())
        .collect::<Result<Vec<_>>>()?;
    let excludes = if project.is_file() {
        if !options.excludes.is_empty() {
            debug!("Ignoring exclusions for single-file project");
        }
        ExclusionSet::default()
    } else {
        ExclusionSet::resolve(&project.root, &options.excludes)?
    };
    let aux = AuxFiles::from_options(
        options.python_version.as_deref(),
        options.requirements.as_deref(),
        options.pyproject.as_deref(),
        options.uv_lock.as_deref(),
    )?;

    let stub = resolve_stub(options.stub.as_deref())?;

    let output_name = match &options.output_name {
        Some(name) => validate_output_name(name)?,
        None => default_output_name(&project.stem),
    };
    let output = absolute(&options.out_dir)?.join(output_name);
    if fs::canonicalize(&output).is_ok_and(|existing| existing == stub) {
        return Err(PyfuzeError::InvalidInput(format!(
            "output {} would overwrite the launcher stub",
            output.display()
        )));
    }

    let settings = RuntimeSettings {
        unzip_path: options
            .unzip_path
            .clone()
            .unwrap_or_else(|| default_unzip_path(&project.stem)),
        win_gui: options.win_gui,
        uv_install_script_windows: options.uv_install_script_windows.clone(),
        uv_install_script_unix: options.uv_install_script_unix.clone(),
        env: env_vars,
    };

    let payload = PayloadBuilder::new(project, &options.entry, settings)
        .with_excludes(excludes)
        .with_includes(includes)
        .with_aux(aux)
        .with_selection(options.selection.policy())
        .with_output(&output);
    let entry_path = payload.entry_path()?;
    debug!("Entry resolves to {entry_path}");

    debug!("Output will be written to {}", output.display());
    Ok(ResolvedBuild {
        stub,
        output,
        subsystem: Subsystem::for_gui(options.win_gui),
        payload,
    })
}

/// Locate the launcher stub.
///
/// Priority order:
/// 1. Explicit path from options
/// 2. PYFUZE_STUB environment variable
/// 3. `pyfuze.com` next to the running executable
fn resolve_stub(explicit: Option<&Path>) -> Result<PathBuf> {
    let (candidate, origin) = if let Some(path) = explicit {
        (path.to_path_buf(), "--stub")
    } else if let Ok(path) = env::var(STUB_ENV) {
        (PathBuf::from(path), STUB_ENV)
    } else {
        let exe = env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            PyfuzeError::StubNotFound(format!("{} has no parent directory", exe.display()))
        })?;
        (dir.join(DEFAULT_STUB_NAME), "executable directory")
    };

    match fs::canonicalize(&candidate) {
        Ok(path) if path.is_file() => {
            debug!("🚀 Using launcher stub {} (from {origin})", path.display());
            Ok(path)
        }
        _ => Err(PyfuzeError::StubNotFound(format!(
            "{} (from {origin})",
            candidate.display()
        ))),
    }
}

/// The output name is a bare file name inside the output directory
fn validate_output_name(name: &str) -> Result<String> {
    let is_plain = Path::new(name)
        .file_name()
        .is_some_and(|file_name| file_name == name);
    if name.is_empty() || !is_plain || name.contains(['/', '\\']) {
        return Err(PyfuzeError::InvalidInput(format!(
            "output name '{name}' must be a plain file name"
        )));
    }
    Ok(name.to_string())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn copy_stub(stub: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| PyfuzeError::file(parent, e))?;
    }
    let copied = fs::copy(stub, output).map_err(|e| PyfuzeError::file(output, e))?;
    // Read-only stubs copy their mode; the copy must be writable for patching
    set_mode(output, DEFAULT_STAGING_PERMS).map_err(|e| PyfuzeError::file(output, e))?;
    info!("✓ copied launcher stub ({})", format_size(copied));
    Ok(())
}
