//! Collect payload entries from the project, includes and metadata

use super::super::config::{BuildConfig, RuntimeSettings};
use super::super::constants::{CONFIG_FILE, SRC_DIR};
use super::super::includes::IncludeSpec;
use super::super::paths::ArchivePath;
use super::super::payload::{Payload, PayloadEntry};
use super::super::project::{ExclusionSet, Project, ProjectKind};
use super::super::selection::{CopyAll, SelectionPolicy};
use super::metadata::AuxFiles;
use crate::exceptions::{PyfuzeError, Result};
use log::{debug, info, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Turns selection inputs into an ordered [`Payload`]; reads, never writes.
#[derive(Debug)]
pub struct PayloadBuilder {
    project: Project,
    requested_entry: String,
    settings: RuntimeSettings,
    excludes: ExclusionSet,
    includes: Vec<IncludeSpec>,
    aux: AuxFiles,
    selection: Box<dyn SelectionPolicy>,
    /// The file being built; never collected into its own payload
    output: Option<PathBuf>,
}

impl PayloadBuilder {
    pub fn new(project: Project, requested_entry: &str, settings: RuntimeSettings) -> Self {
        Self {
            project,
            requested_entry: requested_entry.to_string(),
            settings,
            excludes: ExclusionSet::default(),
            includes: Vec::new(),
            aux: AuxFiles::default(),
            selection: Box::new(CopyAll),
            output: None,
        }
    }

    pub fn with_excludes(mut self, excludes: ExclusionSet) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn with_includes(mut self, includes: Vec<IncludeSpec>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_aux(mut self, aux: AuxFiles) -> Self {
        self.aux = aux;
        self
    }

    pub fn with_selection(mut self, selection: Box<dyn SelectionPolicy>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Entry file the launcher will run
    pub fn effective_entry(&self) -> String {
        self.project.effective_entry(&self.requested_entry)
    }

    /// Archive path of the entry file under `src/`
    pub fn entry_path(&self) -> Result<ArchivePath> {
        let entry = self.effective_entry();
        ArchivePath::parse(SRC_DIR)?
            .join(&entry)
            .map_err(|e| PyfuzeError::InvalidInput(format!("entry '{entry}': {e}")))
    }

    /// True if `path` names the output file
    fn is_output(&self, path: &Path) -> bool {
        let Some(output) = &self.output else {
            return false;
        };
        if path.file_name() != output.file_name() {
            return false;
        }
        match (fs::canonicalize(path), fs::canonicalize(output)) {
            (Ok(walked), Ok(output)) => walked == output,
            _ => path == output.as_path(),
        }
    }

    /// Build the entry list: root metadata, control file, project tree, includes.
    pub fn build(&self) -> Result<Payload> {
        let timer = Instant::now();
        let entry = self.effective_entry();
        let entry_path = self.entry_path()?;
        let config = BuildConfig::from_settings(&self.settings, &entry)?;
        let config_text = config.serialize();
        let mut payload = Payload::new(config);

        for aux_entry in self.aux.entries()? {
            payload.push(aux_entry);
        }

        payload.push(PayloadEntry::bytes(
            ArchivePath::parse(CONFIG_FILE)?,
            config_text,
        ));
        info!("✓ wrote {CONFIG_FILE}");

        let src_root = ArchivePath::parse(SRC_DIR)?;
        let copied = match self.project.kind {
            ProjectKind::File => {
                let path = src_root.join(&self.project.name)?;
                payload.push(PayloadEntry::file(path, &self.project.root));
                1
            }
            ProjectKind::Directory => self.collect_tree(&src_root, &mut payload)?,
        };
        info!(
            "✓ copied {} to src ({} file(s), {})",
            self.project.name,
            copied,
            self.selection.name()
        );

        for include in &self.includes {
            self.collect_include(include, &mut payload)?;
        }

        if payload.get(entry_path.as_str()).is_none() {
            warn!("Entry file {entry} is not part of the payload");
        }

        debug!(
            "Collected {} payload entries in {:?}",
            payload.len(),
            timer.elapsed()
        );
        Ok(payload)
    }

    /// Walk the project directory in file-name order
    fn collect_tree(&self, src_root: &ArchivePath, payload: &mut Payload) -> Result<usize> {
        let root = &self.project.root;
        let mut copied = 0;

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let excluded = self.excludes.contains(e.path());
                if excluded {
                    debug!("Excluded {}", e.path().display());
                }
                !excluded
            });

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if self.is_output(path) {
                debug!("Skipping build output {}", path.display());
                continue;
            }

            // Symlinked files resolve elsewhere; exclusion is by resolved path
            if entry.path_is_symlink() {
                let resolved = fs::canonicalize(path).map_err(|e| PyfuzeError::file(path, e))?;
                if self.excludes.contains(&resolved) {
                    debug!("Excluded {} (-> {})", path.display(), resolved.display());
                    continue;
                }
            }

            if !self.selection.accepts(root, path) {
                trace!("Policy {} skipped {}", self.selection.name(), path.display());
                continue;
            }

            let archive_path = src_root.join_fs(relative_to(path, root)?)?;
            trace!("{} -> {}", path.display(), archive_path);
            payload.push(PayloadEntry::file(archive_path, path));
            copied += 1;
        }

        Ok(copied)
    }

    /// Add one include; a missing source only warns
    fn collect_include(&self, include: &IncludeSpec, payload: &mut Payload) -> Result<usize> {
        let source = &include.source;
        if !source.exists() {
            warn!(
                "Include source {} does not exist, skipping",
                source.display()
            );
            return Ok(0);
        }

        let mut copied = 0;
        if self.is_output(source) {
            debug!("Skipping build output {}", source.display());
        } else if source.is_file() {
            if payload.push(PayloadEntry::file(include.destination.clone(), source)) {
                info!("Include {} replaces an existing entry", include.destination);
            }
            copied += 1;
        } else {
            for entry in WalkDir::new(source).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();
                if !path.is_file() || self.is_output(path) {
                    continue;
                }
                let archive_path = include.destination.join_fs(relative_to(path, source)?)?;
                if payload.push(PayloadEntry::file(archive_path.clone(), path)) {
                    info!("Include {archive_path} replaces an existing entry");
                }
                copied += 1;
            }
        }

        info!(
            "✓ copied {} to {} ({} file(s))",
            source.display(),
            include.destination,
            copied
        );
        Ok(copied)
    }
}

fn relative_to<'a>(path: &'a Path, base: &Path) -> Result<&'a Path> {
    path.strip_prefix(base).map_err(|_| {
        PyfuzeError::Generic(format!(
            "{} is not under {}",
            path.display(),
            base.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::config::EnvVar;
    use crate::package::selection::PackageRootsOnly;
    use std::io::Read;
    use tempfile::TempDir;

    fn settings() -> RuntimeSettings {
        RuntimeSettings {
            unzip_path: "/tmp/x".to_string(),
            win_gui: false,
            uv_install_script_windows: "https://astral.sh/uv/install.ps1".to_string(),
            uv_install_script_unix: "https://astral.sh/uv/install.sh".to_string(),
            env: vec![EnvVar {
                key: "FOO".to_string(),
                value: "bar".to_string(),
            }],
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// project/{main.py, pkg/__init__.py, pkg/core.py, tests/test_core.py, notes.txt}
    fn sample_project(temp: &TempDir) -> Project {
        let root = temp.path().join("project");
        write(&root.join("main.py"), "import pkg");
        write(&root.join("pkg/__init__.py"), "");
        write(&root.join("pkg/core.py"), "X = 1");
        write(&root.join("tests/test_core.py"), "assert True");
        write(&root.join("notes.txt"), "todo");
        Project::resolve(&root).unwrap()
    }

    #[test]
    fn test_single_file_project() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("main.py");
        write(&script, "print('hi')");

        let project = Project::resolve(&script).unwrap();
        let payload = PayloadBuilder::new(project, "other.py", settings())
            .build()
            .unwrap();

        assert_eq!(payload.paths(), vec![".pyfuze_config.txt", "src/main.py"]);
        assert_eq!(payload.config().get("entry"), Some("main.py"));
    }

    #[test]
    fn test_directory_copy_all_is_sorted() {
        let temp = TempDir::new().unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .build()
            .unwrap();

        assert_eq!(
            payload.paths(),
            vec![
                ".pyfuze_config.txt",
                "src/main.py",
                "src/notes.txt",
                "src/pkg/__init__.py",
                "src/pkg/core.py",
                "src/tests/test_core.py",
            ]
        );
        assert_eq!(payload.config().get("env_FOO"), Some("bar"));
    }

    #[test]
    fn test_package_roots_policy() {
        let temp = TempDir::new().unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .with_selection(Box::new(PackageRootsOnly))
            .build()
            .unwrap();

        assert_eq!(
            payload.paths(),
            vec![
                ".pyfuze_config.txt",
                "src/main.py",
                "src/pkg/__init__.py",
                "src/pkg/core.py",
            ]
        );
    }

    #[test]
    fn test_exclusion_drops_descendants() {
        let temp = TempDir::new().unwrap();
        let project = sample_project(&temp);
        let excludes =
            ExclusionSet::resolve(&project.root, &["tests".to_string(), "notes.txt".to_string()])
                .unwrap();

        let payload = PayloadBuilder::new(project, "main.py", settings())
            .with_excludes(excludes)
            .build()
            .unwrap();

        let paths = payload.paths();
        assert!(!paths.iter().any(|p| p.starts_with("src/tests")));
        assert!(!paths.contains(&"src/notes.txt"));
        assert!(paths.contains(&"src/pkg/core.py"));
    }

    #[test]
    fn test_include_directory_with_destination() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("assets");
        write(&assets.join("a.png"), "png-a");
        write(&assets.join("sub/b.png"), "png-b");

        let include: IncludeSpec = format!("{}::static", assets.display()).parse().unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .with_includes(vec![include])
            .build()
            .unwrap();

        let paths = payload.paths();
        assert!(paths.contains(&"src/static/a.png"));
        assert!(paths.contains(&"src/static/sub/b.png"));
    }

    #[test]
    fn test_include_shadows_project_file() {
        let temp = TempDir::new().unwrap();
        let override_file = temp.path().join("core_override.py");
        write(&override_file, "X = 2");

        let include: IncludeSpec = format!("{}::pkg/core.py", override_file.display())
            .parse()
            .unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .with_includes(vec![include])
            .build()
            .unwrap();

        let entry = payload.get("src/pkg/core.py").unwrap();
        let mut content = String::new();
        entry.open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "X = 2");
        assert_eq!(
            payload.paths().iter().filter(|p| **p == "src/pkg/core.py").count(),
            1
        );
    }

    #[test]
    fn test_missing_include_is_skipped() {
        let temp = TempDir::new().unwrap();
        let include: IncludeSpec = format!("{}::x", temp.path().join("nope").display())
            .parse()
            .unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .with_includes(vec![include])
            .build()
            .unwrap();
        assert!(!payload.paths().iter().any(|p| p.starts_with("src/x")));
    }

    #[test]
    fn test_aux_files_come_first() {
        let temp = TempDir::new().unwrap();
        let aux = AuxFiles::from_options(Some("3.12"), Some("rich,click"), None, None).unwrap();
        let payload = PayloadBuilder::new(sample_project(&temp), "main.py", settings())
            .with_aux(aux)
            .build()
            .unwrap();

        assert_eq!(
            &payload.paths()[..3],
            &[".python-version", "requirements.txt", ".pyfuze_config.txt"]
        );
    }

    #[test]
    fn test_output_file_is_never_collected() {
        let temp = TempDir::new().unwrap();
        let project = sample_project(&temp);
        let output = project.root.join("build/project.com");
        write(&output, "MZ stub");

        let include: IncludeSpec = format!("{}::copy", project.root.display()).parse().unwrap();
        let payload = PayloadBuilder::new(project, "main.py", settings())
            .with_includes(vec![include])
            .with_output(&output)
            .build()
            .unwrap();

        let paths = payload.paths();
        assert!(!paths.iter().any(|p| p.ends_with("project.com")));
        assert!(paths.contains(&"src/main.py"));
        assert!(paths.contains(&"src/copy/main.py"));
    }

    #[test]
    fn test_escaping_entry_is_invalid_input() {
        let temp = TempDir::new().unwrap();
        let builder = PayloadBuilder::new(sample_project(&temp), "../run.py", settings());
        assert!(matches!(
            builder.entry_path(),
            Err(PyfuzeError::InvalidInput(_))
        ));
        assert!(matches!(builder.build(), Err(PyfuzeError::InvalidInput(_))));

        let builder = PayloadBuilder::new(sample_project(&temp), "app/main.py", settings());
        assert_eq!(builder.entry_path().unwrap().as_str(), "src/app/main.py");
    }
}
