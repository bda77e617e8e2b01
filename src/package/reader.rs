//! Reader for packaged executables
//!
//! `ZipArchive` finds the container through the end-of-central-directory
//! record, so the stub in front of it is never parsed as zip data.

use super::config::BuildConfig;
use super::constants::{CONFIG_FILE, PE_LAYOUT};
use super::payload::PayloadDigest;
use super::pe_utils::{Subsystem, is_pe_executable, read_subsystem_code};
use crate::exceptions::{PyfuzeError, Result};
use log::{debug, trace};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;
use zip::ZipArchive;

/// One archive entry as recorded in the central directory
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub compression: String,
    /// Absolute file offset of the local header
    pub header_offset: u64,
}

/// Everything `pyfuze-inspect` reports
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub path: PathBuf,
    pub file_size: u64,
    /// Bytes in front of the first local header
    pub stub_size: Option<u64>,
    pub subsystem: Option<String>,
    pub entries: Vec<EntryInfo>,
    pub config: BuildConfig,
    pub missing_config_keys: Vec<&'static str>,
    pub digest: String,
}

/// Reader for a dual-format (executable + zip) package
pub struct PackageReader {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl std::fmt::Debug for PackageReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageReader")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl PackageReader {
    pub fn open(path: &Path) -> Result<Self> {
        let timer = Instant::now();
        let file = File::open(path).map_err(|e| PyfuzeError::file(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| {
            PyfuzeError::NotAPackage(format!("{}: {e}", path.display()))
        })?;
        trace!(
            "Opened {} ({} entries) in {:?}",
            path.display(),
            archive.len(),
            timer.elapsed()
        );
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Entry names in central directory order
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        (0..self.archive.len())
            .map(|i| -> Result<String> {
                Ok(self.archive.by_index_raw(i)?.name().to_string())
            })
            .collect()
    }

    pub fn entries(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index_raw(i)?;
            entries.push(EntryInfo {
                name: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                compression: format!("{:?}", file.compression()),
                header_offset: file.header_start(),
            });
        }
        Ok(entries)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(name)?;
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Parse `.pyfuze_config.txt` with the launcher's tolerant rules
    pub fn read_config(&mut self) -> Result<BuildConfig> {
        let data = self.read_entry(CONFIG_FILE).map_err(|e| match e {
            PyfuzeError::ZipError(zip::result::ZipError::FileNotFound) => {
                PyfuzeError::NotAPackage(format!("{} has no {CONFIG_FILE}", self.path.display()))
            }
            other => other,
        })?;
        Ok(BuildConfig::parse(&String::from_utf8_lossy(&data)))
    }

    /// Offset of the first local header, i.e. the stub length
    pub fn payload_offset(&mut self) -> Result<Option<u64>> {
        let mut offset: Option<u64> = None;
        for i in 0..self.archive.len() {
            let start = self.archive.by_index_raw(i)?.header_start();
            offset = Some(offset.map_or(start, |o| o.min(start)));
        }
        Ok(offset)
    }

    /// Subsystem of the stub, if it is a PE image
    pub fn stub_subsystem(&self) -> Result<Option<u16>> {
        let mut file = File::open(&self.path).map_err(|e| PyfuzeError::file(&self.path, e))?;
        let mut magic = [0u8; 2];
        if file.read_exact(&mut magic).is_err() || !is_pe_executable(&magic) {
            debug!("{} has no DOS header", self.path.display());
            return Ok(None);
        }
        file.seek(SeekFrom::Start(0))?;
        Ok(Some(read_subsystem_code(&mut file, &PE_LAYOUT)?))
    }

    /// Digest over entries in archive order; matches the build report
    pub fn digest(&mut self) -> Result<String> {
        let mut digest = PayloadDigest::new();
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            digest.update_entry(&name, file)?;
        }
        Ok(digest.finish())
    }

    pub fn info(mut self) -> Result<PackageInfo> {
        let file_size = std::fs::metadata(&self.path)
            .map_err(|e| PyfuzeError::file(&self.path, e))?
            .len();
        let config = self.read_config()?;
        let subsystem = self.stub_subsystem()?.map(|code| match Subsystem::from_code(code) {
            Some(subsystem) => subsystem.to_string(),
            None => format!("unknown (0x{code:02x})"),
        });

        Ok(PackageInfo {
            file_size,
            stub_size: self.payload_offset()?,
            subsystem,
            entries: self.entries()?,
            missing_config_keys: config.missing_required(),
            config,
            digest: self.digest()?,
            path: self.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::builder::assembler::append_archive;
    use crate::package::constants::{SUBSYSTEM_WINDOWS_CUI, SUBSYSTEM_WINDOWS_GUI};
    use crate::package::paths::ArchivePath;
    use crate::package::payload::{Payload, PayloadEntry};
    use crate::package::pe_utils::write_subsystem_code;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn stub() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[..2].copy_from_slice(b"MZ");
        data[0x3C..0x40].copy_from_slice(&0x80u32.to_le_bytes());
        data[0x80 + 92..0x80 + 94].copy_from_slice(&SUBSYSTEM_WINDOWS_GUI.to_le_bytes());
        data
    }

    fn payload() -> Payload {
        let mut payload = Payload::default();
        payload.push(PayloadEntry::bytes(
            ArchivePath::parse(".pyfuze_config.txt").unwrap(),
            "unzip_path=/tmp/app\nentry=main.py\nwin_gui=0\nenv_FOO=a=b",
        ));
        payload.push(PayloadEntry::bytes(
            ArchivePath::parse("src/main.py").unwrap(),
            "print('packaged')",
        ));
        payload
    }

    fn package(dir: &TempDir, stub: &[u8], payload: &Payload) -> PathBuf {
        let path = dir.path().join("app.com");
        fs::write(&path, stub).unwrap();
        append_archive(&path, payload).unwrap();
        path
    }

    #[test]
    fn test_reads_back_entries_and_config() {
        let dir = TempDir::new().unwrap();
        let payload = payload();
        let path = package(&dir, &stub(), &payload);

        let mut reader = PackageReader::open(&path).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(
            reader.entry_names().unwrap(),
            vec![".pyfuze_config.txt", "src/main.py"]
        );
        assert_eq!(reader.read_entry("src/main.py").unwrap(), b"print('packaged')");

        let config = reader.read_config().unwrap();
        assert_eq!(config.get("entry"), Some("main.py"));
        assert_eq!(config.get("env_FOO"), Some("a=b"));

        assert_eq!(reader.payload_offset().unwrap(), Some(1024));
        assert_eq!(reader.digest().unwrap(), payload.digest().unwrap());
    }

    #[test]
    fn test_info_reports_subsystem() {
        let dir = TempDir::new().unwrap();
        let mut image = Cursor::new(stub());
        write_subsystem_code(&mut image, &PE_LAYOUT, SUBSYSTEM_WINDOWS_CUI).unwrap();
        let path = package(&dir, &image.into_inner(), &payload());

        let info = PackageReader::open(&path).unwrap().info().unwrap();
        assert_eq!(info.subsystem.as_deref(), Some("console (0x03)"));
        assert_eq!(info.stub_size, Some(1024));
        assert_eq!(info.entries.len(), 2);
        assert_eq!(
            info.missing_config_keys,
            vec!["uv_install_script_windows", "uv_install_script_unix"]
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["config"]["unzip_path"], "/tmp/app");
    }

    #[test]
    fn test_non_pe_stub_has_no_subsystem() {
        let dir = TempDir::new().unwrap();
        let path = package(&dir, b"#!/bin/sh\nexit 0\n", &payload());
        let reader = PackageReader::open(&path).unwrap();
        assert_eq!(reader.stub_subsystem().unwrap(), None);
    }

    #[test]
    fn test_rejects_plain_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.com");
        fs::write(&path, stub()).unwrap();
        assert!(matches!(
            PackageReader::open(&path),
            Err(PyfuzeError::NotAPackage(_))
        ));
    }

    #[test]
    fn test_missing_config_is_not_a_package() {
        let dir = TempDir::new().unwrap();
        let mut payload = Payload::default();
        payload.push(PayloadEntry::bytes(
            ArchivePath::parse("src/main.py").unwrap(),
            "x",
        ));
        let path = package(&dir, &stub(), &payload);
        let mut reader = PackageReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_config(),
            Err(PyfuzeError::NotAPackage(_))
        ));
    }
}
