//! Payload entries destined for the embedded zip container

use super::config::BuildConfig;
use super::defaults::PRECOMPRESSED_EXTENSIONS;
use super::paths::ArchivePath;
use crate::exceptions::{PyfuzeError, Result};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// Where an entry's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Generated in memory (config, version pin, requirements list)
    Bytes(Vec<u8>),
    /// Streamed from disk at assembly time
    File(PathBuf),
}

/// Compression applied to an entry inside the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Deflated,
    Stored,
}

/// One (archive path, content) unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub path: ArchivePath,
    pub source: EntrySource,
    pub storage: Storage,
}

impl PayloadEntry {
    pub fn bytes(path: ArchivePath, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path,
            source: EntrySource::Bytes(data.into()),
            storage: Storage::Deflated,
        }
    }

    /// File-backed entry; already-compressed formats are stored raw.
    pub fn file(path: ArchivePath, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let storage = if is_precompressed(&file) {
            Storage::Stored
        } else {
            Storage::Deflated
        };
        Self {
            path,
            source: EntrySource::File(file),
            storage,
        }
    }

    pub fn stored(mut self) -> Self {
        self.storage = Storage::Stored;
        self
    }

    /// Open the content for streaming
    pub fn open(&self) -> Result<Box<dyn Read + '_>> {
        match &self.source {
            EntrySource::Bytes(data) => Ok(Box::new(Cursor::new(data.as_slice()))),
            EntrySource::File(path) => {
                let file = File::open(path).map_err(|e| PyfuzeError::file(path, e))?;
                Ok(Box::new(file))
            }
        }
    }

    /// Content length in bytes
    pub fn size(&self) -> Result<u64> {
        match &self.source {
            EntrySource::Bytes(data) => Ok(data.len() as u64),
            EntrySource::File(path) => Ok(std::fs::metadata(path)
                .map_err(|e| PyfuzeError::file(path, e))?
                .len()),
        }
    }
}

fn is_precompressed(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            PRECOMPRESSED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Streaming SHA-256 over (name, content) pairs in archive order.
///
/// Each entry contributes its name, a NUL byte, its length as little-endian
/// u64 and its content, so the digest only depends on names and bytes.
#[derive(Debug, Default)]
pub struct PayloadDigest {
    hasher: Sha256,
}

impl PayloadDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_entry<R: Read>(&mut self, name: &str, mut reader: R) -> io::Result<()> {
        const BUFFER_SIZE: usize = 64 * 1024;
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut content = Sha256::new();
        let mut length: u64 = 0;
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            content.update(&buffer[..bytes_read]);
            length += bytes_read as u64;
        }

        self.hasher.update(name.as_bytes());
        self.hasher.update([0u8]);
        self.hasher.update(length.to_le_bytes());
        self.hasher.update(content.finalize());
        Ok(())
    }

    /// `sha256:<hex>`
    pub fn finish(self) -> String {
        format!("sha256:{}", hex::encode(self.hasher.finalize()))
    }
}

/// Ordered entry list plus the control block it carries
#[derive(Debug, Clone, Default)]
pub struct Payload {
    /// Shadowed entries leave a `None` slot behind
    slots: Vec<Option<PayloadEntry>>,
    index: HashMap<String, usize>,
    config: BuildConfig,
}

impl Payload {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            config,
        }
    }

    /// Append an entry. A repeated path shadows the earlier entry: the old
    /// one is dropped and the new one takes the last position, which is
    /// what a last-writer-wins archive reader would see.
    pub fn push(&mut self, entry: PayloadEntry) -> bool {
        let slot = self.slots.len();
        let shadowed = match self.index.insert(entry.path.as_str().to_string(), slot) {
            Some(previous) => {
                debug!("Entry {} shadows an earlier entry", entry.path);
                self.slots[previous] = None;
                true
            }
            None => false,
        };
        self.slots.push(Some(entry));
        shadowed
    }

    /// Live entries in archive order
    pub fn entries(&self) -> impl Iterator<Item = &PayloadEntry> + '_ {
        self.slots.iter().flatten()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries().map(|e| e.path.as_str()).collect()
    }

    pub fn get(&self, path: &str) -> Option<&PayloadEntry> {
        self.index
            .get(path)
            .and_then(|&slot| self.slots.get(slot))
            .and_then(Option::as_ref)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total uncompressed size of all entries
    pub fn total_size(&self) -> Result<u64> {
        self.entries().map(PayloadEntry::size).sum()
    }

    /// Digest of every entry's name and content, in order
    pub fn digest(&self) -> Result<String> {
        let mut digest = PayloadDigest::new();
        for entry in self.entries() {
            let reader = entry.open()?;
            digest
                .update_entry(entry.path.as_str(), reader)
                .map_err(|e| match &entry.source {
                    EntrySource::File(path) => PyfuzeError::file(path, e),
                    EntrySource::Bytes(_) => PyfuzeError::IoError(e),
                })?;
        }
        Ok(digest.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> ArchivePath {
        ArchivePath::parse(p).unwrap()
    }

    #[test]
    fn test_push_shadows_duplicate_paths() {
        let mut payload = Payload::default();
        assert!(!payload.push(PayloadEntry::bytes(path("src/a.py"), "old")));
        assert!(!payload.push(PayloadEntry::bytes(path("src/b.py"), "b")));
        assert!(payload.push(PayloadEntry::bytes(path("src/a.py"), "new")));

        assert_eq!(payload.paths(), vec!["src/b.py", "src/a.py"]);
        assert_eq!(
            payload.get("src/a.py").unwrap().source,
            EntrySource::Bytes(b"new".to_vec())
        );
    }

    #[test]
    fn test_repeated_shadowing_keeps_one_live_entry() {
        let mut payload = Payload::default();
        for i in 0..100 {
            payload.push(PayloadEntry::bytes(path(&format!("src/m{i}.py")), "x"));
        }
        for round in 0..3 {
            let content = format!("round {round}");
            assert!(payload.push(PayloadEntry::bytes(path("src/m10.py"), content)));
        }

        assert_eq!(payload.len(), 100);
        assert_eq!(payload.entries().count(), 100);
        assert_eq!(payload.paths().last(), Some(&"src/m10.py"));
        assert_eq!(payload.paths()[10], "src/m11.py");
        assert_eq!(
            payload.get("src/m10.py").unwrap().source,
            EntrySource::Bytes(b"round 2".to_vec())
        );
        assert!(payload.get("src/m100.py").is_none());
    }

    #[test]
    fn test_precompressed_files_are_stored() {
        let png = PayloadEntry::file(path("src/static/a.png"), "/x/a.PNG");
        let py = PayloadEntry::file(path("src/main.py"), "/x/main.py");
        assert_eq!(png.storage, Storage::Stored);
        assert_eq!(py.storage, Storage::Deflated);
        assert_eq!(py.stored().storage, Storage::Stored);
    }

    #[test]
    fn test_digest_depends_on_names_and_content() {
        let mut a = Payload::default();
        a.push(PayloadEntry::bytes(path("src/a.py"), "print(1)"));
        let mut b = Payload::default();
        b.push(PayloadEntry::bytes(path("src/a.py"), "print(1)"));
        let mut c = Payload::default();
        c.push(PayloadEntry::bytes(path("src/b.py"), "print(1)"));

        let digest_a = a.digest().unwrap();
        assert!(digest_a.starts_with("sha256:"));
        assert_eq!(digest_a, b.digest().unwrap());
        assert_ne!(digest_a, c.digest().unwrap());
    }

    #[test]
    fn test_file_entry_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("app.py");
        std::fs::write(&file, "print('hi')").unwrap();

        let entry = PayloadEntry::file(path("src/app.py"), &file);
        assert_eq!(entry.size().unwrap(), 11);
        let mut content = String::new();
        entry.open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "print('hi')");

        let missing = PayloadEntry::file(path("src/gone.py"), dir.path().join("gone.py"));
        assert!(matches!(missing.open(), Err(PyfuzeError::File { .. })));
    }
}
