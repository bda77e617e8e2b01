//! Append the zip container to the launcher stub copy
//!
//! The zip writer is handed the output file positioned at its end, so every
//! local header and the central directory are recorded at absolute file
//! offsets behind the untouched stub. Readers locate the container through
//! the end-of-central-directory record at the end of the file.

use super::super::defaults::{DEFAULT_ENTRY_PERMS, DEFAULT_EXECUTABLE_PERMS};
use super::super::payload::{EntrySource, Payload, PayloadEntry, Storage};
use crate::exceptions::{PyfuzeError, Result};
use crate::utils::set_mode;
use log::{debug, info, trace};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Instant;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Sizes recorded while appending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Bytes before the first local header (the stub)
    pub stub_size: u64,
    /// Bytes of zip container appended
    pub archive_size: u64,
    pub entry_count: usize,
}

fn entry_options(entry: &PayloadEntry) -> Result<SimpleFileOptions> {
    let method = match entry.storage {
        Storage::Deflated => CompressionMethod::Deflated,
        Storage::Stored => CompressionMethod::Stored,
    };
    Ok(SimpleFileOptions::default()
        .compression_method(method)
        .unix_permissions(DEFAULT_ENTRY_PERMS)
        .large_file(entry.size()? >= u32::MAX as u64))
}

/// Write every payload entry into a zip container starting at the current
/// end of `inner`. Existing bytes of `inner` are never rewritten.
pub fn append_to<W: Write + Seek>(mut inner: W, payload: &Payload) -> Result<(W, ArchiveSummary)> {
    let stub_size = inner.seek(SeekFrom::End(0))?;
    trace!("Appending zip container at offset {stub_size:#x}");

    let mut zip = ZipWriter::new(inner);
    for entry in payload.entries() {
        zip.start_file(entry.path.as_str(), entry_options(entry)?)?;
        match &entry.source {
            EntrySource::Bytes(data) => zip.write_all(data)?,
            EntrySource::File(path) => {
                let mut file = File::open(path).map_err(|e| PyfuzeError::file(path, e))?;
                io::copy(&mut file, &mut zip).map_err(|e| PyfuzeError::file(path, e))?;
            }
        }
        trace!("Wrote {} ({:?})", entry.path, entry.storage);
    }

    let mut inner = zip.finish()?;
    let end = inner.stream_position()?;
    let summary = ArchiveSummary {
        stub_size,
        archive_size: end - stub_size,
        entry_count: payload.len(),
    };
    Ok((inner, summary))
}

/// Append the payload to the stub copy at `output` and mark it executable.
///
/// A failure leaves the partially written file on disk.
pub fn append_archive(output: &Path, payload: &Payload) -> Result<ArchiveSummary> {
    let timer = Instant::now();

    // Not O_APPEND: the zip writer seeks back to finalize local headers
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(output)
        .map_err(|e| PyfuzeError::file(output, e))?;

    let summary = {
        let (writer, summary) = append_to(BufWriter::new(file), payload)?;
        let file = writer
            .into_inner()
            .map_err(|e| PyfuzeError::file(output, e.into_error()))?;
        file.sync_all().map_err(|e| PyfuzeError::file(output, e))?;
        summary
    };

    set_mode(output, DEFAULT_EXECUTABLE_PERMS).map_err(|e| PyfuzeError::file(output, e))?;

    debug!(
        "📦 Appended {} entries: stub={} bytes, archive={} bytes in {:?}",
        summary.entry_count,
        summary.stub_size,
        summary.archive_size,
        timer.elapsed()
    );
    info!("✓ added payload to {}", output.display());
    Ok(summary)
}
