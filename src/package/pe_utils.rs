//! Windows PE subsystem patching
//!
//! The launcher stub ships with the windowed (GUI) subsystem. Console builds
//! flip the 2-byte `Subsystem` field of the optional header in place so the
//! stub never needs recompiling. Offsets come from [`PE_LAYOUT`].
//!
//! The stub is a trusted input: the header pointer is not validated, so
//! patching a file that is not a PE image writes two bytes somewhere inside
//! it (or extends it) and corrupts it silently.

use super::constants::{DOS_MAGIC, PE_LAYOUT, PeLayout, SUBSYSTEM_WINDOWS_CUI, SUBSYSTEM_WINDOWS_GUI};
use anyhow::{Context, Result};
use log::{debug, trace};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Presentation mode selected by the PE subsystem field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// No console window (IMAGE_SUBSYSTEM_WINDOWS_GUI)
    Windowed,
    /// Console window (IMAGE_SUBSYSTEM_WINDOWS_CUI)
    Console,
}

impl Subsystem {
    pub fn code(self) -> u16 {
        match self {
            Subsystem::Windowed => SUBSYSTEM_WINDOWS_GUI,
            Subsystem::Console => SUBSYSTEM_WINDOWS_CUI,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            SUBSYSTEM_WINDOWS_GUI => Some(Subsystem::Windowed),
            SUBSYSTEM_WINDOWS_CUI => Some(Subsystem::Console),
            _ => None,
        }
    }

    /// Subsystem for a `--win-gui` choice
    pub fn for_gui(win_gui: bool) -> Self {
        if win_gui {
            Subsystem::Windowed
        } else {
            Subsystem::Console
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Windowed => write!(f, "windowed (0x{:02x})", self.code()),
            Subsystem::Console => write!(f, "console (0x{:02x})", self.code()),
        }
    }
}

/// Check if data starts with the DOS "MZ" signature.
pub fn is_pe_executable(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == DOS_MAGIC[..]
}

/// Compute the absolute offset of the subsystem field.
///
/// Reads the 4-byte little-endian header pointer at
/// `layout.header_pointer_offset` and adds `layout.subsystem_delta`.
pub fn subsystem_offset<R: Read + Seek>(reader: &mut R, layout: &PeLayout) -> Result<u64> {
    reader
        .seek(SeekFrom::Start(layout.header_pointer_offset))
        .context("Failed to seek to PE header pointer")?;

    let mut pointer = [0u8; 4];
    reader
        .read_exact(&mut pointer)
        .context("Failed to read PE header pointer (file too short)")?;
    let pe_offset = u32::from_le_bytes(pointer) as u64;

    let offset = pe_offset + layout.subsystem_delta;
    trace!(
        "PE header at 0x{:x}, subsystem field at 0x{:x}",
        pe_offset, offset
    );
    Ok(offset)
}

/// Read the raw subsystem code from an open PE image.
pub fn read_subsystem_code<R: Read + Seek>(reader: &mut R, layout: &PeLayout) -> Result<u16> {
    let offset = subsystem_offset(reader, layout)?;
    reader
        .seek(SeekFrom::Start(offset))
        .context("Failed to seek to subsystem field")?;

    let mut field = [0u8; 2];
    reader
        .read_exact(&mut field)
        .with_context(|| format!("Failed to read subsystem field at 0x{offset:x}"))?;
    Ok(u16::from_le_bytes(field))
}

/// Write a subsystem code into an open PE image; exactly 2 bytes change.
pub fn write_subsystem_code<F: Read + Write + Seek>(
    file: &mut F,
    layout: &PeLayout,
    code: u16,
) -> Result<u64> {
    let offset = subsystem_offset(file, layout)?;
    file.seek(SeekFrom::Start(offset))
        .context("Failed to seek to subsystem field")?;
    file.write_all(&code.to_le_bytes()[..layout.subsystem_width])
        .with_context(|| format!("Failed to write subsystem field at 0x{offset:x}"))?;
    file.flush().context("Failed to flush subsystem patch")?;
    Ok(offset)
}

/// Patch the subsystem of the PE file at `path` in place.
pub fn set_subsystem(path: &Path, subsystem: Subsystem) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for patching", path.display()))?;

    let offset = write_subsystem_code(&mut file, &PE_LAYOUT, subsystem.code())?;
    debug!(
        "Patched subsystem of {} to {} at offset 0x{:x}",
        path.display(),
        subsystem,
        offset
    );
    Ok(())
}

/// Read the subsystem code of the PE file at `path`.
pub fn read_subsystem(path: &Path) -> Result<u16> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    read_subsystem_code(&mut file, &PE_LAYOUT)
}
