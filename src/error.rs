// Error types shared across the emulator
//
// Startup errors (ROM parsing, unsupported mapper, device init) are fatal and
// bubble up to main. SRAM errors are non-fatal: the emulator logs a warning
// and keeps running with zeroed save RAM.

use std::io;
use thiserror::Error;

/// Errors raised while loading and parsing an iNES ROM image.
#[derive(Debug, Error)]
pub enum RomError {
    /// The ROM file could not be opened or read
    #[error("failed to open ROM file: {0}")]
    OpenFailure(#[from] io::Error),

    /// The file does not start with the iNES magic "NES\x1A"
    #[error("not an iNES file (bad magic {0:#010X})")]
    MagicMismatch(u32),

    /// The file ends before the 16-byte iNES header
    #[error("iNES header truncated ({0} bytes)")]
    HeaderTruncated(usize),

    /// The file ends before the PRG/CHR data promised by the header
    #[error("ROM body truncated: need {expected} bytes after header, found {found}")]
    BodyTruncated { expected: usize, found: usize },

    /// The header names a mapper this emulator does not implement
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// Errors raised while reading or writing the battery-backed SRAM file.
///
/// Both kinds are non-fatal; callers log and continue.
#[derive(Debug, Error)]
pub enum SramError {
    #[error("failed to read SRAM file {path}: {source}")]
    ReadFailure { path: String, source: io::Error },

    #[error("failed to write SRAM file {path}: {source}")]
    WriteFailure { path: String, source: io::Error },
}

/// Errors raised while bringing up the host-side devices.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("audio initialization failed: {0}")]
    AudioInitFailure(String),

    #[error("video initialization failed: {0}")]
    VideoInitFailure(String),
}
