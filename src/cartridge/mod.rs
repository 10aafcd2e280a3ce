// Cartridge - iNES ROM image loading and bank storage
//
// A cartridge owns the raw byte arrays the mappers translate addresses into:
// PRG-ROM (16KB units), CHR-ROM or CHR-RAM (8KB units), and 8KB of battery
// backed SRAM. The mirroring mode lives here because MMC1/MMC3/AxROM rewrite
// it at runtime and the PPU reads it through the mapper on every nametable
// access.
//
// # iNES v1 header (16 bytes)
//
// | Offset | Meaning                                              |
// |--------|------------------------------------------------------|
// | 0-3    | Magic "NES\x1A" (little-endian u32 0x1A53454E)       |
// | 4      | PRG-ROM size in 16KB units                           |
// | 5      | CHR-ROM size in 8KB units (0 = board has CHR-RAM)    |
// | 6      | Flags: mirror-V, battery, trainer, four-screen,      |
// |        | mapper number low nibble                             |
// | 7      | Flags: mapper number high nibble                     |
// | 8-15   | Padding (ignored)                                    |
//
// A 512-byte trainer, when flagged, sits between the header and PRG-ROM and
// is skipped.

pub mod mappers;

pub use mappers::Mapper;

use crate::error::{RomError, SramError};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// iNES magic number, "NES\x1A" read as a little-endian u32
const INES_MAGIC: u32 = 0x1A53_454E;

/// PRG-ROM unit size (16KB)
pub const PRG_UNIT: usize = 16 * 1024;

/// CHR unit size (8KB)
pub const CHR_UNIT: usize = 8 * 1024;

/// Battery-backed SRAM size (8KB)
pub const SRAM_SIZE: usize = 8 * 1024;

/// Nametable mirroring arrangement
///
/// The discriminants index the PPU's mirror lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal = 0,
    Vertical = 1,
    SingleScreen0 = 2,
    SingleScreen1 = 3,
    FourScreen = 4,
}

/// A parsed ROM image plus its mutable on-cartridge memory
pub struct Cartridge {
    /// PRG-ROM data (multiple of 16KB)
    pub prg: Vec<u8>,
    /// CHR-ROM, or zero-filled CHR-RAM when the header's CHR count is 0
    pub chr: Vec<u8>,
    /// 8KB battery-backed save RAM at $6000-$7FFF
    pub sram: Vec<u8>,
    /// Mapper number from the header
    pub mapper_id: u8,
    /// Current mirroring; mutated at runtime by MMC1/MMC3/AxROM
    pub mirroring: Mirroring,
    /// Whether the board has battery-backed SRAM worth persisting
    pub battery: bool,
    /// True when `chr` is RAM and PPU writes to it are honored
    pub chr_is_ram: bool,
}

impl Cartridge {
    /// Parse an iNES v1 image from raw file bytes.
    pub fn from_ines(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < 16 {
            return Err(RomError::HeaderTruncated(data.len()));
        }

        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic != INES_MAGIC {
            return Err(RomError::MagicMismatch(magic));
        }

        let prg_units = data[4] as usize;
        let chr_units = data[5] as usize;
        let ctrl1 = data[6];
        let ctrl2 = data[7];

        let mapper_id = (ctrl2 & 0xF0) | (ctrl1 >> 4);
        let battery = ctrl1 & 0x02 != 0;
        let has_trainer = ctrl1 & 0x04 != 0;

        let mirroring = if ctrl1 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if ctrl1 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // The trainer, if present, is read and discarded
        let body_start = if has_trainer { 16 + 512 } else { 16 };
        let prg_len = prg_units * PRG_UNIT;
        let chr_len = chr_units * CHR_UNIT;

        let expected = (body_start - 16) + prg_len + chr_len;
        let found = data.len() - 16;
        if found < expected {
            return Err(RomError::BodyTruncated { expected, found });
        }

        let prg = data[body_start..body_start + prg_len].to_vec();
        let chr_is_ram = chr_units == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_UNIT]
        } else {
            data[body_start + prg_len..body_start + prg_len + chr_len].to_vec()
        };

        info!(
            "loaded iNES image: mapper {}, {}x16KB PRG, {}x8KB CHR{}, {:?} mirroring{}",
            mapper_id,
            prg_units,
            chr_units,
            if chr_is_ram { " (CHR-RAM)" } else { "" },
            mirroring,
            if battery { ", battery" } else { "" },
        );

        Ok(Cartridge {
            prg,
            chr,
            sram: vec![0; SRAM_SIZE],
            mapper_id,
            mirroring,
            battery,
            chr_is_ram,
        })
    }

    /// Load an iNES image from disk.
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let data = fs::read(path)?;
        Self::from_ines(&data)
    }

    /// Path of the save file that sits next to the ROM: `<rompath>.srm`
    pub fn sram_path(rom_path: &Path) -> PathBuf {
        let mut p = rom_path.as_os_str().to_owned();
        p.push(".srm");
        PathBuf::from(p)
    }

    /// Load battery SRAM from `<rompath>.srm` if the board has a battery.
    ///
    /// A missing or unreadable file is not fatal: the SRAM stays zeroed.
    pub fn load_sram(&mut self, rom_path: &Path) {
        if !self.battery {
            return;
        }
        let path = Self::sram_path(rom_path);
        match fs::read(&path) {
            Ok(data) => {
                let n = data.len().min(SRAM_SIZE);
                self.sram[..n].copy_from_slice(&data[..n]);
                info!("restored {} bytes of SRAM from {}", n, path.display());
            }
            Err(source) => {
                let err = SramError::ReadFailure {
                    path: path.display().to_string(),
                    source,
                };
                warn!("{} (starting with blank save RAM)", err);
            }
        }
    }

    /// Write battery SRAM to `<rompath>.srm` on clean shutdown.
    ///
    /// A write failure is logged, not propagated.
    pub fn save_sram(&self, rom_path: &Path) {
        if !self.battery {
            return;
        }
        let path = Self::sram_path(rom_path);
        if let Err(source) = fs::write(&path, &self.sram) {
            let err = SramError::WriteFailure {
                path: path.display().to_string(),
                source,
            };
            warn!("{}", err);
        } else {
            info!("saved SRAM to {}", path.display());
        }
    }
}
