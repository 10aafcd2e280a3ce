// Mappers - cartridge address translation and bank switching
//
// Every supported board is one variant of the `Mapper` enum and dispatch is a
// plain `match`. CPU reads route through the mapper on every instruction
// fetch, so the indirection of a trait object is deliberately avoided here.
//
// Shared contract:
// - `cpu_read`/`cpu_write` cover $6000-$FFFF ($6000-$7FFF is SRAM on every
//   supported board, $8000-$FFFF is PRG-ROM; writes into ROM space drive the
//   bank registers)
// - `ppu_read`/`ppu_write` cover the pattern tables at $0000-$1FFF
// - `tick_scanline` is the MMC3 A12 proxy, called by the PPU at dot 280 of
//   render lines while rendering is enabled
// - `take_irq` drains the board IRQ line toward the CPU

mod mapper1;
mod mapper2;
mod mapper3;
mod mapper4;
mod mapper7;

pub use mapper1::Mmc1;
pub use mapper2::Uxrom;
pub use mapper3::Cnrom;
pub use mapper4::Mmc3;
pub use mapper7::Axrom;

use super::{Cartridge, Mirroring};
use crate::error::RomError;

/// Compute a byte offset into a bank array from a possibly-negative bank
/// index. Negative indices count from the end (-1 = last bank) and any index
/// is reduced modulo the bank count, which also forgives out-of-range bank
/// selects from buggy games.
pub(crate) fn bank_offset(len: usize, index: isize, bank_size: usize) -> usize {
    let banks = (len / bank_size) as isize;
    debug_assert!(banks > 0);
    let mut index = index % banks;
    if index < 0 {
        index += banks;
    }
    index as usize * bank_size
}

/// Tagged sum over the supported boards.
///
/// Mapper 0 (NROM) is the degenerate UxROM with no switchable bank, so both
/// ids construct the `Uxrom` variant.
pub enum Mapper {
    Uxrom(Uxrom),
    Mmc1(Mmc1),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
    Axrom(Axrom),
}

impl Mapper {
    /// Build the mapper variant named by the cartridge header.
    pub fn new(cartridge: Cartridge) -> Result<Self, RomError> {
        match cartridge.mapper_id {
            0 | 2 => Ok(Mapper::Uxrom(Uxrom::new(cartridge))),
            1 => Ok(Mapper::Mmc1(Mmc1::new(cartridge))),
            3 => Ok(Mapper::Cnrom(Cnrom::new(cartridge))),
            4 => Ok(Mapper::Mmc3(Mmc3::new(cartridge))),
            7 => Ok(Mapper::Axrom(Axrom::new(cartridge))),
            id => Err(RomError::UnsupportedMapper(id)),
        }
    }

    /// CPU-side read, $6000-$FFFF
    #[inline]
    pub fn cpu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Uxrom(m) => m.cpu_read(addr),
            Mapper::Mmc1(m) => m.cpu_read(addr),
            Mapper::Cnrom(m) => m.cpu_read(addr),
            Mapper::Mmc3(m) => m.cpu_read(addr),
            Mapper::Axrom(m) => m.cpu_read(addr),
        }
    }

    /// CPU-side write, $6000-$FFFF
    #[inline]
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Uxrom(m) => m.cpu_write(addr, value),
            Mapper::Mmc1(m) => m.cpu_write(addr, value),
            Mapper::Cnrom(m) => m.cpu_write(addr, value),
            Mapper::Mmc3(m) => m.cpu_write(addr, value),
            Mapper::Axrom(m) => m.cpu_write(addr, value),
        }
    }

    /// PPU-side read, pattern tables $0000-$1FFF
    #[inline]
    pub fn ppu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Uxrom(m) => m.ppu_read(addr),
            Mapper::Mmc1(m) => m.ppu_read(addr),
            Mapper::Cnrom(m) => m.ppu_read(addr),
            Mapper::Mmc3(m) => m.ppu_read(addr),
            Mapper::Axrom(m) => m.ppu_read(addr),
        }
    }

    /// PPU-side write, honored only for CHR-RAM boards
    #[inline]
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Uxrom(m) => m.ppu_write(addr, value),
            Mapper::Mmc1(m) => m.ppu_write(addr, value),
            Mapper::Cnrom(m) => m.ppu_write(addr, value),
            Mapper::Mmc3(m) => m.ppu_write(addr, value),
            Mapper::Axrom(m) => m.ppu_write(addr, value),
        }
    }

    /// Current nametable mirroring (boards rewrite it at runtime)
    #[inline]
    pub fn mirroring(&self) -> Mirroring {
        self.cartridge().mirroring
    }

    /// Scanline clock for the MMC3 IRQ counter. No-op on other boards.
    pub fn tick_scanline(&mut self) {
        if let Mapper::Mmc3(m) = self {
            m.tick_scanline();
        }
    }

    /// Drain the board IRQ line. Returns true at most once per assertion.
    pub fn take_irq(&mut self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.take_irq(),
            _ => false,
        }
    }

    /// The owned cartridge (for SRAM persistence and inspection)
    pub fn cartridge(&self) -> &Cartridge {
        match self {
            Mapper::Uxrom(m) => &m.cart,
            Mapper::Mmc1(m) => &m.cart,
            Mapper::Cnrom(m) => &m.cart,
            Mapper::Mmc3(m) => &m.cart,
            Mapper::Axrom(m) => &m.cart,
        }
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        match self {
            Mapper::Uxrom(m) => &mut m.cart,
            Mapper::Mmc1(m) => &mut m.cart,
            Mapper::Cnrom(m) => &mut m.cart,
            Mapper::Mmc3(m) => &mut m.cart,
            Mapper::Axrom(m) => &mut m.cart,
        }
    }
}
