// Shared helpers for ROM-based integration tests
//
// Builds iNES images in memory so the suites can exercise the full stack
// (header parsing, mapper construction, CPU/PPU/APU co-stepping) without
// shipping ROM files.

#![allow(dead_code)]

use famicore::Nes;

/// PRG unit size (16KB)
pub const PRG_UNIT: usize = 16 * 1024;

/// CHR unit size (8KB)
pub const CHR_UNIT: usize = 8 * 1024;

/// Programmatic iNES v1 image builder
pub struct RomBuilder {
    prg_units: u8,
    chr_units: u8,
    mapper: u8,
    ctrl1_flags: u8,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl RomBuilder {
    /// An NROM image with the given PRG size, filled with NOPs, CHR-RAM,
    /// and the reset vector pointing at $8000.
    pub fn new() -> Self {
        RomBuilder::with_layout(0, 2, 0)
    }

    /// Choose mapper id and PRG/CHR unit counts (chr_units = 0 allocates
    /// CHR-RAM).
    pub fn with_layout(mapper: u8, prg_units: u8, chr_units: u8) -> Self {
        let mut builder = RomBuilder {
            prg_units,
            chr_units,
            mapper,
            ctrl1_flags: 0,
            prg: vec![0xEA; prg_units as usize * PRG_UNIT], // NOP sled
            chr: vec![0; chr_units as usize * CHR_UNIT],
        };
        builder.set_reset_vector(0x8000);
        builder
    }

    /// Set iNES ctrl1 flags (mirroring, battery)
    pub fn flags(mut self, ctrl1_flags: u8) -> Self {
        self.ctrl1_flags = ctrl1_flags;
        self
    }

    /// Place bytes at a CPU address in the fixed mapping ($8000 = start of
    /// PRG, last bank repeated at the top for small images).
    pub fn prg(mut self, addr: u16, bytes: &[u8]) -> Self {
        let offset = self.prg_offset(addr);
        self.prg[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Point the reset vector at `addr`.
    pub fn reset_vector(mut self, addr: u16) -> Self {
        self.set_reset_vector(addr);
        self
    }

    /// Point the NMI vector at `addr`.
    pub fn nmi_vector(mut self, addr: u16) -> Self {
        self.set_vector(0x3FFA, addr);
        self
    }

    /// Point the IRQ vector at `addr`.
    pub fn irq_vector(mut self, addr: u16) -> Self {
        self.set_vector(0x3FFE, addr);
        self
    }

    /// Fill CHR tile `index` (16 bytes) with the given planes.
    pub fn chr_tile(mut self, index: usize, low: [u8; 8], high: [u8; 8]) -> Self {
        self.chr[index * 16..index * 16 + 8].copy_from_slice(&low);
        self.chr[index * 16 + 8..index * 16 + 16].copy_from_slice(&high);
        self
    }

    /// Assemble the iNES byte stream.
    pub fn build(&self) -> Vec<u8> {
        let mut rom = vec![
            0x4E,
            0x45,
            0x53,
            0x1A,
            self.prg_units,
            self.chr_units,
            self.ctrl1_flags | (self.mapper << 4),
            self.mapper & 0xF0,
        ];
        rom.resize(16, 0);
        rom.extend(&self.prg);
        rom.extend(&self.chr);
        rom
    }

    /// Build and boot a console.
    pub fn into_nes(&self) -> Nes {
        Nes::from_ines(&self.build()).expect("test ROM is well-formed")
    }

    fn set_reset_vector(&mut self, addr: u16) {
        self.set_vector(0x3FFC, addr);
    }

    /// Stamp a vector into the tail of every 16KB unit so it is visible
    /// under any mapper's power-on banking (AxROM boots with bank 0 at the
    /// top, MMC1/MMC3/UxROM fix the last bank there).
    fn set_vector(&mut self, tail_offset: usize, addr: u16) {
        for unit in 0..self.prg_units as usize {
            let offset = unit * PRG_UNIT + tail_offset;
            self.prg[offset] = addr as u8;
            self.prg[offset + 1] = (addr >> 8) as u8;
        }
    }

    /// Map a CPU address to a PRG offset assuming the power-on banking of
    /// the supported mappers (last bank fixed at the top).
    fn prg_offset(&self, addr: u16) -> usize {
        let len = self.prg.len();
        if addr >= 0xC000 {
            len - PRG_UNIT + (addr as usize - 0xC000)
        } else {
            (addr as usize - 0x8000) % len
        }
    }
}

impl Default for RomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Step `nes` until the PPU reaches the given (scanline, dot), with a
/// one-frame safety valve.
pub fn run_to_dot(nes: &mut Nes, scanline: u16, cycle: u16) {
    for _ in 0..341 * 262 + 1 {
        if nes.bus.ppu.scanline == scanline && nes.bus.ppu.cycle == cycle {
            return;
        }
        nes.bus.step_ppu();
    }
    panic!("PPU never reached ({}, {})", scanline, cycle);
}
