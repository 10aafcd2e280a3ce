// Mapper 4 (MMC3)
//
// Eight 1KB CHR windows, four 8KB PRG windows, and the scanline IRQ counter
// that raster-effect games rely on.
//
// Register pairs, selected by address range and address parity:
// - $8000-$9FFE even: bank select (bits 0-2 register index, bit 6 PRG mode,
//   bit 7 CHR mode); odd: bank data into the selected register
// - $A000-$BFFE even: mirroring (bit 0: 0 = vertical, 1 = horizontal)
// - $C000-$DFFE even: IRQ reload latch; odd: request counter reload
// - $E000-$FFFE even: IRQ disable (and acknowledge); odd: IRQ enable
//
// The IRQ counter is clocked once per rendered scanline by the PPU (dot 280
// proxy for the A12 rising edge): a zero counter reloads from the latch,
// otherwise it decrements, and a decrement that reaches zero while IRQs are
// enabled pulls the IRQ line.

use super::bank_offset;
use crate::cartridge::{Cartridge, Mirroring};
use log::trace;

/// PRG window granularity (8KB)
const PRG_BANK: usize = 8 * 1024;

/// CHR window granularity (1KB)
const CHR_BANK: usize = 1024;

/// MMC3 board (iNES mapper 4)
pub struct Mmc3 {
    pub(crate) cart: Cartridge,
    /// Selected bank register (0-7)
    register: u8,
    /// Bank registers: R0-R5 CHR, R6-R7 PRG
    registers: [u8; 8],
    prg_mode: u8,
    chr_mode: u8,
    /// Resolved byte offsets for the four 8KB PRG windows
    prg_offsets: [usize; 4],
    /// Resolved byte offsets for the eight 1KB CHR windows
    chr_offsets: [usize; 8],
    /// IRQ counter reload latch
    reload: u8,
    /// IRQ down-counter
    counter: u8,
    irq_enable: bool,
    irq_pending: bool,
}

impl Mmc3 {
    pub fn new(cart: Cartridge) -> Self {
        let mut m = Mmc3 {
            cart,
            register: 0,
            registers: [0; 8],
            prg_mode: 0,
            chr_mode: 0,
            prg_offsets: [0; 4],
            chr_offsets: [0; 8],
            reload: 0,
            counter: 0,
            irq_enable: false,
            irq_pending: false,
        };
        m.update_offsets();
        m
    }

    pub fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let addr = (addr - 0x8000) as usize;
                let window = addr / PRG_BANK;
                self.cart.prg[self.prg_offsets[window] + addr % PRG_BANK]
            }
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => self.write_register(addr, value),
            _ => {}
        }
    }

    pub fn ppu_read(&self, addr: u16) -> u8 {
        let addr = addr as usize;
        let window = addr / CHR_BANK;
        self.cart.chr[self.chr_offsets[window] + addr % CHR_BANK]
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.cart.chr_is_ram {
            let addr = addr as usize;
            let window = addr / CHR_BANK;
            self.cart.chr[self.chr_offsets[window] + addr % CHR_BANK] = value;
        }
    }

    /// Scanline clock from the PPU (A12 rising-edge proxy).
    pub fn tick_scanline(&mut self) {
        if self.counter == 0 {
            self.counter = self.reload;
        } else {
            self.counter -= 1;
            if self.counter == 0 && self.irq_enable {
                self.irq_pending = true;
            }
        }
    }

    /// Drain the IRQ line toward the CPU.
    pub fn take_irq(&mut self) -> bool {
        std::mem::take(&mut self.irq_pending)
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        let even = addr & 1 == 0;
        match (addr, even) {
            (0x8000..=0x9FFF, true) => {
                self.register = value & 7;
                self.prg_mode = (value >> 6) & 1;
                self.chr_mode = (value >> 7) & 1;
                self.update_offsets();
            }
            (0x8000..=0x9FFF, false) => {
                self.registers[self.register as usize] = value;
                trace!("MMC3 R{} -> {}", self.register, value);
                self.update_offsets();
            }
            (0xA000..=0xBFFF, true) => {
                self.cart.mirroring = if value & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            (0xA000..=0xBFFF, false) => {
                // PRG-RAM protect: not emulated, SRAM stays writable
            }
            (0xC000..=0xDFFF, true) => self.reload = value,
            (0xC000..=0xDFFF, false) => self.counter = 0,
            (_, true) => {
                self.irq_enable = false;
                self.irq_pending = false;
            }
            (_, false) => self.irq_enable = true,
        }
    }

    fn prg_offset(&self, index: isize) -> usize {
        // Bank numbers above 0x80 are sign-extended; games use -1/-2 encodings
        let index = if index >= 0x80 { index - 0x100 } else { index };
        bank_offset(self.cart.prg.len(), index, PRG_BANK)
    }

    fn chr_offset(&self, index: isize) -> usize {
        bank_offset(self.cart.chr.len(), index, CHR_BANK)
    }

    fn update_offsets(&mut self) {
        let r = &self.registers;
        self.prg_offsets = match self.prg_mode {
            0 => [
                self.prg_offset(r[6] as isize),
                self.prg_offset(r[7] as isize),
                self.prg_offset(-2),
                self.prg_offset(-1),
            ],
            _ => [
                self.prg_offset(-2),
                self.prg_offset(r[7] as isize),
                self.prg_offset(r[6] as isize),
                self.prg_offset(-1),
            ],
        };

        self.chr_offsets = match self.chr_mode {
            0 => [
                self.chr_offset((r[0] & 0xFE) as isize),
                self.chr_offset((r[0] | 1) as isize),
                self.chr_offset((r[1] & 0xFE) as isize),
                self.chr_offset((r[1] | 1) as isize),
                self.chr_offset(r[2] as isize),
                self.chr_offset(r[3] as isize),
                self.chr_offset(r[4] as isize),
                self.chr_offset(r[5] as isize),
            ],
            _ => [
                self.chr_offset(r[2] as isize),
                self.chr_offset(r[3] as isize),
                self.chr_offset(r[4] as isize),
                self.chr_offset(r[5] as isize),
                self.chr_offset((r[0] & 0xFE) as isize),
                self.chr_offset((r[0] | 1) as isize),
                self.chr_offset((r[1] & 0xFE) as isize),
                self.chr_offset((r[1] | 1) as isize),
            ],
        };
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_cartridge;
    use super::*;

    fn mmc3() -> Mmc3 {
        // 8x16KB PRG = 16 8KB banks, 2x8KB CHR = 16 1KB banks
        Mmc3::new(test_cartridge(4, 8, 2))
    }

    /// Select register `idx`, then write `value` into it
    fn set_bank(m: &mut Mmc3, idx: u8, value: u8) {
        m.cpu_write(0x8000, idx);
        m.cpu_write(0x8001, value);
    }

    #[test]
    fn test_power_on_maps_last_banks() {
        let m = mmc3();
        // Window 3 is always the last 8KB bank, window 2 second-to-last in mode 0
        let banks = m.cart.prg.len() / PRG_BANK;
        assert_eq!(m.prg_offsets[3], (banks - 1) * PRG_BANK);
        assert_eq!(m.prg_offsets[2], (banks - 2) * PRG_BANK);
    }

    #[test]
    fn test_prg_bank_select() {
        let mut m = mmc3();
        set_bank(&mut m, 6, 4);
        assert_eq!(m.prg_offsets[0], 4 * PRG_BANK);

        // PRG mode 1 swaps windows 0 and 2
        m.cpu_write(0x8000, 0x46);
        assert_eq!(m.prg_offsets[2], 4 * PRG_BANK);
        let banks = m.cart.prg.len() / PRG_BANK;
        assert_eq!(m.prg_offsets[0], (banks - 2) * PRG_BANK);
    }

    #[test]
    fn test_chr_pair_ignores_low_bit() {
        let mut m = mmc3();
        set_bank(&mut m, 0, 5);
        // R0 maps a 2KB pair at windows 0/1 with the low bit masked
        assert_eq!(m.chr_offsets[0], 4 * CHR_BANK);
        assert_eq!(m.chr_offsets[1], 5 * CHR_BANK);
    }

    #[test]
    fn test_mirroring_writes() {
        let mut m = mmc3();
        m.cpu_write(0xA000, 0);
        assert_eq!(m.cart.mirroring, Mirroring::Vertical);
        m.cpu_write(0xA000, 1);
        assert_eq!(m.cart.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn test_irq_fires_after_reload_scanlines() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 3); // reload latch
        m.cpu_write(0xC001, 0); // force reload on next clock
        m.cpu_write(0xE001, 0); // enable

        // First clock reloads to 3, then 3 decrements reach zero
        for _ in 0..3 {
            m.tick_scanline();
            assert!(!m.take_irq());
        }
        m.tick_scanline();
        assert!(m.take_irq(), "IRQ after counter hits zero");
        assert!(!m.take_irq(), "line drained");
    }

    #[test]
    fn test_irq_disable_acknowledges() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 0);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        m.tick_scanline(); // reload to 0
        m.tick_scanline(); // 0 -> reload again (stays 0), no decrement-to-zero path
        m.cpu_write(0xC000, 1);
        m.tick_scanline(); // counter = 1
        m.tick_scanline(); // 1 -> 0, IRQ
        m.cpu_write(0xE000, 0); // disable + ack before the CPU sees it
        assert!(!m.take_irq());
    }
}
