// PPU - Ricoh 2C02 picture processor
//
// Dot-stepped emulation: one `step` advances the PPU by a single dot and the
// driver calls it three times per CPU cycle. A frame is 262 scanlines of 341
// dots, except that odd frames skip the last dot of the pre-render line when
// rendering is enabled.
//
// Scanline map:
// - 0-239: visible, pixels are produced
// - 240:   post-render, idle
// - 241-260: vertical blank ($2002 bit 7 is visible to games)
// - 261:   pre-render, pipeline warm-up and flag clears
//
// Scroll state follows the Loopy model the hardware implements: a 15-bit
// current VRAM address `v`, a 15-bit temporary `t` written by $2005/$2006, a
// 3-bit fine X `x`, and the write toggle `w` shared by the two double-write
// registers.

mod palette;
mod registers;
mod rendering;

pub use palette::NTSC_PALETTE;

use crate::cartridge::{Mapper, Mirroring};

/// Screen dimensions in pixels
pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

/// Dots the NMI line is delayed after the enable-and-occurred edge. The
/// hardware figure may be closer to 8; this value is the one the timing in
/// the rest of the pipeline was tuned against, so change it deliberately.
pub const NMI_DELAY_DOTS: u8 = 15;

/// Nametable quadrant -> physical table for each mirroring mode
const MIRROR_LOOKUP: [[u16; 4]; 5] = [
    [0, 0, 1, 1], // horizontal
    [0, 1, 0, 1], // vertical
    [0, 0, 0, 0], // single-screen 0
    [1, 1, 1, 1], // single-screen 1
    [0, 1, 2, 3], // four-screen
];

/// Fold a $2000-$3EFF nametable address down to the mirrored 2KB array.
pub fn mirror_address(mode: Mirroring, addr: u16) -> u16 {
    let addr = (addr - 0x2000) % 0x1000;
    let table = addr / 0x0400;
    let offset = addr % 0x0400;
    0x2000 + MIRROR_LOOKUP[mode as usize][table as usize] * 0x0400 + offset
}

/// 2C02 state
pub struct Ppu {
    // Frame/dot counters
    /// Dot within the scanline, 0-340
    pub cycle: u16,
    /// Scanline, 0-261
    pub scanline: u16,
    /// Completed frame count
    pub frame: u64,
    /// Odd-frame flag; odd frames skip the pre-render line's last dot
    f: u8,

    // Loopy scroll registers
    /// Current VRAM address (15 bits)
    pub v: u16,
    /// Temporary VRAM address (15 bits)
    pub t: u16,
    /// Fine X scroll (3 bits)
    pub x: u8,
    /// Write toggle for $2005/$2006
    pub w: bool,

    /// $2007 read buffer (non-palette reads are delayed one access)
    read_buffer: u8,
    /// Last value written to any PPU register, for the $2002 low bits
    register: u8,

    // PPUCTRL ($2000) decomposed
    pub flag_nametable: u8,
    pub flag_increment: u8,
    pub flag_sprite_table: u8,
    pub flag_background_table: u8,
    pub flag_sprite_size: u8,
    pub flag_master_slave: u8,
    nmi_output: bool,

    // PPUMASK ($2001) decomposed
    pub flag_grayscale: u8,
    pub flag_show_left_background: u8,
    pub flag_show_left_sprites: u8,
    pub flag_show_background: u8,
    pub flag_show_sprites: u8,
    pub flag_red_tint: u8,
    pub flag_green_tint: u8,
    pub flag_blue_tint: u8,

    // PPUSTATUS ($2002) decomposed
    pub flag_sprite_zero_hit: u8,
    pub flag_sprite_overflow: u8,

    // NMI edge detection
    nmi_occurred: bool,
    nmi_previous: bool,
    nmi_delay: u8,
    /// Latched NMI toward the CPU, drained by the driver
    nmi_signal: bool,

    // OAM
    pub oam_addr: u8,
    pub oam: [u8; 256],

    // Internal memories
    nametable_ram: [u8; 2048],
    palette_ram: [u8; 32],

    // Background fetch pipeline
    nametable_byte: u8,
    attribute_table_byte: u8,
    low_tile_byte: u8,
    high_tile_byte: u8,
    /// Two tiles of 4-bit pixels; the high 32 bits are the tile being drawn
    tile_data: u64,

    // Per-scanline sprite evaluation output
    sprite_count: usize,
    sprite_patterns: [u32; 8],
    sprite_positions: [u8; 8],
    sprite_priorities: [u8; 8],
    sprite_indexes: [u8; 8],

    // Double-buffered output, swapped at vblank start
    front: Vec<u32>,
    back: Vec<u32>,
}

impl Ppu {
    pub fn new() -> Self {
        Ppu {
            cycle: 0,
            scanline: 0,
            frame: 0,
            f: 0,
            v: 0,
            t: 0,
            x: 0,
            w: false,
            read_buffer: 0,
            register: 0,
            flag_nametable: 0,
            flag_increment: 0,
            flag_sprite_table: 0,
            flag_background_table: 0,
            flag_sprite_size: 0,
            flag_master_slave: 0,
            nmi_output: false,
            flag_grayscale: 0,
            flag_show_left_background: 0,
            flag_show_left_sprites: 0,
            flag_show_background: 0,
            flag_show_sprites: 0,
            flag_red_tint: 0,
            flag_green_tint: 0,
            flag_blue_tint: 0,
            flag_sprite_zero_hit: 0,
            flag_sprite_overflow: 0,
            nmi_occurred: false,
            nmi_previous: false,
            nmi_delay: 0,
            nmi_signal: false,
            oam_addr: 0,
            oam: [0; 256],
            nametable_ram: [0; 2048],
            palette_ram: [0; 32],
            nametable_byte: 0,
            attribute_table_byte: 0,
            low_tile_byte: 0,
            high_tile_byte: 0,
            tile_data: 0,
            sprite_count: 0,
            sprite_patterns: [0; 8],
            sprite_positions: [0; 8],
            sprite_priorities: [0; 8],
            sprite_indexes: [0; 8],
            front: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            back: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Reset to the state after power-on: counters rewound, control and mask
    /// cleared. Memories are left alone, like the hardware.
    pub fn reset(&mut self) {
        self.cycle = 340;
        self.scanline = 240;
        self.frame = 0;
        self.write_control(0);
        self.write_mask(0);
        self.oam_addr = 0;
    }

    /// The completed frame for the host to display.
    pub fn front(&self) -> &[u32] {
        &self.front
    }

    /// Drain the NMI line toward the CPU.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_signal)
    }

    /// True when background or sprite rendering is switched on.
    #[inline]
    pub(crate) fn rendering_enabled(&self) -> bool {
        self.flag_show_background != 0 || self.flag_show_sprites != 0
    }

    // ========================================
    // PPU bus ($0000-$3FFF, mirrored above)
    // ========================================

    /// Read through the PPU address space.
    pub fn mem_read(&self, mapper: &Mapper, addr: u16) -> u8 {
        let addr = addr % 0x4000;
        match addr {
            0x0000..=0x1FFF => mapper.ppu_read(addr),
            0x2000..=0x3EFF => {
                let folded = mirror_address(mapper.mirroring(), addr) % 2048;
                self.nametable_ram[folded as usize]
            }
            _ => self.read_palette(addr % 32),
        }
    }

    /// Write through the PPU address space.
    pub fn mem_write(&mut self, mapper: &mut Mapper, addr: u16, value: u8) {
        let addr = addr % 0x4000;
        match addr {
            0x0000..=0x1FFF => mapper.ppu_write(addr, value),
            0x2000..=0x3EFF => {
                let folded = mirror_address(mapper.mirroring(), addr) % 2048;
                self.nametable_ram[folded as usize] = value;
            }
            _ => self.write_palette(addr % 32, value),
        }
    }

    /// Palette RAM read with the $3F10/$3F14/$3F18/$3F1C aliasing quirk: the
    /// sprite palettes' transparent entries mirror the background ones.
    pub fn read_palette(&self, mut addr: u16) -> u8 {
        if addr >= 16 && addr % 4 == 0 {
            addr -= 16;
        }
        self.palette_ram[addr as usize]
    }

    pub fn write_palette(&mut self, mut addr: u16, value: u8) {
        if addr >= 16 && addr % 4 == 0 {
            addr -= 16;
        }
        self.palette_ram[addr as usize] = value;
    }

    // ========================================
    // NMI edge detection
    // ========================================

    /// Re-evaluate the NMI edge after any change to `nmi_output` or
    /// `nmi_occurred`. A rising edge arms the delay counter; the line is
    /// asserted when the counter expires with the condition still true.
    fn nmi_change(&mut self) {
        let nmi = self.nmi_output && self.nmi_occurred;
        if nmi && !self.nmi_previous {
            self.nmi_delay = NMI_DELAY_DOTS;
        }
        self.nmi_previous = nmi;
    }

    /// Vblank start (scanline 241, dot 1): publish the finished frame and
    /// raise the status bit.
    fn set_vertical_blank(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        self.nmi_occurred = true;
        self.nmi_change();
    }

    /// Pre-render dot 1: drop the status bit.
    fn clear_vertical_blank(&mut self) {
        self.nmi_occurred = false;
        self.nmi_change();
    }

    // ========================================
    // Dot stepping
    // ========================================

    /// Advance the dot/scanline/frame counters by one dot and run the NMI
    /// delay line.
    fn tick(&mut self) {
        if self.nmi_delay > 0 {
            self.nmi_delay -= 1;
            if self.nmi_delay == 0 && self.nmi_output && self.nmi_occurred {
                self.nmi_signal = true;
            }
        }

        // Odd frames skip (261,340): jump straight to (0,0)
        if self.rendering_enabled() && self.f == 1 && self.scanline == 261 && self.cycle == 339 {
            self.cycle = 0;
            self.scanline = 0;
            self.frame += 1;
            self.f ^= 1;
            return;
        }

        self.cycle += 1;
        if self.cycle > 340 {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > 261 {
                self.scanline = 0;
                self.frame += 1;
                self.f ^= 1;
            }
        }
    }

    /// One PPU dot: advance the counters, then run the rendering pipeline
    /// and the vblank transitions for the dot just entered.
    pub fn step(&mut self, mapper: &mut Mapper) {
        self.tick();

        let rendering = self.rendering_enabled();
        let pre_line = self.scanline == 261;
        let visible_line = self.scanline < 240;
        let render_line = pre_line || visible_line;
        let pre_fetch_cycle = (321..=336).contains(&self.cycle);
        let visible_cycle = (1..=256).contains(&self.cycle);
        let fetch_cycle = pre_fetch_cycle || visible_cycle;

        if rendering {
            if visible_line && visible_cycle {
                self.render_pixel();
            }

            if render_line && fetch_cycle {
                self.tile_data <<= 4;
                match self.cycle % 8 {
                    1 => self.fetch_nametable_byte(mapper),
                    3 => self.fetch_attribute_table_byte(mapper),
                    5 => self.fetch_low_tile_byte(mapper),
                    7 => self.fetch_high_tile_byte(mapper),
                    0 => self.store_tile_data(),
                    _ => {}
                }
            }

            if pre_line && (280..=304).contains(&self.cycle) {
                self.copy_y();
            }

            if render_line {
                if fetch_cycle && self.cycle % 8 == 0 {
                    self.increment_x();
                }
                if self.cycle == 256 {
                    self.increment_y();
                }
                if self.cycle == 257 {
                    self.copy_x();
                }
            }

            if self.cycle == 257 {
                if visible_line {
                    self.evaluate_sprites(mapper);
                } else {
                    self.sprite_count = 0;
                }
            }

            // A12 proxy for the MMC3 scanline counter
            if self.cycle == 280 && (visible_line || pre_line) {
                mapper.tick_scanline();
            }
        }

        if self.scanline == 241 && self.cycle == 1 {
            self.set_vertical_blank();
        }
        if pre_line && self.cycle == 1 {
            self.clear_vertical_blank();
            self.flag_sprite_zero_hit = 0;
            self.flag_sprite_overflow = 0;
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mappers::tests::test_cartridge;

    pub(crate) fn test_mapper() -> Mapper {
        Mapper::new(test_cartridge(0, 2, 0)).unwrap()
    }

    #[test]
    fn test_mirror_address_horizontal() {
        // Horizontal: $2000/$2400 share table 0, $2800/$2C00 share table 1
        assert_eq!(
            mirror_address(Mirroring::Horizontal, 0x2000),
            mirror_address(Mirroring::Horizontal, 0x2400)
        );
        assert_eq!(
            mirror_address(Mirroring::Horizontal, 0x2800),
            mirror_address(Mirroring::Horizontal, 0x2C00)
        );
        assert_ne!(
            mirror_address(Mirroring::Horizontal, 0x2000),
            mirror_address(Mirroring::Horizontal, 0x2800)
        );
    }

    #[test]
    fn test_mirror_address_vertical() {
        assert_eq!(
            mirror_address(Mirroring::Vertical, 0x2000),
            mirror_address(Mirroring::Vertical, 0x2800)
        );
        assert_eq!(
            mirror_address(Mirroring::Vertical, 0x2400),
            mirror_address(Mirroring::Vertical, 0x2C00)
        );
    }

    #[test]
    fn test_mirror_address_region_above_3000() {
        // $3000-$3EFF mirrors $2000-$2EFF
        assert_eq!(
            mirror_address(Mirroring::Vertical, 0x3000),
            mirror_address(Mirroring::Vertical, 0x2000)
        );
    }

    #[test]
    fn test_palette_mirroring_quirk() {
        let mut ppu = Ppu::new();
        ppu.write_palette(0x00, 0x21);
        assert_eq!(ppu.read_palette(0x10), 0x21, "$3F10 aliases $3F00");

        ppu.write_palette(0x14, 0x13);
        assert_eq!(ppu.read_palette(0x04), 0x13, "$3F14 aliases $3F04");

        ppu.write_palette(0x11, 0x05);
        assert_eq!(ppu.read_palette(0x11), 0x05, "non-multiple-of-4 entries are distinct");
        assert_eq!(ppu.read_palette(0x01), 0x00);
    }

    #[test]
    fn test_frame_counter_wraps() {
        let mut ppu = Ppu::new();
        let mut mapper = test_mapper();
        // Rendering disabled: a frame is exactly 341 * 262 dots
        for _ in 0..341 * 262 {
            ppu.step(&mut mapper);
        }
        assert_eq!(ppu.frame, 1);
        assert_eq!(ppu.scanline, 0);
        assert_eq!(ppu.cycle, 0);
    }

    #[test]
    fn test_odd_frame_skips_a_dot() {
        let mut ppu = Ppu::new();
        let mut mapper = test_mapper();
        ppu.write_mask(0x08); // show background

        // Frame 0 (even): full 341*262 dots
        for _ in 0..341 * 262 {
            ppu.step(&mut mapper);
        }
        assert_eq!(ppu.frame, 1);
        assert_eq!((ppu.scanline, ppu.cycle), (0, 0));

        // Frame 1 (odd): one dot shorter
        for _ in 0..341 * 262 - 1 {
            ppu.step(&mut mapper);
        }
        assert_eq!(ppu.frame, 2);
        assert_eq!((ppu.scanline, ppu.cycle), (0, 0));
    }

    #[test]
    fn test_vblank_flag_set_and_cleared() {
        let mut ppu = Ppu::new();
        let mut mapper = test_mapper();

        // Run to scanline 241, dot 1
        while !(ppu.scanline == 241 && ppu.cycle == 1) {
            ppu.step(&mut mapper);
        }
        assert!(ppu.nmi_occurred, "vblank raised at (241,1)");

        while !(ppu.scanline == 261 && ppu.cycle == 1) {
            ppu.step(&mut mapper);
        }
        assert!(!ppu.nmi_occurred, "vblank dropped at pre-render dot 1");
    }

    #[test]
    fn test_nmi_delay_line() {
        let mut ppu = Ppu::new();
        let mut mapper = test_mapper();
        ppu.write_control(0x80); // NMI enable

        while !(ppu.scanline == 241 && ppu.cycle == 1) {
            ppu.step(&mut mapper);
        }
        assert!(!ppu.take_nmi(), "edge armed but delay not elapsed");

        for _ in 0..NMI_DELAY_DOTS {
            ppu.step(&mut mapper);
        }
        assert!(ppu.take_nmi(), "NMI asserted after the delay");
        assert!(!ppu.take_nmi(), "signal drains");
    }

    #[test]
    fn test_nmi_edge_on_late_enable() {
        // Enabling NMI while nmi_occurred is already true re-arms the edge
        let mut ppu = Ppu::new();
        let mut mapper = test_mapper();

        while !(ppu.scanline == 245 && ppu.cycle == 0) {
            ppu.step(&mut mapper);
        }
        assert!(ppu.nmi_occurred);

        ppu.write_control(0x80);
        for _ in 0..NMI_DELAY_DOTS {
            ppu.step(&mut mapper);
        }
        assert!(ppu.take_nmi(), "write to $2000 mid-vblank raises NMI");
    }
}
