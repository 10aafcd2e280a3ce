// Emulator - the owning aggregate
//
// `Nes` owns the CPU and the bus (which owns everything else) and drives the
// fixed step ordering the timing model requires: one CPU step of N cycles,
// then 3N PPU dots, then N APU ticks. Interrupt lines raised by the PPU,
// mapper, and APU during the previous step are polled and latched into the
// CPU right before the next instruction boundary.

mod config;
mod screenshot;

pub use config::{AudioConfig, EmulatorConfig, InputConfig, VideoConfig, CONFIG_FILE};
pub use screenshot::save_screenshot;

use crate::audio::{Consumer, RingBuffer, RING_CAPACITY};
use crate::bus::Bus;
use crate::cartridge::{Cartridge, Mapper};
use crate::cpu::Cpu;
use crate::error::RomError;
use crate::CPU_FREQUENCY;
use std::path::{Path, PathBuf};

/// One NES console
pub struct Nes {
    pub cpu: Cpu,
    pub bus: Bus,
    /// ROM location, used to derive the .srm path
    rom_path: Option<PathBuf>,
    /// Audio read end, handed to the host once
    audio: Option<Consumer>,
}

impl Nes {
    /// Build a console around an iNES image already in memory.
    pub fn from_ines(data: &[u8]) -> Result<Self, RomError> {
        let cartridge = Cartridge::from_ines(data)?;
        let mapper = Mapper::new(cartridge)?;
        let mut bus = Bus::new(mapper);

        let (producer, consumer) = RingBuffer::with_capacity(RING_CAPACITY);
        bus.apu.set_output(producer);

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        Ok(Nes {
            cpu,
            bus,
            rom_path: None,
            audio: Some(consumer),
        })
    }

    /// Load a ROM file and, for battery boards, its .srm sidecar.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut nes = Self::from_ines(&data)?;
        nes.bus.mapper.cartridge_mut().load_sram(path);
        nes.rom_path = Some(path.to_path_buf());
        Ok(nes)
    }

    /// Take the audio consumer for the output device. Yields once.
    pub fn take_audio(&mut self) -> Option<Consumer> {
        self.audio.take()
    }

    /// One CPU instruction plus the PPU/APU time it covers. Returns CPU
    /// cycles consumed.
    pub fn step(&mut self) -> u32 {
        // Interrupts raised during the previous step are visible at this
        // instruction boundary
        if self.bus.ppu.take_nmi() {
            self.cpu.trigger_nmi();
        }
        if self.bus.mapper.take_irq() {
            self.cpu.trigger_irq();
        }
        if self.bus.apu.take_irq() {
            self.cpu.trigger_irq();
        }

        let cycles = self.cpu.step(&mut self.bus);
        for _ in 0..cycles * 3 {
            self.bus.step_ppu();
        }
        for _ in 0..cycles {
            self.bus.step_apu();
        }
        cycles
    }

    /// Run until the PPU finishes the current frame.
    pub fn step_frame(&mut self) -> u32 {
        let frame = self.bus.ppu.frame;
        let mut cycles = 0;
        while frame == self.bus.ppu.frame {
            cycles += self.step();
        }
        cycles
    }

    /// Run for `seconds` of emulated time, stopping at the first
    /// instruction boundary past the budget.
    pub fn emulate(&mut self, seconds: f64) {
        let mut budget = (CPU_FREQUENCY * seconds) as i64;
        while budget > 0 {
            budget -= self.step() as i64;
        }
    }

    /// Console reset button.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.bus.apu.reset();
    }

    /// Latch this frame's controller states.
    pub fn set_buttons(&mut self, pad1: u8, pad2: u8) {
        self.bus.controller1.set_buttons(pad1);
        self.bus.controller2.set_buttons(pad2);
    }

    /// The completed front framebuffer (256*240 RGBA words).
    pub fn frame(&self) -> &[u32] {
        self.bus.ppu.front()
    }

    /// Frames completed since power-on.
    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frame
    }

    /// Persist battery SRAM next to the ROM. Call on clean shutdown;
    /// failures are logged, not fatal.
    pub fn save_sram(&self) {
        if let Some(path) = &self.rom_path {
            self.bus.mapper.cartridge().save_sram(path);
        }
    }
}
