// famicore - NES emulator library
// Cycle-stepped co-simulation of the 2A03 CPU/APU, 2C02 PPU, and cartridge mappers

pub mod apu;
pub mod audio;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod display;
pub mod emulator;
pub mod error;
pub mod ppu;
pub mod ram;

// Re-export main types for convenience
pub use apu::Apu;
pub use audio::RingBuffer;
pub use bus::Bus;
pub use cartridge::{Cartridge, Mapper, Mirroring};
pub use controller::Controller;
pub use cpu::Cpu;
pub use emulator::{EmulatorConfig, Nes};
pub use error::{FrontendError, RomError, SramError};
pub use ppu::Ppu;
pub use ram::Ram;

/// NTSC CPU clock rate in Hz
pub const CPU_FREQUENCY: f64 = 1_789_773.0;

/// Audio output rate the APU targets, in samples per second
pub const SAMPLE_RATE: f64 = 44_100.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_components() {
        // Every component can be instantiated in isolation
        let _cpu = Cpu::new();
        let _ppu = Ppu::new();
        let _ram = Ram::new();
        let _controller = Controller::new();
    }
}
