// APU - Ricoh 2A03 audio unit
//
// Stepped once per CPU cycle. The triangle timer runs at the full CPU rate;
// pulse, noise, and DMC timers at half rate. Two derived clocks are divided
// out of the cycle counter by watching integer-quotient crossings:
//
// - the 240 Hz frame sequencer that clocks envelopes, length counters,
//   sweeps, and the triangle's linear counter
// - the 44.1 kHz sample clock that mixes the five channel outputs through
//   the non-linear mixer tables and pushes one f32 into the ring buffer
//
// Register map ($4000-$4017):
//
// | Range       | Channel            |
// |-------------|--------------------|
// | $4000-$4003 | Pulse 1            |
// | $4004-$4007 | Pulse 2            |
// | $4008-$400B | Triangle           |
// | $400C-$400F | Noise              |
// | $4010-$4013 | DMC                |
// | $4015       | Enable / status    |
// | $4017       | Frame counter mode |
//
// $4009 and $400D exist in the decode but have no hardware behind them;
// writes are accepted and discarded.

pub mod channels;
pub mod components;

pub use channels::{Dmc, Noise, Pulse, Triangle};

use crate::audio::Producer;
use crate::cartridge::Mapper;
use crate::{CPU_FREQUENCY, SAMPLE_RATE};

/// Frame sequencer rate in Hz
const FRAME_COUNTER_RATE: f64 = 240.0;

/// 2A03 APU
pub struct Apu {
    pub pulse1: Pulse,
    pub pulse2: Pulse,
    pub triangle: Triangle,
    pub noise: Noise,
    pub dmc: Dmc,

    /// CPU cycles elapsed
    cycle: u64,
    /// Sequencer mode: 4-step or 5-step
    frame_period: u8,
    /// Position within the sequence
    frame_value: u8,
    /// Frame IRQ enabled ($4017 bit 6 clear)
    frame_irq_enabled: bool,
    /// Frame IRQ latched toward the CPU
    frame_irq_pending: bool,

    /// Non-linear mixer lookup: pulse1 + pulse2 levels (0..=30)
    pulse_table: [f32; 31],
    /// Non-linear mixer lookup: 3*triangle + 2*noise + dmc (0..=202)
    tnd_table: [f32; 203],

    /// Sample sink; None runs the APU silently (tests, headless)
    sink: Option<Producer>,
}

impl Apu {
    pub fn new() -> Self {
        let mut pulse_table = [0.0f32; 31];
        for (n, entry) in pulse_table.iter_mut().enumerate().skip(1) {
            *entry = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd_table = [0.0f32; 203];
        for (n, entry) in tnd_table.iter_mut().enumerate().skip(1) {
            *entry = 163.67 / (24329.0 / n as f32 + 100.0);
        }

        Apu {
            pulse1: Pulse::new(1),
            pulse2: Pulse::new(2),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(),
            cycle: 0,
            frame_period: 4,
            frame_value: 0,
            frame_irq_enabled: false,
            frame_irq_pending: false,
            pulse_table,
            tnd_table,
            sink: None,
        }
    }

    /// Attach the sample sink.
    pub fn set_output(&mut self, producer: Producer) {
        self.sink = Some(producer);
    }

    /// Silence everything, as on console reset.
    pub fn reset(&mut self) {
        self.write_control(0);
        self.cycle = 0;
        self.frame_value = 0;
        self.frame_irq_pending = false;
    }

    /// One CPU cycle of APU time. Returns CPU stall cycles incurred by DMC
    /// sample fetches this tick.
    pub fn step(&mut self, mapper: &Mapper) -> u32 {
        let cycle1 = self.cycle;
        self.cycle += 1;
        let cycle2 = self.cycle;

        let stall = self.step_timers(mapper);

        let frame_divider = CPU_FREQUENCY / FRAME_COUNTER_RATE;
        if (cycle1 as f64 / frame_divider) as u64 != (cycle2 as f64 / frame_divider) as u64 {
            self.step_frame_counter();
        }

        let sample_divider = CPU_FREQUENCY / SAMPLE_RATE;
        if (cycle1 as f64 / sample_divider) as u64 != (cycle2 as f64 / sample_divider) as u64 {
            self.send_sample();
        }

        stall
    }

    /// Drain the APU IRQ line (frame counter or DMC).
    pub fn take_irq(&mut self) -> bool {
        let pending = self.frame_irq_pending || self.dmc.irq_pending;
        self.frame_irq_pending = false;
        self.dmc.irq_pending = false;
        pending
    }

    fn step_timers(&mut self, mapper: &Mapper) -> u32 {
        self.triangle.step_timer();
        if self.cycle % 2 == 0 {
            self.pulse1.step_timer();
            self.pulse2.step_timer();
            self.noise.step_timer();
            return self.dmc.step_timer(mapper);
        }
        0
    }

    /// Advance the 240 Hz sequencer one step and fire its events.
    fn step_frame_counter(&mut self) {
        if self.frame_period == 4 {
            self.frame_value = (self.frame_value + 1) % 4;
            match self.frame_value {
                0 | 2 => self.step_envelopes(),
                1 => {
                    self.step_envelopes();
                    self.step_sweeps();
                    self.step_lengths();
                }
                _ => {
                    self.step_envelopes();
                    self.step_sweeps();
                    self.step_lengths();
                    if self.frame_irq_enabled {
                        self.frame_irq_pending = true;
                    }
                }
            }
        } else {
            self.frame_value = (self.frame_value + 1) % 5;
            match self.frame_value {
                0 | 2 => {
                    self.step_envelopes();
                    self.step_sweeps();
                    self.step_lengths();
                }
                1 | 3 => self.step_envelopes(),
                _ => {}
            }
        }
    }

    fn step_envelopes(&mut self) {
        self.pulse1.step_envelope();
        self.pulse2.step_envelope();
        self.triangle.step_linear();
        self.noise.step_envelope();
    }

    fn step_sweeps(&mut self) {
        self.pulse1.step_sweep();
        self.pulse2.step_sweep();
    }

    fn step_lengths(&mut self) {
        self.pulse1.step_length();
        self.pulse2.step_length();
        self.triangle.step_length();
        self.noise.step_length();
    }

    /// Mix the five channels into one f32 via the lookup tables.
    pub fn output(&self) -> f32 {
        let p1 = self.pulse1.output();
        let p2 = self.pulse2.output();
        let t = self.triangle.output();
        let n = self.noise.output();
        let d = self.dmc.output();
        self.pulse_table[(p1 + p2) as usize]
            + self.tnd_table[(3 * t as usize) + (2 * n as usize) + d as usize]
    }

    fn send_sample(&mut self) {
        let sample = self.output();
        if let Some(producer) = self.sink.as_mut() {
            // A full ring drops the sample; the consumer handles underrun
            // with silence
            producer.push(sample);
        }
    }

    // ========================================
    // Register interface
    // ========================================

    /// Write an APU register ($4000-$4013, $4015, $4017).
    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_low(value),
            0x4003 => self.pulse1.write_timer_high(value),
            0x4004 => self.pulse2.write_control(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_low(value),
            0x4007 => self.pulse2.write_timer_high(value),
            0x4008 => self.triangle.write_control(value),
            0x4009 => {} // unused on hardware
            0x400A => self.triangle.write_timer_low(value),
            0x400B => self.triangle.write_timer_high(value),
            0x400C => self.noise.write_control(value),
            0x400D => {} // unused on hardware
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),
            0x4010 => self.dmc.write_control(value),
            0x4011 => self.dmc.write_value(value),
            0x4012 => self.dmc.write_address(value),
            0x4013 => self.dmc.write_length(value),
            0x4015 => self.write_control(value),
            0x4017 => self.write_frame_counter(value),
            _ => {}
        }
    }

    /// $4015 read: bit per channel with a live length counter.
    pub fn read_status(&self) -> u8 {
        let mut result = 0;
        if self.pulse1.length.active() {
            result |= 0x01;
        }
        if self.pulse2.length.active() {
            result |= 0x02;
        }
        if self.triangle.length.active() {
            result |= 0x04;
        }
        if self.noise.length.active() {
            result |= 0x08;
        }
        if self.dmc.current_length > 0 {
            result |= 0x10;
        }
        result
    }

    /// $4015 write: channel enables. Disabling zeroes the length counter;
    /// enabling the DMC restarts its sample if none is in flight.
    fn write_control(&mut self, value: u8) {
        self.pulse1.set_enabled(value & 0x01 != 0);
        self.pulse2.set_enabled(value & 0x02 != 0);
        self.triangle.set_enabled(value & 0x04 != 0);
        self.noise.set_enabled(value & 0x08 != 0);
        self.dmc.set_enabled(value & 0x10 != 0);
    }

    /// $4017 write: sequencer mode. Entering 5-step mode clocks the
    /// half-frame units immediately.
    fn write_frame_counter(&mut self, value: u8) {
        self.frame_period = 4 + ((value >> 7) & 1);
        self.frame_irq_enabled = value & 0x40 == 0;
        if self.frame_period == 5 {
            self.step_envelopes();
            self.step_sweeps();
            self.step_lengths();
        }
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RingBuffer;
    use crate::cartridge::mappers::tests::test_cartridge;

    fn test_mapper() -> Mapper {
        Mapper::new(test_cartridge(0, 2, 0)).unwrap()
    }

    /// Run the APU for one emulated second of CPU time
    fn run_one_second(apu: &mut Apu, mapper: &Mapper) {
        for _ in 0..CPU_FREQUENCY as u64 {
            apu.step(mapper);
        }
    }

    #[test]
    fn test_mixer_tables() {
        let apu = Apu::new();
        assert_eq!(apu.pulse_table[0], 0.0);
        // Known mixer values from the non-linear formula
        assert!((apu.pulse_table[30] - 95.52 / (8128.0 / 30.0 + 100.0)).abs() < 1e-6);
        assert!((apu.tnd_table[202] - 163.67 / (24329.0 / 202.0 + 100.0)).abs() < 1e-6);
        // Silence mixes to zero
        assert_eq!(apu.output(), 0.0);
    }

    #[test]
    fn test_sample_rate_within_one_percent() {
        let mut apu = Apu::new();
        let mapper = test_mapper();
        let (producer, mut consumer) = RingBuffer::with_capacity(65536);
        apu.set_output(producer);

        run_one_second(&mut apu, &mapper);

        let mut count = 0usize;
        while consumer.pop().is_some() {
            count += 1;
        }
        let low = (SAMPLE_RATE * 0.99) as usize;
        let high = (SAMPLE_RATE * 1.01) as usize;
        assert!(
            (low..=high).contains(&count),
            "{} samples in one second, expected ~{}",
            count,
            SAMPLE_RATE
        );
    }

    #[test]
    fn test_frame_sequencer_240hz() {
        let mut apu = Apu::new();
        let mapper = test_mapper();
        // Length counter clocks happen at 120 Hz in 4-step mode: enable the
        // pulse, load a length, and count the decrements over a second
        apu.write_register(0x4015, 0x01);
        apu.write_register(0x4000, 0x00); // halt clear
        apu.write_register(0x4003, 0x08); // length index 1 -> 254

        run_one_second(&mut apu, &mapper);

        let consumed = 254 - apu.pulse1.length.value as i32;
        assert!(
            (118..=122).contains(&consumed),
            "length clocked {} times, expected ~120",
            consumed
        );
    }

    #[test]
    fn test_frame_irq_in_four_step_mode() {
        let mut apu = Apu::new();
        let mapper = test_mapper();
        apu.write_register(0x4017, 0x00); // 4-step, IRQ enabled

        // One full sequence takes 4 steps at 240 Hz
        for _ in 0..(CPU_FREQUENCY / 60.0) as u64 + 100 {
            apu.step(&mapper);
        }
        assert!(apu.take_irq(), "frame IRQ fires each 4-step pass");
        assert!(!apu.take_irq(), "line drained");
    }

    #[test]
    fn test_no_frame_irq_in_five_step_mode() {
        let mut apu = Apu::new();
        let mapper = test_mapper();
        apu.write_register(0x4017, 0x80); // 5-step

        run_one_second(&mut apu, &mapper);
        assert!(!apu.take_irq());
    }

    #[test]
    fn test_status_reflects_lengths() {
        let mut apu = Apu::new();
        assert_eq!(apu.read_status(), 0);

        apu.write_register(0x4015, 0x0F);
        apu.write_register(0x4003, 0x08);
        apu.write_register(0x400B, 0x08);
        assert_eq!(apu.read_status() & 0x05, 0x05, "pulse1 and triangle live");

        apu.write_register(0x4015, 0x00);
        assert_eq!(apu.read_status(), 0, "disable clears the lengths");
    }

    #[test]
    fn test_unused_registers_are_noops() {
        let mut apu = Apu::new();
        apu.write_register(0x4009, 0xFF);
        apu.write_register(0x400D, 0xFF);
        assert_eq!(apu.read_status(), 0);
    }

    #[test]
    fn test_five_step_write_clocks_immediately() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x01);
        apu.write_register(0x4000, 0x00);
        apu.write_register(0x4003, 0x08); // length 254

        apu.write_register(0x4017, 0x80);
        assert_eq!(apu.pulse1.length.value, 253, "5-step entry clocks lengths");
    }
}
