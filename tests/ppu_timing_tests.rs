// PPU timing and cross-component signalling
//
// Frame cadence, the NMI edge with its delay line, the OAM DMA stall, and a
// full sprite-zero-hit scenario over a rendered background.

mod common;

use common::{run_to_dot, RomBuilder};
use famicore::cpu::Interrupt;
use famicore::ppu::NMI_DELAY_DOTS;

#[test]
fn sixty_ish_frames_per_emulated_second() {
    // Rendering enabled so the odd-frame skip is live: 60 or 61 frames
    let mut nes = RomBuilder::new()
        .prg(0x8000, &[0xA9, 0x1E, 0x8D, 0x01, 0x20]) // LDA #$1E; STA $2001
        .into_nes();
    nes.emulate(1.0);
    let frames = nes.frame_count();
    assert!(
        (60..=61).contains(&frames),
        "{} frames with rendering enabled",
        frames
    );
}

#[test]
fn nmi_asserted_within_delay_after_enable() {
    let mut nes = RomBuilder::new().into_nes();

    // Enter vblank with NMI disabled, then enable it mid-vblank
    run_to_dot(&mut nes, 245, 100);
    nes.bus.write(0x2000, 0x80);

    let mut asserted = false;
    for _ in 0..NMI_DELAY_DOTS as usize {
        nes.bus.step_ppu();
        if nes.bus.ppu.take_nmi() {
            asserted = true;
            break;
        }
    }
    assert!(asserted, "NMI within {} dots of the $2000 write", NMI_DELAY_DOTS);
}

#[test]
fn nmi_reaches_cpu_at_instruction_boundary() {
    // Program enables NMI in $2000 and loops; handler writes a marker into
    // zero page
    let mut nes = RomBuilder::new()
        .prg(
            0x8000,
            &[
                0xA9, 0x80, // LDA #$80
                0x8D, 0x00, 0x20, // STA $2000
                0x4C, 0x05, 0x80, // loop: JMP loop
            ],
        )
        .prg(0x9000, &[0xA9, 0x42, 0x85, 0x10, 0x40]) // LDA #$42; STA $10; RTI
        .nmi_vector(0x9000)
        .into_nes();

    // Two frames are ample for vblank + the delay line + the handler
    nes.emulate(2.0 / 60.0);
    assert_eq!(nes.bus.read(0x0010), 0x42, "NMI handler ran");
}

#[test]
fn status_read_clears_vblank_and_write_toggle() {
    let mut nes = RomBuilder::new().into_nes();
    run_to_dot(&mut nes, 245, 0);

    let status = nes.bus.read(0x2002);
    assert_ne!(status & 0x80, 0, "in vblank");
    let status = nes.bus.read(0x2002);
    assert_eq!(status & 0x80, 0, "cleared by the first read");
}

#[test]
fn oam_dma_copies_and_stalls() {
    let mut nes = RomBuilder::new()
        .prg(0x8000, &[0xA9, 0x02, 0x8D, 0x14, 0x40]) // LDA #$02; STA $4014
        .into_nes();

    for i in 0..256u16 {
        nes.bus.write(0x0200 + i, i as u8);
    }

    nes.cpu.step(&mut nes.bus); // LDA
    let cycles_at_write = nes.cpu.cycles + 4; // STA $4014 is 4 cycles
    nes.cpu.step(&mut nes.bus); // STA triggers the DMA

    let expected_stall = 513 + (cycles_at_write & 1) as u32;
    assert_eq!(nes.cpu.stall, expected_stall, "513 even / 514 odd");

    for i in 0..256usize {
        assert_eq!(nes.bus.ppu.oam[i], i as u8, "OAM byte {}", i);
    }

    // The stall drains one cycle per step
    assert_eq!(nes.cpu.step(&mut nes.bus), 1);
}

#[test]
fn sprite_zero_hit_set_and_cleared() {
    // Solid background tile everywhere, solid sprite 0 at (16, 32)
    let solid = [0xFF; 8];
    let mut nes = RomBuilder::with_layout(0, 2, 1)
        .chr_tile(1, solid, [0; 8])
        .into_nes();

    // Fill the first nametable with tile 1 through $2006/$2007
    nes.bus.write(0x2006, 0x20);
    nes.bus.write(0x2006, 0x00);
    for _ in 0..0x3C0 {
        nes.bus.write(0x2007, 0x01);
    }

    // Sprite 0: y=32, tile 1, no attributes, x=16
    nes.bus.ppu.oam[0] = 32;
    nes.bus.ppu.oam[1] = 1;
    nes.bus.ppu.oam[2] = 0;
    nes.bus.ppu.oam[3] = 16;

    // Enable background and sprites, no left-edge clipping
    nes.bus.write(0x2001, 0x1E);

    run_to_dot(&mut nes, 32, 0);
    assert_eq!(nes.bus.ppu.flag_sprite_zero_hit, 0, "no hit before the row");

    // The hit lands while the sprite's row is drawn; give it two scanlines
    run_to_dot(&mut nes, 35, 0);
    assert_eq!(nes.bus.ppu.flag_sprite_zero_hit, 1, "hit over the sprite row");

    // Cleared at pre-render dot 1
    run_to_dot(&mut nes, 261, 2);
    assert_eq!(nes.bus.ppu.flag_sprite_zero_hit, 0, "cleared at pre-render");
}

#[test]
fn interrupt_latch_priority() {
    let mut nes = RomBuilder::new().into_nes();
    nes.cpu.set_flag(famicore::cpu::flags::INTERRUPT_DISABLE, false);
    nes.cpu.trigger_irq();
    nes.cpu.trigger_nmi();
    assert_eq!(nes.cpu.pending_interrupt, Interrupt::Nmi, "NMI wins the latch");
}
