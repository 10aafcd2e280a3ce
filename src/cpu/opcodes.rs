// 6502 decode table
//
// One entry per opcode byte: the operation, its display mnemonic, addressing
// mode, instruction size in bytes, base cycle count, and whether an index
// page crossing costs an extra cycle. Branch penalties (+1 taken, +1 page
// crossed) are applied by the branch handlers, not this table.
//
// Unofficial opcodes decode to `Nop` with their documented size and cycle
// count so that games which stray into them keep correct timing; their
// conventional mnemonics are kept for the trace output. The twelve KIL
// opcodes have size 0: the PC stays put and the CPU spins, which is what the
// silicon does.

use super::addressing::AddressingMode::{self, *};

/// Operations the executor dispatches on. Unofficial opcodes all collapse
/// into `Nop` (or `Kil`), per the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    Kil,
}

use Op::*;

/// One decode table entry
pub struct OpcodeInfo {
    pub op: Op,
    pub name: &'static str,
    pub mode: AddressingMode,
    pub size: u8,
    pub cycles: u8,
    /// True when a page crossing during index addition costs +1 cycle
    pub page_cycle: bool,
}

const fn e(
    op: Op,
    name: &'static str,
    mode: AddressingMode,
    size: u8,
    cycles: u8,
    page_cycle: bool,
) -> OpcodeInfo {
    OpcodeInfo {
        op,
        name,
        mode,
        size,
        cycles,
        page_cycle,
    }
}

#[rustfmt::skip]
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    e(Brk, "BRK", Implied,         1, 7, false), // 00
    e(Ora, "ORA", IndexedIndirect, 2, 6, false), // 01
    e(Kil, "KIL", Implied,         0, 2, false), // 02
    e(Nop, "SLO", IndexedIndirect, 2, 8, false), // 03
    e(Nop, "NOP", ZeroPage,        2, 3, false), // 04
    e(Ora, "ORA", ZeroPage,        2, 3, false), // 05
    e(Asl, "ASL", ZeroPage,        2, 5, false), // 06
    e(Nop, "SLO", ZeroPage,        2, 5, false), // 07
    e(Php, "PHP", Implied,         1, 3, false), // 08
    e(Ora, "ORA", Immediate,       2, 2, false), // 09
    e(Asl, "ASL", Accumulator,     1, 2, false), // 0A
    e(Nop, "ANC", Immediate,       2, 2, false), // 0B
    e(Nop, "NOP", Absolute,        3, 4, false), // 0C
    e(Ora, "ORA", Absolute,        3, 4, false), // 0D
    e(Asl, "ASL", Absolute,        3, 6, false), // 0E
    e(Nop, "SLO", Absolute,        3, 6, false), // 0F
    e(Bpl, "BPL", Relative,        2, 2, false), // 10
    e(Ora, "ORA", IndirectIndexed, 2, 5, true),  // 11
    e(Kil, "KIL", Implied,         0, 2, false), // 12
    e(Nop, "SLO", IndirectIndexed, 2, 8, false), // 13
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // 14
    e(Ora, "ORA", ZeroPageX,       2, 4, false), // 15
    e(Asl, "ASL", ZeroPageX,       2, 6, false), // 16
    e(Nop, "SLO", ZeroPageX,       2, 6, false), // 17
    e(Clc, "CLC", Implied,         1, 2, false), // 18
    e(Ora, "ORA", AbsoluteY,       3, 4, true),  // 19
    e(Nop, "NOP", Implied,         1, 2, false), // 1A
    e(Nop, "SLO", AbsoluteY,       3, 7, false), // 1B
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // 1C
    e(Ora, "ORA", AbsoluteX,       3, 4, true),  // 1D
    e(Asl, "ASL", AbsoluteX,       3, 7, false), // 1E
    e(Nop, "SLO", AbsoluteX,       3, 7, false), // 1F
    e(Jsr, "JSR", Absolute,        3, 6, false), // 20
    e(And, "AND", IndexedIndirect, 2, 6, false), // 21
    e(Kil, "KIL", Implied,         0, 2, false), // 22
    e(Nop, "RLA", IndexedIndirect, 2, 8, false), // 23
    e(Bit, "BIT", ZeroPage,        2, 3, false), // 24
    e(And, "AND", ZeroPage,        2, 3, false), // 25
    e(Rol, "ROL", ZeroPage,        2, 5, false), // 26
    e(Nop, "RLA", ZeroPage,        2, 5, false), // 27
    e(Plp, "PLP", Implied,         1, 4, false), // 28
    e(And, "AND", Immediate,       2, 2, false), // 29
    e(Rol, "ROL", Accumulator,     1, 2, false), // 2A
    e(Nop, "ANC", Immediate,       2, 2, false), // 2B
    e(Bit, "BIT", Absolute,        3, 4, false), // 2C
    e(And, "AND", Absolute,        3, 4, false), // 2D
    e(Rol, "ROL", Absolute,        3, 6, false), // 2E
    e(Nop, "RLA", Absolute,        3, 6, false), // 2F
    e(Bmi, "BMI", Relative,        2, 2, false), // 30
    e(And, "AND", IndirectIndexed, 2, 5, true),  // 31
    e(Kil, "KIL", Implied,         0, 2, false), // 32
    e(Nop, "RLA", IndirectIndexed, 2, 8, false), // 33
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // 34
    e(And, "AND", ZeroPageX,       2, 4, false), // 35
    e(Rol, "ROL", ZeroPageX,       2, 6, false), // 36
    e(Nop, "RLA", ZeroPageX,       2, 6, false), // 37
    e(Sec, "SEC", Implied,         1, 2, false), // 38
    e(And, "AND", AbsoluteY,       3, 4, true),  // 39
    e(Nop, "NOP", Implied,         1, 2, false), // 3A
    e(Nop, "RLA", AbsoluteY,       3, 7, false), // 3B
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // 3C
    e(And, "AND", AbsoluteX,       3, 4, true),  // 3D
    e(Rol, "ROL", AbsoluteX,       3, 7, false), // 3E
    e(Nop, "RLA", AbsoluteX,       3, 7, false), // 3F
    e(Rti, "RTI", Implied,         1, 6, false), // 40
    e(Eor, "EOR", IndexedIndirect, 2, 6, false), // 41
    e(Kil, "KIL", Implied,         0, 2, false), // 42
    e(Nop, "SRE", IndexedIndirect, 2, 8, false), // 43
    e(Nop, "NOP", ZeroPage,        2, 3, false), // 44
    e(Eor, "EOR", ZeroPage,        2, 3, false), // 45
    e(Lsr, "LSR", ZeroPage,        2, 5, false), // 46
    e(Nop, "SRE", ZeroPage,        2, 5, false), // 47
    e(Pha, "PHA", Implied,         1, 3, false), // 48
    e(Eor, "EOR", Immediate,       2, 2, false), // 49
    e(Lsr, "LSR", Accumulator,     1, 2, false), // 4A
    e(Nop, "ALR", Immediate,       2, 2, false), // 4B
    e(Jmp, "JMP", Absolute,        3, 3, false), // 4C
    e(Eor, "EOR", Absolute,        3, 4, false), // 4D
    e(Lsr, "LSR", Absolute,        3, 6, false), // 4E
    e(Nop, "SRE", Absolute,        3, 6, false), // 4F
    e(Bvc, "BVC", Relative,        2, 2, false), // 50
    e(Eor, "EOR", IndirectIndexed, 2, 5, true),  // 51
    e(Kil, "KIL", Implied,         0, 2, false), // 52
    e(Nop, "SRE", IndirectIndexed, 2, 8, false), // 53
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // 54
    e(Eor, "EOR", ZeroPageX,       2, 4, false), // 55
    e(Lsr, "LSR", ZeroPageX,       2, 6, false), // 56
    e(Nop, "SRE", ZeroPageX,       2, 6, false), // 57
    e(Cli, "CLI", Implied,         1, 2, false), // 58
    e(Eor, "EOR", AbsoluteY,       3, 4, true),  // 59
    e(Nop, "NOP", Implied,         1, 2, false), // 5A
    e(Nop, "SRE", AbsoluteY,       3, 7, false), // 5B
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // 5C
    e(Eor, "EOR", AbsoluteX,       3, 4, true),  // 5D
    e(Lsr, "LSR", AbsoluteX,       3, 7, false), // 5E
    e(Nop, "SRE", AbsoluteX,       3, 7, false), // 5F
    e(Rts, "RTS", Implied,         1, 6, false), // 60
    e(Adc, "ADC", IndexedIndirect, 2, 6, false), // 61
    e(Kil, "KIL", Implied,         0, 2, false), // 62
    e(Nop, "RRA", IndexedIndirect, 2, 8, false), // 63
    e(Nop, "NOP", ZeroPage,        2, 3, false), // 64
    e(Adc, "ADC", ZeroPage,        2, 3, false), // 65
    e(Ror, "ROR", ZeroPage,        2, 5, false), // 66
    e(Nop, "RRA", ZeroPage,        2, 5, false), // 67
    e(Pla, "PLA", Implied,         1, 4, false), // 68
    e(Adc, "ADC", Immediate,       2, 2, false), // 69
    e(Ror, "ROR", Accumulator,     1, 2, false), // 6A
    e(Nop, "ARR", Immediate,       2, 2, false), // 6B
    e(Jmp, "JMP", Indirect,        3, 5, false), // 6C
    e(Adc, "ADC", Absolute,        3, 4, false), // 6D
    e(Ror, "ROR", Absolute,        3, 6, false), // 6E
    e(Nop, "RRA", Absolute,        3, 6, false), // 6F
    e(Bvs, "BVS", Relative,        2, 2, false), // 70
    e(Adc, "ADC", IndirectIndexed, 2, 5, true),  // 71
    e(Kil, "KIL", Implied,         0, 2, false), // 72
    e(Nop, "RRA", IndirectIndexed, 2, 8, false), // 73
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // 74
    e(Adc, "ADC", ZeroPageX,       2, 4, false), // 75
    e(Ror, "ROR", ZeroPageX,       2, 6, false), // 76
    e(Nop, "RRA", ZeroPageX,       2, 6, false), // 77
    e(Sei, "SEI", Implied,         1, 2, false), // 78
    e(Adc, "ADC", AbsoluteY,       3, 4, true),  // 79
    e(Nop, "NOP", Implied,         1, 2, false), // 7A
    e(Nop, "RRA", AbsoluteY,       3, 7, false), // 7B
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // 7C
    e(Adc, "ADC", AbsoluteX,       3, 4, true),  // 7D
    e(Ror, "ROR", AbsoluteX,       3, 7, false), // 7E
    e(Nop, "RRA", AbsoluteX,       3, 7, false), // 7F
    e(Nop, "NOP", Immediate,       2, 2, false), // 80
    e(Sta, "STA", IndexedIndirect, 2, 6, false), // 81
    e(Nop, "NOP", Immediate,       2, 2, false), // 82
    e(Nop, "SAX", IndexedIndirect, 2, 6, false), // 83
    e(Sty, "STY", ZeroPage,        2, 3, false), // 84
    e(Sta, "STA", ZeroPage,        2, 3, false), // 85
    e(Stx, "STX", ZeroPage,        2, 3, false), // 86
    e(Nop, "SAX", ZeroPage,        2, 3, false), // 87
    e(Dey, "DEY", Implied,         1, 2, false), // 88
    e(Nop, "NOP", Immediate,       2, 2, false), // 89
    e(Txa, "TXA", Implied,         1, 2, false), // 8A
    e(Nop, "XAA", Immediate,       2, 2, false), // 8B
    e(Sty, "STY", Absolute,        3, 4, false), // 8C
    e(Sta, "STA", Absolute,        3, 4, false), // 8D
    e(Stx, "STX", Absolute,        3, 4, false), // 8E
    e(Nop, "SAX", Absolute,        3, 4, false), // 8F
    e(Bcc, "BCC", Relative,        2, 2, false), // 90
    e(Sta, "STA", IndirectIndexed, 2, 6, false), // 91
    e(Kil, "KIL", Implied,         0, 2, false), // 92
    e(Nop, "AHX", IndirectIndexed, 2, 6, false), // 93
    e(Sty, "STY", ZeroPageX,       2, 4, false), // 94
    e(Sta, "STA", ZeroPageX,       2, 4, false), // 95
    e(Stx, "STX", ZeroPageY,       2, 4, false), // 96
    e(Nop, "SAX", ZeroPageY,       2, 4, false), // 97
    e(Tya, "TYA", Implied,         1, 2, false), // 98
    e(Sta, "STA", AbsoluteY,       3, 5, false), // 99
    e(Txs, "TXS", Implied,         1, 2, false), // 9A
    e(Nop, "TAS", AbsoluteY,       3, 5, false), // 9B
    e(Nop, "SHY", AbsoluteX,       3, 5, false), // 9C
    e(Sta, "STA", AbsoluteX,       3, 5, false), // 9D
    e(Nop, "SHX", AbsoluteY,       3, 5, false), // 9E
    e(Nop, "AHX", AbsoluteY,       3, 5, false), // 9F
    e(Ldy, "LDY", Immediate,       2, 2, false), // A0
    e(Lda, "LDA", IndexedIndirect, 2, 6, false), // A1
    e(Ldx, "LDX", Immediate,       2, 2, false), // A2
    e(Nop, "LAX", IndexedIndirect, 2, 6, false), // A3
    e(Ldy, "LDY", ZeroPage,        2, 3, false), // A4
    e(Lda, "LDA", ZeroPage,        2, 3, false), // A5
    e(Ldx, "LDX", ZeroPage,        2, 3, false), // A6
    e(Nop, "LAX", ZeroPage,        2, 3, false), // A7
    e(Tay, "TAY", Implied,         1, 2, false), // A8
    e(Lda, "LDA", Immediate,       2, 2, false), // A9
    e(Tax, "TAX", Implied,         1, 2, false), // AA
    e(Nop, "LAX", Immediate,       2, 2, false), // AB
    e(Ldy, "LDY", Absolute,        3, 4, false), // AC
    e(Lda, "LDA", Absolute,        3, 4, false), // AD
    e(Ldx, "LDX", Absolute,        3, 4, false), // AE
    e(Nop, "LAX", Absolute,        3, 4, false), // AF
    e(Bcs, "BCS", Relative,        2, 2, false), // B0
    e(Lda, "LDA", IndirectIndexed, 2, 5, true),  // B1
    e(Kil, "KIL", Implied,         0, 2, false), // B2
    e(Nop, "LAX", IndirectIndexed, 2, 5, true),  // B3
    e(Ldy, "LDY", ZeroPageX,       2, 4, false), // B4
    e(Lda, "LDA", ZeroPageX,       2, 4, false), // B5
    e(Ldx, "LDX", ZeroPageY,       2, 4, false), // B6
    e(Nop, "LAX", ZeroPageY,       2, 4, false), // B7
    e(Clv, "CLV", Implied,         1, 2, false), // B8
    e(Lda, "LDA", AbsoluteY,       3, 4, true),  // B9
    e(Tsx, "TSX", Implied,         1, 2, false), // BA
    e(Nop, "LAS", AbsoluteY,       3, 4, true),  // BB
    e(Ldy, "LDY", AbsoluteX,       3, 4, true),  // BC
    e(Lda, "LDA", AbsoluteX,       3, 4, true),  // BD
    e(Ldx, "LDX", AbsoluteY,       3, 4, true),  // BE
    e(Nop, "LAX", AbsoluteY,       3, 4, true),  // BF
    e(Cpy, "CPY", Immediate,       2, 2, false), // C0
    e(Cmp, "CMP", IndexedIndirect, 2, 6, false), // C1
    e(Nop, "NOP", Immediate,       2, 2, false), // C2
    e(Nop, "DCP", IndexedIndirect, 2, 8, false), // C3
    e(Cpy, "CPY", ZeroPage,        2, 3, false), // C4
    e(Cmp, "CMP", ZeroPage,        2, 3, false), // C5
    e(Dec, "DEC", ZeroPage,        2, 5, false), // C6
    e(Nop, "DCP", ZeroPage,        2, 5, false), // C7
    e(Iny, "INY", Implied,         1, 2, false), // C8
    e(Cmp, "CMP", Immediate,       2, 2, false), // C9
    e(Dex, "DEX", Implied,         1, 2, false), // CA
    e(Nop, "AXS", Immediate,       2, 2, false), // CB
    e(Cpy, "CPY", Absolute,        3, 4, false), // CC
    e(Cmp, "CMP", Absolute,        3, 4, false), // CD
    e(Dec, "DEC", Absolute,        3, 6, false), // CE
    e(Nop, "DCP", Absolute,        3, 6, false), // CF
    e(Bne, "BNE", Relative,        2, 2, false), // D0
    e(Cmp, "CMP", IndirectIndexed, 2, 5, true),  // D1
    e(Kil, "KIL", Implied,         0, 2, false), // D2
    e(Nop, "DCP", IndirectIndexed, 2, 8, false), // D3
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // D4
    e(Cmp, "CMP", ZeroPageX,       2, 4, false), // D5
    e(Dec, "DEC", ZeroPageX,       2, 6, false), // D6
    e(Nop, "DCP", ZeroPageX,       2, 6, false), // D7
    e(Cld, "CLD", Implied,         1, 2, false), // D8
    e(Cmp, "CMP", AbsoluteY,       3, 4, true),  // D9
    e(Nop, "NOP", Implied,         1, 2, false), // DA
    e(Nop, "DCP", AbsoluteY,       3, 7, false), // DB
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // DC
    e(Cmp, "CMP", AbsoluteX,       3, 4, true),  // DD
    e(Dec, "DEC", AbsoluteX,       3, 7, false), // DE
    e(Nop, "DCP", AbsoluteX,       3, 7, false), // DF
    e(Cpx, "CPX", Immediate,       2, 2, false), // E0
    e(Sbc, "SBC", IndexedIndirect, 2, 6, false), // E1
    e(Nop, "NOP", Immediate,       2, 2, false), // E2
    e(Nop, "ISB", IndexedIndirect, 2, 8, false), // E3
    e(Cpx, "CPX", ZeroPage,        2, 3, false), // E4
    e(Sbc, "SBC", ZeroPage,        2, 3, false), // E5
    e(Inc, "INC", ZeroPage,        2, 5, false), // E6
    e(Nop, "ISB", ZeroPage,        2, 5, false), // E7
    e(Inx, "INX", Implied,         1, 2, false), // E8
    e(Sbc, "SBC", Immediate,       2, 2, false), // E9
    e(Nop, "NOP", Implied,         1, 2, false), // EA
    e(Sbc, "SBC", Immediate,       2, 2, false), // EB
    e(Cpx, "CPX", Absolute,        3, 4, false), // EC
    e(Sbc, "SBC", Absolute,        3, 4, false), // ED
    e(Inc, "INC", Absolute,        3, 6, false), // EE
    e(Nop, "ISB", Absolute,        3, 6, false), // EF
    e(Beq, "BEQ", Relative,        2, 2, false), // F0
    e(Sbc, "SBC", IndirectIndexed, 2, 5, true),  // F1
    e(Kil, "KIL", Implied,         0, 2, false), // F2
    e(Nop, "ISB", IndirectIndexed, 2, 8, false), // F3
    e(Nop, "NOP", ZeroPageX,       2, 4, false), // F4
    e(Sbc, "SBC", ZeroPageX,       2, 4, false), // F5
    e(Inc, "INC", ZeroPageX,       2, 6, false), // F6
    e(Nop, "ISB", ZeroPageX,       2, 6, false), // F7
    e(Sed, "SED", Implied,         1, 2, false), // F8
    e(Sbc, "SBC", AbsoluteY,       3, 4, true),  // F9
    e(Nop, "NOP", Implied,         1, 2, false), // FA
    e(Nop, "ISB", AbsoluteY,       3, 7, false), // FB
    e(Nop, "NOP", AbsoluteX,       3, 4, true),  // FC
    e(Sbc, "SBC", AbsoluteX,       3, 4, true),  // FD
    e(Inc, "INC", AbsoluteX,       3, 7, false), // FE
    e(Nop, "ISB", AbsoluteX,       3, 7, false), // FF
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_256_entries() {
        assert_eq!(OPCODE_TABLE.len(), 256);
    }

    #[test]
    fn test_official_spot_checks() {
        // A handful of well-known encodings
        let lda_imm = &OPCODE_TABLE[0xA9];
        assert_eq!(lda_imm.op, Op::Lda);
        assert_eq!(lda_imm.mode, Immediate);
        assert_eq!((lda_imm.size, lda_imm.cycles), (2, 2));

        let jmp_ind = &OPCODE_TABLE[0x6C];
        assert_eq!(jmp_ind.op, Op::Jmp);
        assert_eq!(jmp_ind.mode, Indirect);
        assert_eq!(jmp_ind.cycles, 5);

        let sta_absx = &OPCODE_TABLE[0x9D];
        assert_eq!(sta_absx.cycles, 5);
        assert!(!sta_absx.page_cycle, "stores never pay the cross penalty");

        let lda_absx = &OPCODE_TABLE[0xBD];
        assert_eq!(lda_absx.cycles, 4);
        assert!(lda_absx.page_cycle);
    }

    #[test]
    fn test_every_entry_consumes_cycles() {
        for (i, entry) in OPCODE_TABLE.iter().enumerate() {
            assert!(entry.cycles >= 2, "opcode {:02X} has cycles < 2", i);
        }
    }

    #[test]
    fn test_kil_opcodes_do_not_advance() {
        for opcode in [0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2] {
            let entry = &OPCODE_TABLE[opcode];
            assert_eq!(entry.op, Op::Kil);
            assert_eq!(entry.size, 0);
        }
    }

    #[test]
    fn test_branches_are_relative_two_bytes() {
        for opcode in [0x10, 0x30, 0x50, 0x70, 0x90, 0xB0, 0xD0, 0xF0] {
            let entry = &OPCODE_TABLE[opcode];
            assert_eq!(entry.mode, Relative);
            assert_eq!(entry.size, 2);
            assert_eq!(entry.cycles, 2);
        }
    }
}
