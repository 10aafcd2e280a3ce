// Instruction execution
//
// `execute` dispatches on the decoded `Op`. Addressing is already resolved;
// handlers only read or write through the effective address. Branch timing
// (+1 taken, +1 more when the target is on a different page than the next
// instruction) is charged here because it depends on whether the branch is
// taken.

use crate::bus::Bus;
use crate::cpu::addressing::{pages_differ, AddressingMode};
use crate::cpu::flags;
use crate::cpu::opcodes::{Op, OPCODE_TABLE};
use crate::cpu::{vectors, Cpu};

impl Cpu {
    pub(crate) fn execute(&mut self, bus: &mut Bus, op: Op, mode: AddressingMode, addr: u16) {
        match op {
            // Loads and stores
            Op::Lda => {
                self.a = bus.read(addr);
                self.set_zn(self.a);
            }
            Op::Ldx => {
                self.x = bus.read(addr);
                self.set_zn(self.x);
            }
            Op::Ldy => {
                self.y = bus.read(addr);
                self.set_zn(self.y);
            }
            Op::Sta => bus.write(addr, self.a),
            Op::Stx => bus.write(addr, self.x),
            Op::Sty => bus.write(addr, self.y),

            // Transfers
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Op::Txs => self.sp = self.x, // no flags

            // Arithmetic
            Op::Adc => self.adc(bus.read(addr)),
            Op::Sbc => self.sbc(bus.read(addr)),
            Op::Cmp => {
                let m = bus.read(addr);
                self.compare(self.a, m);
            }
            Op::Cpx => {
                let m = bus.read(addr);
                self.compare(self.x, m);
            }
            Op::Cpy => {
                let m = bus.read(addr);
                self.compare(self.y, m);
            }

            // Increments and decrements
            Op::Inc => {
                let v = bus.read(addr).wrapping_add(1);
                bus.write(addr, v);
                self.set_zn(v);
            }
            Op::Dec => {
                let v = bus.read(addr).wrapping_sub(1);
                bus.write(addr, v);
                self.set_zn(v);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }

            // Bitwise
            Op::And => {
                self.a &= bus.read(addr);
                self.set_zn(self.a);
            }
            Op::Ora => {
                self.a |= bus.read(addr);
                self.set_zn(self.a);
            }
            Op::Eor => {
                self.a ^= bus.read(addr);
                self.set_zn(self.a);
            }
            Op::Bit => {
                let m = bus.read(addr);
                self.set_flag(flags::ZERO, self.a & m == 0);
                self.set_flag(flags::OVERFLOW, m & 0x40 != 0);
                self.set_flag(flags::NEGATIVE, m & 0x80 != 0);
            }

            // Shifts and rotates
            Op::Asl => self.modify(bus, mode, addr, |cpu, v| {
                cpu.set_flag(flags::CARRY, v & 0x80 != 0);
                v << 1
            }),
            Op::Lsr => self.modify(bus, mode, addr, |cpu, v| {
                cpu.set_flag(flags::CARRY, v & 1 != 0);
                v >> 1
            }),
            Op::Rol => self.modify(bus, mode, addr, |cpu, v| {
                let carry_in = cpu.get_flag(flags::CARRY) as u8;
                cpu.set_flag(flags::CARRY, v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Op::Ror => self.modify(bus, mode, addr, |cpu, v| {
                let carry_in = (cpu.get_flag(flags::CARRY) as u8) << 7;
                cpu.set_flag(flags::CARRY, v & 1 != 0);
                (v >> 1) | carry_in
            }),

            // Branches
            Op::Bcc => self.branch(addr, !self.get_flag(flags::CARRY)),
            Op::Bcs => self.branch(addr, self.get_flag(flags::CARRY)),
            Op::Bne => self.branch(addr, !self.get_flag(flags::ZERO)),
            Op::Beq => self.branch(addr, self.get_flag(flags::ZERO)),
            Op::Bpl => self.branch(addr, !self.get_flag(flags::NEGATIVE)),
            Op::Bmi => self.branch(addr, self.get_flag(flags::NEGATIVE)),
            Op::Bvc => self.branch(addr, !self.get_flag(flags::OVERFLOW)),
            Op::Bvs => self.branch(addr, self.get_flag(flags::OVERFLOW)),

            // Jumps and returns
            Op::Jmp => self.pc = addr,
            Op::Jsr => {
                // Pushes the address of the last byte of the JSR
                self.push16(bus, self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Op::Rts => self.pc = self.pull16(bus).wrapping_add(1),
            Op::Rti => {
                let status = self.pull(bus);
                self.status = (status & !flags::BREAK) | flags::UNUSED;
                self.pc = self.pull16(bus);
            }
            Op::Brk => {
                // BRK skips its padding byte: push PC+1 (PC already advanced
                // past the opcode), then enter the IRQ vector with B set on
                // the stack copy
                self.push16(bus, self.pc.wrapping_add(1));
                self.push(bus, self.status | flags::BREAK | flags::UNUSED);
                self.set_flag(flags::INTERRUPT_DISABLE, true);
                self.pc = self.read16(bus, vectors::IRQ);
            }

            // Stack
            Op::Pha => self.push(bus, self.a),
            Op::Pla => {
                self.a = self.pull(bus);
                self.set_zn(self.a);
            }
            Op::Php => {
                // PHP pushes with B set, like BRK
                self.push(bus, self.status | flags::BREAK | flags::UNUSED);
            }
            Op::Plp => {
                let status = self.pull(bus);
                self.status = (status & !flags::BREAK) | flags::UNUSED;
            }

            // Flag operations
            Op::Clc => self.set_flag(flags::CARRY, false),
            Op::Sec => self.set_flag(flags::CARRY, true),
            Op::Cli => self.set_flag(flags::INTERRUPT_DISABLE, false),
            Op::Sei => self.set_flag(flags::INTERRUPT_DISABLE, true),
            Op::Clv => self.set_flag(flags::OVERFLOW, false),
            Op::Cld => self.set_flag(flags::DECIMAL, false),
            Op::Sed => self.set_flag(flags::DECIMAL, true),

            // NOP covers the official $EA and every unofficial opcode; KIL
            // has size 0 so the PC re-fetches it forever
            Op::Nop | Op::Kil => {}
        }
    }

    /// ADC: A + M + C with NES (binary-only) arithmetic. The D flag is
    /// storable but ignored.
    fn adc(&mut self, m: u8) {
        let a = self.a;
        let c = self.get_flag(flags::CARRY) as u16;
        let sum = a as u16 + m as u16 + c;
        self.a = sum as u8;
        self.set_flag(flags::CARRY, sum > 0xFF);
        self.set_flag(
            flags::OVERFLOW,
            (a ^ m) & 0x80 == 0 && (a ^ self.a) & 0x80 != 0,
        );
        self.set_zn(self.a);
    }

    /// SBC: A - M - (1-C), implemented as ADC of the complement
    fn sbc(&mut self, m: u8) {
        let a = self.a;
        let c = self.get_flag(flags::CARRY) as i16;
        let diff = a as i16 - m as i16 - (1 - c);
        self.a = diff as u8;
        self.set_flag(flags::CARRY, diff >= 0);
        self.set_flag(
            flags::OVERFLOW,
            (a ^ m) & 0x80 != 0 && (a ^ self.a) & 0x80 != 0,
        );
        self.set_zn(self.a);
    }

    /// CMP/CPX/CPY: C set when reg >= M, Z/N from the difference
    fn compare(&mut self, reg: u8, m: u8) {
        self.set_flag(flags::CARRY, reg >= m);
        self.set_zn(reg.wrapping_sub(m));
    }

    /// Read-modify-write through memory, or directly on A in accumulator
    /// mode
    fn modify<F: FnOnce(&mut Cpu, u8) -> u8>(
        &mut self,
        bus: &mut Bus,
        mode: AddressingMode,
        addr: u16,
        f: F,
    ) {
        if mode == AddressingMode::Accumulator {
            let v = f(self, self.a);
            self.a = v;
            self.set_zn(v);
        } else {
            let v = f(self, bus.read(addr));
            bus.write(addr, v);
            self.set_zn(v);
        }
    }

    /// Taken branches cost one extra cycle, two when the target is on a
    /// different page than the instruction that follows the branch
    fn branch(&mut self, addr: u16, condition: bool) {
        if condition {
            self.cycles += 1;
            if pages_differ(self.pc, addr) {
                self.cycles += 1;
            }
            self.pc = addr;
        }
    }

    /// Render one nestest-style trace line for the instruction at PC.
    ///
    /// `C000  4C F5 C5  JMP $C5F5    A:00 X:00 Y:00 P:24 SP:FD CYC:7`
    pub fn trace(&mut self, bus: &mut Bus) -> String {
        let opcode = bus.read(self.pc);
        let info = &OPCODE_TABLE[opcode as usize];
        let size = info.size.max(1);

        let mut bytes = Vec::with_capacity(3);
        for i in 0..size {
            bytes.push(bus.read(self.pc.wrapping_add(i as u16)));
        }
        let byte_str = bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");

        let operand = self.format_operand(info.mode, &bytes);
        let asm = format!("{} {}", info.name, operand);

        format!(
            "{:04X}  {:<8}  {:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, byte_str, asm, self.a, self.x, self.y, self.status, self.sp, self.cycles
        )
    }

    fn format_operand(&self, mode: AddressingMode, bytes: &[u8]) -> String {
        let b1 = bytes.get(1).copied().unwrap_or(0);
        let b2 = bytes.get(2).copied().unwrap_or(0);
        let word = (b2 as u16) << 8 | b1 as u16;
        match mode {
            AddressingMode::Implied => String::new(),
            AddressingMode::Accumulator => "A".to_string(),
            AddressingMode::Immediate => format!("#${:02X}", b1),
            AddressingMode::ZeroPage => format!("${:02X}", b1),
            AddressingMode::ZeroPageX => format!("${:02X},X", b1),
            AddressingMode::ZeroPageY => format!("${:02X},Y", b1),
            AddressingMode::Absolute => format!("${:04X}", word),
            AddressingMode::AbsoluteX => format!("${:04X},X", word),
            AddressingMode::AbsoluteY => format!("${:04X},Y", word),
            AddressingMode::Indirect => format!("(${:04X})", word),
            AddressingMode::IndexedIndirect => format!("(${:02X},X)", b1),
            AddressingMode::IndirectIndexed => format!("(${:02X}),Y", b1),
            AddressingMode::Relative => {
                let offset = b1 as i8;
                let target = self.pc.wrapping_add(2).wrapping_add(offset as u16);
                format!("${:04X}", target)
            }
        }
    }
}
