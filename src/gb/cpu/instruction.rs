use crate::gb::Bus;
use crate::gb::cpu::CPU;
use crate::gb::cpu::instruction::Instruction::*;
use crate::gb::cpu::ops::JumpCondition::Always;
use crate::gb::cpu::ops::Register::A;
use crate::gb::cpu::ops::WordRegister::{AF, BC, DE, HL, SP};
use crate::gb::cpu::ops::*;
use std::fmt;
use std::fmt::Formatter;

const OPCODE_PREFIX_16BIT: u8 = 0xCB;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    ADD(ByteSource),               // Add n to A
    ADDHL(WordSource),             // Add nn to HL
    ADDSP(i8),                     // Add signed immediate 8 bit value to Stack Pointer
    ADC(ByteSource),               // Add n + Carry flag to A
    AND(ByteSource),               // Logically AND n with A, result in A
    BIT(u8, ByteTarget),           // Test bit b in register r
    CALL(JumpCondition, u16),      // Push address of next instruction onto stack and jump to nn
    CCF,                           // Complement carry flag
    CP(ByteSource),                // Compare A with source
    CPL,                           // Flips all bits in A register, sets N and H flags
    DAA,                           // Adjusts A to packed BCD after an addition or subtraction
    DEC(ByteTarget),               // Decrement single byte register n
    DEC2(WordRegister),            // Decrement word register n
    DI,                            // Disables interrupt handling
    EI,                            // Enables interrupt handling after the next instruction
    HALT,                          // Halts and wait for interrupt
    INC(ByteTarget),               // Increment single byte register n
    INC2(WordRegister),            // Increment word register n
    JP(JumpCondition, JumpTarget), // Jump to address nn
    JR(JumpCondition, i8),         // Relative jump to given address
    LD(Load),                      // Put value into n
    NOP,                           // No operation
    OR(ByteSource),                // Logical OR n with register A, result in A.
    POP(WordRegister),             // Pops to the 16-bit register
    PUSH(WordRegister),            // Push to the stack memory, data from the 16-bit register
    RES(u8, ByteTarget),           // Reset bit b in register r
    RET(JumpCondition),            // Pop two bytes from stack & jump to that address
    RETI,                          // Unconditional return which also enables interrupts
    RL(ByteTarget),                // Rotate n left through Carry flag
    RLA,                           // Rotate A left through carry
    RLC(ByteTarget),               // Rotate target left
    RLCA,                          // Rotate A left. Old bit 7 to Carry flag
    RR(ByteTarget),                // Rotate n right through Carry flag
    RRA,                           // Rotate A right through Carry flag
    RRC(ByteTarget),               // Rotate n right. Old bit 0 to Carry flag
    RRCA,                          // Rotate A right. Old bit 0 to Carry flag
    RST(ResetCode),                // Push present address onto stack, jump to address n
    SBC(ByteSource),               // Subtract n + Carry flag from A
    SCF,                           // Set carry flag
    SET(u8, ByteTarget),           // Set bit b in register r
    SLA(ByteTarget),               // Shift n left into Carry. LSB of n set to 0
    SRA(ByteTarget),               // Shift n right into Carry. MSB doesn't change
    SRL(ByteTarget),               // Shift right into Carry, MSB set to 0
    STOP,                          // Halt CPU & LCD display until button pressed
    SUB(ByteSource),               // Subtract n from A
    SWAP(ByteTarget),              // Swap upper & lower nibbles of n
    XOR(ByteSource),               // Logical exclusive OR n with register A, result in A
    Illegal(u8),                   // Opcode without an instruction
}

impl Instruction {
    /// Decodes the given opcode. Operands and the second byte of prefixed opcodes
    /// are fetched from the bus, advancing the program counter.
    pub fn decode<T: Bus>(opcode: u8, cpu: &mut CPU, bus: &mut T) -> Instruction {
        match opcode {
            0x00 => NOP,
            0x01 | 0x11 | 0x21 | 0x31 => LD(Load::Word(
                word_register(opcode),
                WordSource::D16(cpu.fetch_word(bus)),
            )),
            0x02 => LD(Load::Byte(ByteTarget::I(ByteRef::R(BC)), ByteSource::R(A))),
            0x12 => LD(Load::Byte(ByteTarget::I(ByteRef::R(DE)), ByteSource::R(A))),
            0x22 => LD(Load::HLIFromAInc),
            0x32 => LD(Load::HLIFromADec),
            0x03 | 0x13 | 0x23 | 0x33 => INC2(word_register(opcode)),
            0x0B | 0x1B | 0x2B | 0x3B => DEC2(word_register(opcode)),
            0x09 | 0x19 | 0x29 | 0x39 => ADDHL(WordSource::R(word_register(opcode))),
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                INC(ByteTarget::from_code(opcode >> 3))
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                DEC(ByteTarget::from_code(opcode >> 3))
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => LD(Load::Byte(
                ByteTarget::from_code(opcode >> 3),
                ByteSource::D8(cpu.fetch(bus)),
            )),
            0x07 => RLCA,
            0x0F => RRCA,
            0x17 => RLA,
            0x1F => RRA,
            0x27 => DAA,
            0x2F => CPL,
            0x37 => SCF,
            0x3F => CCF,
            0x08 => LD(Load::IndirectFromSP(cpu.fetch_word(bus))),
            0x0A => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::R(BC)))),
            0x1A => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::R(DE)))),
            0x2A => LD(Load::HLIToAInc),
            0x3A => LD(Load::HLIToADec),
            0x10 => {
                // STOP is followed by a padding byte
                cpu.fetch(bus);
                STOP
            }
            0x18 => JR(Always, cpu.fetch(bus) as i8),
            0x20 | 0x28 | 0x30 | 0x38 => {
                JR(JumpCondition::from_code(opcode >> 3), cpu.fetch(bus) as i8)
            }
            0x76 => HALT,
            0x40..=0x7F => LD(Load::Byte(
                ByteTarget::from_code(opcode >> 3),
                ByteTarget::from_code(opcode).into(),
            )),
            0x80..=0xBF => arithmetic(opcode >> 3, ByteTarget::from_code(opcode).into()),
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                arithmetic(opcode >> 3, ByteSource::D8(cpu.fetch(bus)))
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => RET(JumpCondition::from_code(opcode >> 3)),
            0xC9 => RET(Always),
            0xD9 => RETI,
            0xC1 | 0xD1 | 0xE1 | 0xF1 => POP(stack_register(opcode)),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => PUSH(stack_register(opcode)),
            0xC2 | 0xCA | 0xD2 | 0xDA => JP(
                JumpCondition::from_code(opcode >> 3),
                JumpTarget::D16(cpu.fetch_word(bus)),
            ),
            0xC3 => JP(Always, JumpTarget::D16(cpu.fetch_word(bus))),
            0xE9 => JP(Always, JumpTarget::HL),
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                CALL(JumpCondition::from_code(opcode >> 3), cpu.fetch_word(bus))
            }
            0xCD => CALL(Always, cpu.fetch_word(bus)),
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                RST(ResetCode::from_opcode(opcode))
            }
            OPCODE_PREFIX_16BIT => Instruction::prefixed(cpu.fetch(bus)),
            0xE0 => LD(Load::Byte(
                ByteTarget::I(ByteRef::D8(cpu.fetch(bus))),
                ByteSource::R(A),
            )),
            0xF0 => LD(Load::Byte(
                ByteTarget::R(A),
                ByteSource::I(ByteRef::D8(cpu.fetch(bus))),
            )),
            0xE2 => LD(Load::Byte(ByteTarget::I(ByteRef::C), ByteSource::R(A))),
            0xF2 => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::C))),
            0xEA => LD(Load::Byte(
                ByteTarget::I(ByteRef::D16(cpu.fetch_word(bus))),
                ByteSource::R(A),
            )),
            0xFA => LD(Load::Byte(
                ByteTarget::R(A),
                ByteSource::I(ByteRef::D16(cpu.fetch_word(bus))),
            )),
            0xE8 => ADDSP(cpu.fetch(bus) as i8),
            0xF8 => LD(Load::HLFromSPi8(cpu.fetch(bus) as i8)),
            0xF9 => LD(Load::Word(SP, WordSource::R(HL))),
            0xF3 => DI,
            0xFB => EI,
            // 0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD
            _ => Illegal(opcode),
        }
    }

    /// Decodes the second byte of a 0xCB prefixed opcode.
    /// Bits 0-2 select the operand, bits 3-5 the bit number or the shift operation.
    fn prefixed(opcode: u8) -> Instruction {
        let target = ByteTarget::from_code(opcode);
        let bit = (opcode >> 3) & 0b111;
        match opcode >> 6 {
            0b00 => match bit {
                0 => RLC(target),
                1 => RRC(target),
                2 => RL(target),
                3 => RR(target),
                4 => SLA(target),
                5 => SRA(target),
                6 => SWAP(target),
                _ => SRL(target),
            },
            0b01 => BIT(bit, target),
            0b10 => RES(bit, target),
            _ => SET(bit, target),
        }
    }

    /// Returns the number of clock cycles the instruction takes.
    /// `taken` tells whether a conditional branch was taken.
    pub fn cycles(&self, taken: bool) -> u16 {
        match *self {
            ADD(source) | ADC(source) | SUB(source) | SBC(source) | AND(source) | OR(source)
            | XOR(source) | CP(source) => 4 + source.access_cycles(),
            INC(target) | DEC(target) => 4 + 2 * target.access_cycles(),
            INC2(_) | DEC2(_) | ADDHL(_) => 8,
            ADDSP(_) => 16,
            BIT(_, target) => 8 + target.access_cycles(),
            RES(_, target)
            | SET(_, target)
            | RL(target)
            | RLC(target)
            | RR(target)
            | RRC(target)
            | SLA(target)
            | SRA(target)
            | SRL(target)
            | SWAP(target) => 8 + 2 * target.access_cycles(),
            LD(load) => match load {
                Load::Byte(target, source) => {
                    4 + target.access_cycles() + source.access_cycles()
                }
                Load::Word(_, WordSource::D16(_)) => 12,
                Load::Word(_, WordSource::R(_)) => 8,
                Load::HLIFromAInc | Load::HLIFromADec | Load::HLIToAInc | Load::HLIToADec => 8,
                Load::IndirectFromSP(_) => 20,
                Load::HLFromSPi8(_) => 12,
            },
            PUSH(_) => 16,
            POP(_) => 12,
            JP(_, JumpTarget::HL) => 4,
            JP(_, JumpTarget::D16(_)) => branch(taken, 16, 12),
            JR(..) => branch(taken, 12, 8),
            CALL(..) => branch(taken, 24, 12),
            RET(Always) => 16,
            RET(_) => branch(taken, 20, 8),
            RETI | RST(_) => 16,
            CCF | CPL | DAA | DI | EI | HALT | NOP | RLA | RLCA | RRA | RRCA | SCF | STOP
            | Illegal(_) => 4,
        }
    }
}

#[inline]
const fn branch(taken: bool, hit: u16, miss: u16) -> u16 {
    match taken {
        true => hit,
        false => miss,
    }
}

/// Bits 3-5 select the operation of the 8-bit arithmetic block.
#[inline]
fn arithmetic(code: u8, source: ByteSource) -> Instruction {
    match code & 0b111 {
        0 => ADD(source),
        1 => ADC(source),
        2 => SUB(source),
        3 => SBC(source),
        4 => AND(source),
        5 => XOR(source),
        6 => OR(source),
        _ => CP(source),
    }
}

/// Bits 4-5 select BC, DE, HL or SP.
#[inline]
fn word_register(opcode: u8) -> WordRegister {
    match (opcode >> 4) & 0b11 {
        0 => BC,
        1 => DE,
        2 => HL,
        _ => SP,
    }
}

/// Like `word_register`, but PUSH and POP address AF instead of SP.
#[inline]
fn stack_register(opcode: u8) -> WordRegister {
    match word_register(opcode) {
        SP => AF,
        reg => reg,
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NOP => write!(f, "NOP"),
            HALT => write!(f, "HALT"),
            STOP => write!(f, "STOP"),
            DAA => write!(f, "DAA"),
            CPL => write!(f, "CPL"),
            CCF => write!(f, "CCF"),
            SCF => write!(f, "SCF"),
            RLA => write!(f, "RLA"),
            RRA => write!(f, "RRA"),
            RLCA => write!(f, "RLCA"),
            RRCA => write!(f, "RRCA"),
            EI => write!(f, "EI"),
            DI => write!(f, "DI"),
            RST(code) => write!(f, "RST {code}"),
            RET(test) => write!(f, "RET {test}"),
            RETI => write!(f, "RETI"),
            JP(test, target) => write!(f, "JP {test}{target}"),
            JR(test, offset) => write!(f, "JR {test}{offset:+}"),
            CALL(test, address) => write!(f, "CALL {test}{address:#06x}"),
            ADDHL(source) => write!(f, "ADD HL, {source}"),
            ADDSP(value) => write!(f, "ADD SP, {value:+}"),
            ADD(source) => write!(f, "ADD A, {source}"),
            ADC(source) => write!(f, "ADC A, {source}"),
            SUB(source) => write!(f, "SUB A, {source}"),
            SBC(source) => write!(f, "SBC A, {source}"),
            AND(source) => write!(f, "AND A, {source}"),
            OR(source) => write!(f, "OR A, {source}"),
            XOR(source) => write!(f, "XOR A, {source}"),
            CP(source) => write!(f, "CP A, {source}"),
            INC(target) => write!(f, "INC {target}"),
            INC2(target) => write!(f, "INC {target}"),
            DEC(target) => write!(f, "DEC {target}"),
            DEC2(target) => write!(f, "DEC {target}"),
            LD(load) => write!(f, "LD {load}"),
            BIT(bit, target) => write!(f, "BIT {bit}, {target}"),
            RES(bit, target) => write!(f, "RES {bit}, {target}"),
            SET(bit, target) => write!(f, "SET {bit}, {target}"),
            PUSH(target) => write!(f, "PUSH {target}"),
            POP(target) => write!(f, "POP {target}"),
            RL(target) => write!(f, "RL {target}"),
            RLC(target) => write!(f, "RLC {target}"),
            RR(target) => write!(f, "RR {target}"),
            RRC(target) => write!(f, "RRC {target}"),
            SLA(target) => write!(f, "SLA {target}"),
            SRA(target) => write!(f, "SRA {target}"),
            SRL(target) => write!(f, "SRL {target}"),
            SWAP(target) => write!(f, "SWAP {target}"),
            Illegal(opcode) => write!(f, "ILLEGAL {opcode:#04x}"),
        }
    }
}
