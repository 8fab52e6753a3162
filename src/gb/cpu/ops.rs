use crate::gb::AddressSpace;
use crate::gb::cpu::CPU;
use crate::gb::cpu::registers::FlagsRegister;
use std::fmt;
use std::fmt::Formatter;

/// Base address of the LDH and (C) addressing modes.
const HIGH_PAGE: u16 = 0xFF00;

/// Defines an operation on the 8-bit registers of the CPU.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Register {
    /// Reads value from the register.
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u8 {
        match self {
            Register::A => cpu.r.a,
            Register::B => cpu.r.b,
            Register::C => cpu.r.c,
            Register::D => cpu.r.d,
            Register::E => cpu.r.e,
            Register::H => cpu.r.h,
            Register::L => cpu.r.l,
        }
    }

    /// Writes value to the register.
    #[inline]
    pub fn write(&self, cpu: &mut CPU, value: u8) {
        match self {
            Register::A => cpu.r.a = value,
            Register::B => cpu.r.b = value,
            Register::C => cpu.r.c = value,
            Register::D => cpu.r.d = value,
            Register::E => cpu.r.e = value,
            Register::H => cpu.r.h = value,
            Register::L => cpu.r.l = value,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::E => "E",
            Register::H => "H",
            Register::L => "L",
        };
        f.write_str(ident)
    }
}

/// Defines an operation on word registers of the CPU.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WordRegister {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl WordRegister {
    /// Read from register.
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            WordRegister::AF => cpu.r.get_af(),
            WordRegister::BC => cpu.r.get_bc(),
            WordRegister::DE => cpu.r.get_de(),
            WordRegister::HL => cpu.r.get_hl(),
            WordRegister::SP => cpu.r.sp,
        }
    }

    /// Write value to register
    #[inline]
    pub fn write(&self, cpu: &mut CPU, value: u16) {
        match self {
            WordRegister::AF => cpu.r.set_af(value),
            WordRegister::BC => cpu.r.set_bc(value),
            WordRegister::DE => cpu.r.set_de(value),
            WordRegister::HL => cpu.r.set_hl(value),
            WordRegister::SP => cpu.r.sp = value,
        }
    }
}

impl fmt::Display for WordRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            WordRegister::AF => "AF",
            WordRegister::BC => "BC",
            WordRegister::DE => "DE",
            WordRegister::HL => "HL",
            WordRegister::SP => "SP",
        };
        f.write_str(ident)
    }
}

/// Defines a location a byte can be read from and written to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteTarget {
    R(Register),
    I(ByteRef),
}

impl ByteTarget {
    /// (HL), the only memory operand reachable from the 3-bit register encoding.
    pub const HLI: ByteTarget = ByteTarget::I(ByteRef::R(WordRegister::HL));

    /// Decodes the 3-bit operand field used by most opcodes:
    /// B, C, D, E, H, L, (HL), A.
    #[inline]
    pub fn from_code(code: u8) -> ByteTarget {
        match code & 0b111 {
            0 => ByteTarget::R(Register::B),
            1 => ByteTarget::R(Register::C),
            2 => ByteTarget::R(Register::D),
            3 => ByteTarget::R(Register::E),
            4 => ByteTarget::R(Register::H),
            5 => ByteTarget::R(Register::L),
            6 => ByteTarget::HLI,
            _ => ByteTarget::R(Register::A),
        }
    }

    /// Reads the referring value from the CPU or memory
    #[inline]
    pub fn read<T>(&self, cpu: &CPU, bus: &mut T) -> u8
    where
        T: AddressSpace,
    {
        match self {
            ByteTarget::R(reg) => reg.read(cpu),
            ByteTarget::I(indirect) => bus.read(indirect.resolve(cpu)),
        }
    }

    /// Writes to the referring register or memory location
    #[inline]
    pub fn write<T>(&self, cpu: &mut CPU, bus: &mut T, value: u8)
    where
        T: AddressSpace,
    {
        match self {
            ByteTarget::R(reg) => reg.write(cpu, value),
            ByteTarget::I(indirect) => bus.write(indirect.resolve(cpu), value),
        }
    }

    /// Extra cycles needed to access the operand.
    #[inline]
    pub fn access_cycles(&self) -> u16 {
        match self {
            ByteTarget::R(_) => 0,
            ByteTarget::I(indirect) => indirect.access_cycles(),
        }
    }
}

impl From<ByteTarget> for ByteSource {
    fn from(target: ByteTarget) -> Self {
        match target {
            ByteTarget::R(reg) => ByteSource::R(reg),
            ByteTarget::I(indirect) => ByteSource::I(indirect),
        }
    }
}

impl fmt::Display for ByteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteTarget::R(reg) => write!(f, "{reg}"),
            ByteTarget::I(indirect) => write!(f, "{indirect}"),
        }
    }
}

/// Defines a source which yields an address that can be used to read or write a byte value
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteRef {
    R(WordRegister), // value refers to memory at address from one of the paired registers
    D16(u16),        // value refers to memory at address from the next 16 bits
    C,               // value refers to memory at address from C register | 0xFF00
    D8(u8),          // value refers to memory at the address from the next 8 bits | 0xFF00
}

impl ByteRef {
    /// Resolves and returns the referring address.
    #[inline]
    pub fn resolve(&self, cpu: &CPU) -> u16 {
        match self {
            ByteRef::R(reg) => reg.read(cpu),
            ByteRef::D16(address) => *address,
            ByteRef::C => HIGH_PAGE | u16::from(cpu.r.c),
            ByteRef::D8(offset) => HIGH_PAGE | u16::from(*offset),
        }
    }

    /// Cycles for the memory access plus fetching the address operand.
    #[inline]
    pub fn access_cycles(&self) -> u16 {
        match self {
            ByteRef::R(_) | ByteRef::C => 4,
            ByteRef::D8(_) => 8,
            ByteRef::D16(_) => 12,
        }
    }
}

impl fmt::Display for ByteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteRef::R(reg) => write!(f, "({reg})"),
            ByteRef::D16(address) => write!(f, "({address:#06x})"),
            ByteRef::C => f.write_str("(C)"),
            ByteRef::D8(offset) => write!(f, "({:#06x})", HIGH_PAGE | u16::from(*offset)),
        }
    }
}

/// Defines a source we can read from to get a byte value.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteSource {
    R(Register),
    I(ByteRef),
    D8(u8), // value comes from the next 8 bits
}

impl ByteSource {
    /// Read byte from the CPU or memory.
    #[inline]
    pub fn read<T>(&self, cpu: &CPU, bus: &mut T) -> u8
    where
        T: AddressSpace,
    {
        match self {
            ByteSource::R(reg) => reg.read(cpu),
            ByteSource::D8(value) => *value,
            ByteSource::I(indirect) => bus.read(indirect.resolve(cpu)),
        }
    }

    /// Extra cycles needed to fetch the operand.
    #[inline]
    pub fn access_cycles(&self) -> u16 {
        match self {
            ByteSource::R(_) => 0,
            ByteSource::D8(_) => 4,
            ByteSource::I(indirect) => indirect.access_cycles(),
        }
    }
}

impl fmt::Display for ByteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::R(reg) => write!(f, "{reg}"),
            ByteSource::D8(value) => write!(f, "{value:#04x}"),
            ByteSource::I(indirect) => write!(f, "{indirect}"),
        }
    }
}

/// Defines the source of a word value
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WordSource {
    R(WordRegister),
    D16(u16), // value comes from the next 16 bits
}

impl WordSource {
    /// Resolves the referring value
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            WordSource::R(reg) => reg.read(cpu),
            WordSource::D16(word) => *word,
        }
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordSource::R(reg) => write!(f, "{reg}"),
            WordSource::D16(word) => write!(f, "{word:#06x}"),
        }
    }
}

/// Defines the possible load operations
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Load {
    Byte(ByteTarget, ByteSource),
    Word(WordRegister, WordSource),
    // LD (HL+), A
    HLIFromAInc,
    // LD (HL-), A
    HLIFromADec,
    // LD A, (HL+)
    HLIToAInc,
    // LD A, (HL-)
    HLIToADec,
    // Stores SP little-endian at the given address.
    IndirectFromSP(u16),
    // Adds the signed operand to SP and stores the result in HL.
    HLFromSPi8(i8),
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Load::Byte(target, source) => write!(f, "{target}, {source}"),
            Load::Word(target, source) => write!(f, "{target}, {source}"),
            Load::HLIFromAInc => f.write_str("(HL+), A"),
            Load::HLIFromADec => f.write_str("(HL-), A"),
            Load::HLIToAInc => f.write_str("A, (HL+)"),
            Load::HLIToADec => f.write_str("A, (HL-)"),
            Load::IndirectFromSP(address) => write!(f, "({address:#06x}), SP"),
            Load::HLFromSPi8(value) => write!(f, "HL, SP{value:+}"),
        }
    }
}

/// Possible conditions for conditional instructions like JP, JR, CALL and RET
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum JumpCondition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
    Always,
}

impl JumpCondition {
    /// Decodes the 2-bit condition field of conditional opcodes.
    #[inline]
    pub fn from_code(code: u8) -> JumpCondition {
        match code & 0b11 {
            0 => JumpCondition::NotZero,
            1 => JumpCondition::Zero,
            2 => JumpCondition::NotCarry,
            _ => JumpCondition::Carry,
        }
    }

    /// Resolves whether the condition is met
    #[inline]
    pub fn resolve(&self, cpu: &CPU) -> bool {
        match self {
            JumpCondition::NotZero => !cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::Zero => cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::NotCarry => !cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Carry => cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Always => true,
        }
    }
}

impl fmt::Display for JumpCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            JumpCondition::NotZero => "NZ ",
            JumpCondition::Zero => "Z ",
            JumpCondition::NotCarry => "NC ",
            JumpCondition::Carry => "C ",
            JumpCondition::Always => "",
        };
        f.write_str(ident)
    }
}

/// Defines a target address we can jump to
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum JumpTarget {
    D16(u16), // value comes from the next 16 bits
    HL,
}

impl JumpTarget {
    /// Resolves and returns the referring target address
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            JumpTarget::D16(word) => *word,
            JumpTarget::HL => cpu.r.get_hl(),
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::D16(word) => write!(f, "{word:#06x}"),
            JumpTarget::HL => f.write_str("HL"),
        }
    }
}

/// Fixed call targets of the RST instructions.
#[repr(u16)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ResetCode {
    RST00 = 0x00,
    RST08 = 0x08,
    RST10 = 0x10,
    RST18 = 0x18,
    RST20 = 0x20,
    RST28 = 0x28,
    RST30 = 0x30,
    RST38 = 0x38,
}

impl ResetCode {
    /// Bits 3-5 of an RST opcode select the vector.
    #[inline]
    pub fn from_opcode(opcode: u8) -> ResetCode {
        match (opcode >> 3) & 0b111 {
            0 => ResetCode::RST00,
            1 => ResetCode::RST08,
            2 => ResetCode::RST10,
            3 => ResetCode::RST18,
            4 => ResetCode::RST20,
            5 => ResetCode::RST28,
            6 => ResetCode::RST30,
            _ => ResetCode::RST38,
        }
    }
}

impl fmt::Display for ResetCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u16)
    }
}
