use crate::gb::bus::InterruptRegister;
use crate::gb::cpu::instruction::Instruction;
use crate::gb::cpu::instruction::Instruction::*;
use crate::gb::cpu::ops::*;
use crate::gb::cpu::registers::{FlagsRegister, Registers};
use crate::gb::{Bus, utils};
use log::{trace, warn};

pub mod instruction;
mod interrupt;
pub mod ops;
pub mod registers;
#[cfg(test)]
mod tests;

/// Cost of a CPU step while halted or stopped.
const IDLE_CYCLES: u16 = 4;

/// IME (Interrupt Master Enable) state. The EI instruction enables the interrupt
/// after the next instruction has been executed which puts it on state `ImeState::Pending`.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub enum ImeState {
    Disabled,
    Pending,
    #[default]
    Enabled,
}

/// Implements the CPU for the GB (DMG-01),
/// the CPU is LR35902 which is a subset of i8080 & Z80.
#[derive(Default, Clone, Debug)]
pub struct CPU {
    pub r: Registers,  // CPU registers
    pub ime: ImeState, // Interrupt Master Enable
    pub is_halted: bool,
    pub is_stopped: bool,
}

impl CPU {
    /// Creates a CPU in the state the boot ROM hands over to the cartridge.
    pub fn new() -> Self {
        Self {
            r: Registers::post_boot(),
            ..Default::default()
        }
    }

    /// Makes one CPU step and returns the consumed cycles.
    /// Either an interrupt is dispatched, the CPU idles in HALT or STOP,
    /// or exactly one instruction is executed.
    pub fn step<T: Bus>(&mut self, bus: &mut T) -> u16 {
        if self.ime == ImeState::Pending {
            self.ime = ImeState::Enabled;
        } else if let Some(cycles) = interrupt::handle(self, bus) {
            return cycles;
        }

        if self.is_halted {
            return IDLE_CYCLES;
        }

        if self.is_stopped {
            if !bus.get_if().contains(InterruptRegister::JOYPAD) {
                return IDLE_CYCLES;
            }
            self.is_stopped = false;
        }

        let opcode = self.fetch(bus);
        self.decode_and_execute(opcode, bus)
    }

    /// Reads the byte at PC and advances PC.
    #[inline]
    pub fn fetch<T: Bus>(&mut self, bus: &mut T) -> u8 {
        let value = bus.read(self.r.pc);
        self.r.pc = self.r.pc.wrapping_add(1);
        value
    }

    /// Reads a little-endian word at PC and advances PC by two.
    #[inline]
    pub fn fetch_word<T: Bus>(&mut self, bus: &mut T) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    /// Decodes the given opcode, fetching its operands, executes it
    /// and returns the consumed cycles.
    pub fn decode_and_execute<T: Bus>(&mut self, opcode: u8, bus: &mut T) -> u16 {
        let address = self.r.pc.wrapping_sub(1);
        let instruction = Instruction::decode(opcode, self, bus);
        trace!(target: "cpu", "{address:#06x}: {instruction}");
        let taken = self.execute(instruction, bus);
        instruction.cycles(taken)
    }

    /// Executes the given instruction.
    /// Returns whether a conditional branch was taken, always true for everything else.
    fn execute<T: Bus>(&mut self, instruction: Instruction, bus: &mut T) -> bool {
        match instruction {
            CALL(test, address) => return self.handle_call(test, address, bus),
            JP(test, target) => return self.handle_jp(test, target),
            JR(test, offset) => return self.handle_jr(test, offset),
            RET(test) => return self.handle_ret(test, bus),
            ADD(source) => self.handle_add(source, bus),
            ADDHL(source) => self.handle_add_hl(source),
            ADDSP(value) => self.handle_add_sp(value),
            ADC(source) => self.handle_adc(source, bus),
            AND(source) => self.handle_and(source, bus),
            BIT(bit, target) => self.handle_bit(bit, target, bus),
            CCF => self.handle_ccf(),
            CP(source) => {
                self.subtract(source, false, bus);
            }
            CPL => self.handle_cpl(),
            DAA => self.handle_daa(),
            DI => self.ime = ImeState::Disabled,
            DEC(target) => self.handle_dec_byte(target, bus),
            DEC2(target) => {
                let value = target.read(self).wrapping_sub(1);
                target.write(self, value);
            }
            EI => self.handle_ei(),
            HALT => self.is_halted = true,
            INC(target) => self.handle_inc_byte(target, bus),
            INC2(target) => {
                let value = target.read(self).wrapping_add(1);
                target.write(self, value);
            }
            LD(load_type) => self.handle_ld(load_type, bus),
            NOP => {}
            OR(source) => self.handle_or(source, bus),
            RES(bit, target) => self.handle_res(bit, target, bus),
            RETI => self.handle_reti(bus),
            RL(target) => self.handle_rl(target, bus),
            RLA => self.handle_rla(),
            RLC(target) => self.handle_rlc(target, bus),
            RLCA => self.handle_rlca(),
            RR(target) => self.handle_rr(target, bus),
            RRA => self.handle_rra(),
            RRC(target) => self.handle_rrc(target, bus),
            RRCA => self.handle_rrca(),
            RST(code) => self.handle_rst(code, bus),
            SBC(source) => {
                self.r.a = self.subtract(source, true, bus);
            }
            SCF => self.handle_scf(),
            SET(bit, target) => self.handle_set(bit, target, bus),
            SLA(target) => self.handle_sla(target, bus),
            SRA(target) => self.handle_sra(target, bus),
            SRL(target) => self.handle_srl(target, bus),
            STOP => self.is_stopped = true,
            SUB(source) => {
                self.r.a = self.subtract(source, false, bus);
            }
            SWAP(target) => self.handle_swap(target, bus),
            PUSH(target) => {
                let word = target.read(self);
                self.push(word, bus);
            }
            POP(target) => {
                let word = self.pop(bus);
                target.write(self, word);
            }
            XOR(source) => self.handle_xor(source, bus),
            Illegal(opcode) => {
                warn!(
                    target: "cpu",
                    "Illegal opcode {opcode:#04x} at {:#06x}",
                    self.r.pc.wrapping_sub(1)
                );
            }
        }
        true
    }

    /// Push an u16 value onto the stack, the high byte ends up at the higher address.
    pub fn push<T: Bus>(&mut self, value: u16, bus: &mut T) {
        let [high, low] = value.to_be_bytes();
        self.r.sp = self.r.sp.wrapping_sub(1);
        bus.write(self.r.sp, high);
        self.r.sp = self.r.sp.wrapping_sub(1);
        bus.write(self.r.sp, low);
    }

    /// Pop an u16 value from the stack.
    pub fn pop<T: Bus>(&mut self, bus: &mut T) -> u16 {
        let low = bus.read(self.r.sp);
        self.r.sp = self.r.sp.wrapping_add(1);
        let high = bus.read(self.r.sp);
        self.r.sp = self.r.sp.wrapping_add(1);
        u16::from_le_bytes([low, high])
    }

    /// Subtracts the source and optionally the carry flag from A and updates the flags.
    /// Used by SUB, SBC and CP, returns the result without storing it.
    fn subtract<T: Bus>(&mut self, source: ByteSource, with_carry: bool, bus: &mut T) -> u8 {
        let value = source.read(self, bus);
        let borrow = with_carry && self.r.f.carry();
        let (result, overflow1) = self.r.a.overflowing_sub(value);
        let (result, overflow2) = result.overflowing_sub(borrow as u8);
        self.r.f.update(
            result == 0,
            true,
            utils::half_borrow_u8(self.r.a, value, borrow),
            overflow1 || overflow2,
        );
        result
    }

    /// Handles ADD A, n instructions
    fn handle_add<T: Bus>(&mut self, source: ByteSource, bus: &mut T) {
        let value = source.read(self, bus);
        let (result, overflow) = self.r.a.overflowing_add(value);
        self.r.f.update(
            result == 0,
            false,
            utils::half_carry_u8(self.r.a, value, false),
            overflow,
        );
        self.r.a = result;
    }

    /// Handles ADD HL, nn instructions
    fn handle_add_hl(&mut self, source: WordSource) {
        let value = source.read(self);
        let hl = self.r.get_hl();
        let (result, overflow) = hl.overflowing_add(value);

        let half_carry = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.set(FlagsRegister::HALF_CARRY, half_carry);
        self.r.f.set(FlagsRegister::CARRY, overflow);
        self.r.set_hl(result);
    }

    /// Adds a signed byte to SP, flags are computed from the low byte.
    /// Shared by ADD SP, i8 and LD HL, SP+i8.
    fn offset_sp(&mut self, value: i8) -> u16 {
        let sp = self.r.sp;
        let operand = value as u8;
        let half_carry = utils::half_carry_u8(sp as u8, operand, false);
        let carry = (sp as u8).overflowing_add(operand).1;
        self.r.f.update(false, false, half_carry, carry);
        sp.wrapping_add_signed(i16::from(value))
    }

    /// Handles ADD SP, i8 instruction
    fn handle_add_sp(&mut self, value: i8) {
        self.r.sp = self.offset_sp(value);
    }

    /// Handles ADC instructions
    fn handle_adc<T: Bus>(&mut self, source: ByteSource, bus: &mut T) {
        let value = source.read(self, bus);
        let carry = self.r.f.carry();
        let (result, overflow1) = self.r.a.overflowing_add(value);
        let (result, overflow2) = result.overflowing_add(carry as u8);
        self.r.f.update(
            result == 0,
            false,
            utils::half_carry_u8(self.r.a, value, carry),
            overflow1 || overflow2,
        );
        self.r.a = result;
    }

    /// Handles AND instructions
    #[inline]
    fn handle_and<T: Bus>(&mut self, source: ByteSource, bus: &mut T) {
        self.r.a &= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, true, false);
    }

    /// Handles BIT instructions, the carry flag is left untouched.
    fn handle_bit<T: Bus>(&mut self, bit: u8, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        self.r.f.set(FlagsRegister::ZERO, !utils::bit_at(value, bit));
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.insert(FlagsRegister::HALF_CARRY);
    }

    /// Handle CALL instructions
    fn handle_call<T: Bus>(&mut self, test: JumpCondition, address: u16, bus: &mut T) -> bool {
        if !test.resolve(self) {
            return false;
        }
        self.push(self.r.pc, bus);
        self.r.pc = address;
        true
    }

    /// Handle CCF instruction
    #[inline]
    fn handle_ccf(&mut self) {
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
        self.r.f.toggle(FlagsRegister::CARRY);
    }

    /// Handles CPL instruction
    #[inline]
    fn handle_cpl(&mut self) {
        self.r.a = !self.r.a;
        self.r.f.insert(FlagsRegister::SUBTRACTION);
        self.r.f.insert(FlagsRegister::HALF_CARRY);
    }

    /// Handles DAA instruction
    fn handle_daa(&mut self) {
        if self.r.f.contains(FlagsRegister::SUBTRACTION) {
            if self.r.f.contains(FlagsRegister::CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x60);
            }
            if self.r.f.contains(FlagsRegister::HALF_CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x06);
            }
        } else {
            if self.r.f.contains(FlagsRegister::CARRY) || self.r.a > 0x99 {
                self.r.a = self.r.a.wrapping_add(0x60);
                self.r.f.insert(FlagsRegister::CARRY);
            }
            if self.r.f.contains(FlagsRegister::HALF_CARRY) || (self.r.a & 0x0F) > 0x09 {
                self.r.a = self.r.a.wrapping_add(0x06);
            }
        }
        self.r.f.set(FlagsRegister::ZERO, self.r.a == 0);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
    }

    /// Handles DEC instructions for bytes, the carry flag is left untouched.
    fn handle_dec_byte<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value.wrapping_sub(1);
        target.write(self, bus, result);
        self.r.f.set(FlagsRegister::HALF_CARRY, value & 0x0F == 0);
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        self.r.f.insert(FlagsRegister::SUBTRACTION);
    }

    /// Handles EI instruction
    #[inline]
    fn handle_ei(&mut self) {
        if self.ime == ImeState::Disabled {
            self.ime = ImeState::Pending;
        }
    }

    /// Handles INC instructions for bytes, the carry flag is left untouched.
    fn handle_inc_byte<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value.wrapping_add(1);
        target.write(self, bus, result);
        self.r.f.set(FlagsRegister::HALF_CARRY, value & 0x0F == 0x0F);
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        self.r.f.remove(FlagsRegister::SUBTRACTION);
    }

    /// Handles JR instructions
    fn handle_jr(&mut self, test: JumpCondition, offset: i8) -> bool {
        if !test.resolve(self) {
            return false;
        }
        self.r.pc = self.r.pc.wrapping_add_signed(i16::from(offset));
        true
    }

    /// Handles JP instructions
    fn handle_jp(&mut self, test: JumpCondition, target: JumpTarget) -> bool {
        if !test.resolve(self) {
            return false;
        }
        self.r.pc = target.read(self);
        true
    }

    /// Handles LD instructions
    fn handle_ld<T: Bus>(&mut self, load_type: Load, bus: &mut T) {
        match load_type {
            Load::Byte(target, source) => {
                let value = source.read(self, bus);
                target.write(self, bus, value);
            }
            Load::Word(target, source) => {
                let value = source.read(self);
                target.write(self, value);
            }
            Load::HLIFromAInc => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_add(1));
            }
            Load::HLIFromADec => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_sub(1));
            }
            Load::HLIToAInc => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_add(1));
            }
            Load::HLIToADec => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_sub(1));
            }
            Load::IndirectFromSP(address) => {
                let [low, high] = self.r.sp.to_le_bytes();
                bus.write(address, low);
                bus.write(address.wrapping_add(1), high);
            }
            Load::HLFromSPi8(value) => {
                let result = self.offset_sp(value);
                self.r.set_hl(result);
            }
        }
    }

    /// Handles OR instructions
    #[inline]
    fn handle_or<T: Bus>(&mut self, source: ByteSource, bus: &mut T) {
        self.r.a |= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, false, false);
    }

    /// Handles RES instructions
    #[inline]
    fn handle_res<T: Bus>(&mut self, bit: u8, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, false));
    }

    /// Handles RET instructions
    fn handle_ret<T: Bus>(&mut self, test: JumpCondition, bus: &mut T) -> bool {
        if !test.resolve(self) {
            return false;
        }
        self.r.pc = self.pop(bus);
        true
    }

    /// Handles RETI instruction, IME is enabled immediately.
    #[inline]
    fn handle_reti<T: Bus>(&mut self, bus: &mut T) {
        self.ime = ImeState::Enabled;
        self.r.pc = self.pop(bus);
    }

    /// Handles RL instructions
    /// Rotate n left through Carry flag.
    fn handle_rl<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = self.rotate_left_through_carry(value);
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        target.write(self, bus, result);
    }

    /// Handles RLA instruction, unlike RL A the zero flag is always cleared.
    #[inline]
    fn handle_rla(&mut self) {
        self.r.a = self.rotate_left_through_carry(self.r.a);
    }

    fn rotate_left_through_carry(&mut self, value: u8) -> u8 {
        let carry = value & 0b1000_0000 != 0;
        let result = (value << 1) | self.r.f.carry() as u8;
        self.r.f.update(false, false, false, carry);
        result
    }

    /// Handles RLC instructions
    fn handle_rlc<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value.rotate_left(1);
        self.r.f.update(result == 0, false, false, value & 0b1000_0000 != 0);
        target.write(self, bus, result);
    }

    /// Handles RLCA instruction
    #[inline]
    fn handle_rlca(&mut self) {
        let carry = self.r.a & 0b1000_0000 != 0;
        self.r.a = self.r.a.rotate_left(1);
        self.r.f.update(false, false, false, carry);
    }

    /// Handles RR instructions
    fn handle_rr<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = self.rotate_right_through_carry(value);
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        target.write(self, bus, result);
    }

    /// Handles RRA instruction
    #[inline]
    fn handle_rra(&mut self) {
        self.r.a = self.rotate_right_through_carry(self.r.a);
    }

    fn rotate_right_through_carry(&mut self, value: u8) -> u8 {
        let carry = value & 0x01 != 0;
        let result = (value >> 1) | ((self.r.f.carry() as u8) << 7);
        self.r.f.update(false, false, false, carry);
        result
    }

    /// Handles RRC instructions
    fn handle_rrc<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value.rotate_right(1);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        target.write(self, bus, result);
    }

    /// Handles RRCA instruction
    #[inline]
    fn handle_rrca(&mut self) {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = self.r.a.rotate_right(1);
        self.r.f.update(false, false, false, carry);
    }

    /// Handles RST instructions
    #[inline]
    fn handle_rst<T: Bus>(&mut self, code: ResetCode, bus: &mut T) {
        self.push(self.r.pc, bus);
        self.r.pc = code as u16;
    }

    /// Handles SCF instruction
    #[inline]
    fn handle_scf(&mut self) {
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
        self.r.f.insert(FlagsRegister::CARRY);
    }

    /// Handles SET instructions
    #[inline]
    fn handle_set<T: Bus>(&mut self, bit: u8, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, true));
    }

    /// Handles SLA instructions
    fn handle_sla<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value << 1;
        self.r.f.update(result == 0, false, false, value & 0b1000_0000 != 0);
        target.write(self, bus, result);
    }

    /// Handles SRA instructions
    fn handle_sra<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = (value >> 1) | (value & 0b1000_0000);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        target.write(self, bus, result);
    }

    /// Handles SRL instructions
    fn handle_srl<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        let result = value >> 1;
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        target.write(self, bus, result);
    }

    /// Handles SWAP instructions
    #[inline]
    fn handle_swap<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) {
        let value = target.read(self, bus);
        self.r.f.update(value == 0, false, false, false);
        target.write(self, bus, value.rotate_right(4));
    }

    /// Handles XOR instructions
    #[inline]
    fn handle_xor<T: Bus>(&mut self, source: ByteSource, bus: &mut T) {
        self.r.a ^= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, false, false);
    }
}
