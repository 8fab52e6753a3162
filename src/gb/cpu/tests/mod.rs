mod interrupt;

use crate::gb::cpu::registers::FlagsRegister;
use crate::gb::cpu::{CPU, ImeState};

pub fn assert_flags(r: FlagsRegister, zero: bool, negative: bool, half_carry: bool, carry: bool) {
    assert_eq!(
        r.contains(FlagsRegister::ZERO),
        zero,
        "Expected zero flag to be {}, but it was {}",
        zero,
        r.contains(FlagsRegister::ZERO)
    );
    assert_eq!(
        r.contains(FlagsRegister::SUBTRACTION),
        negative,
        "Expected negative flag to be {}, but it was {}",
        negative,
        r.contains(FlagsRegister::SUBTRACTION)
    );
    assert_eq!(
        r.contains(FlagsRegister::HALF_CARRY),
        half_carry,
        "Expected half carry flag to be {}, but it was {}",
        half_carry,
        r.contains(FlagsRegister::HALF_CARRY)
    );
    assert_eq!(
        r.contains(FlagsRegister::CARRY),
        carry,
        "Expected carry flag to be {}, but it was {}",
        carry,
        r.contains(FlagsRegister::CARRY)
    );
}

#[test]
fn test_af_register() {
    let mut cpu = CPU::default();
    cpu.r.set_af(0b1101_1111_1111_1111);
    assert_eq!(cpu.r.a, 0b1101_1111);
    assert_eq!(cpu.r.f.bits(), 0b1111_0000, "Lower nibble of F is always 0");
    assert_eq!(cpu.r.get_af(), 0b1101_1111_1111_0000);
}

#[test]
fn test_paired_registers() {
    let mut cpu = CPU::default();
    cpu.r.set_bc(0x1234);
    cpu.r.set_de(0x5678);
    cpu.r.set_hl(0x9ABC);
    assert_eq!((cpu.r.b, cpu.r.c), (0x12, 0x34));
    assert_eq!((cpu.r.d, cpu.r.e), (0x56, 0x78));
    assert_eq!((cpu.r.h, cpu.r.l), (0x9A, 0xBC));
    assert_eq!(cpu.r.get_bc(), 0x1234);
    assert_eq!(cpu.r.get_de(), 0x5678);
    assert_eq!(cpu.r.get_hl(), 0x9ABC);
}

#[test]
fn test_post_boot_state() {
    let cpu = CPU::new();
    assert_eq!(cpu.r.get_af(), 0x01B0, "AF is invalid");
    assert_eq!(cpu.r.get_bc(), 0x0013, "BC is invalid");
    assert_eq!(cpu.r.get_de(), 0x00D8, "DE is invalid");
    assert_eq!(cpu.r.get_hl(), 0x014D, "HL is invalid");
    assert_eq!(cpu.r.sp, 0xFFFE, "SP is invalid");
    assert_eq!(cpu.r.pc, 0x0100, "PC is invalid");
    assert_eq!(cpu.ime, ImeState::Enabled);
    assert!(!cpu.is_halted);
}
