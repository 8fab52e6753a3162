use crate::gb::bus::InterruptRegister;
use crate::gb::cartridge::Cartridge;
use crate::gb::io::IoRegister;
use crate::gb::{
    AddressSpace, Bus, Emulator, EmulatorConfig, EmulatorMessage, FrontendMessage, GBError,
};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

/// Builds a zeroed 32 KiB ROM image with the given cartridge type.
pub fn rom_image(cart_type: u8) -> Vec<u8> {
    let mut rom = vec![0x00; 0x8000];
    rom[0x0147] = cart_type;
    rom
}

/// Represents a mock for `MemoryBus`: 64 KiB of flat memory plus IE and IF.
pub struct MockBus {
    interrupt_enable: InterruptRegister,
    interrupt_flags: InterruptRegister,
    data: Vec<u8>,
}

impl MockBus {
    /// The given bytes are placed at address 0, the rest of the address space is zeroed.
    pub fn new(mut data: Vec<u8>) -> Self {
        data.resize(0x10000, 0x00);
        Self {
            interrupt_enable: InterruptRegister::empty(),
            interrupt_flags: InterruptRegister::empty(),
            data,
        }
    }
}

impl AddressSpace for MockBus {
    fn write(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    fn read(&mut self, address: u16) -> u8 {
        self.data[address as usize]
    }
}

impl Bus for MockBus {
    fn set_ie(&mut self, r: InterruptRegister) {
        self.interrupt_enable = r;
    }

    fn get_ie(&self) -> InterruptRegister {
        self.interrupt_enable
    }

    fn set_if(&mut self, r: InterruptRegister) {
        self.interrupt_flags = r;
    }

    fn get_if(&self) -> InterruptRegister {
        self.interrupt_flags
    }
}

/// Creates a headless emulator running `program` from the cartridge entry point at 0x0100.
fn emulator_with(
    program: &[u8],
) -> (Emulator, Sender<FrontendMessage>, Receiver<EmulatorMessage>) {
    let mut rom = rom_image(0x00);
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    let cartridge = Cartridge::try_from(Arc::from(rom.into_boxed_slice())).unwrap();
    let (frame_sender, frame_receiver) = mpsc::channel();
    let (input_sender, input_receiver) = mpsc::channel();
    let config = EmulatorConfig {
        headless: true,
        fps_limit: false,
        ..Default::default()
    };
    let emulator = Emulator::new(frame_sender, input_receiver, cartridge, &config);
    (emulator, input_sender, frame_receiver)
}

#[test]
fn test_emulator_runs_program() {
    // LD A, 0x42; LD (0xC000), A; JR -2
    let (mut emulator, _input, _) = emulator_with(&[0x3e, 0x42, 0xea, 0x00, 0xc0, 0x18, 0xfe]);
    assert_eq!(emulator.step().unwrap(), 8);
    assert_eq!(emulator.step().unwrap(), 16);
    assert_eq!(emulator.bus.read(0xC000), 0x42);
    assert_eq!(emulator.step().unwrap(), 12);
    assert_eq!(emulator.cpu.r.pc, 0x0105);
}

#[test]
fn test_emulator_advances_timer_and_display() {
    // JR -2
    let (mut emulator, _input, _) = emulator_with(&[0x18, 0xfe]);
    let mut cycles = 0u32;
    while cycles < 456 {
        cycles += u32::from(emulator.step().unwrap());
    }
    assert_eq!(emulator.bus.io.read(IoRegister::DIV), 1, "DIV ticks every 256 cycles");
    assert_eq!(emulator.bus.io.read(IoRegister::LY), 1, "One scanline takes 456 cycles");

    while cycles < 70224 {
        cycles += u32::from(emulator.step().unwrap());
    }
    assert_eq!(emulator.ppu.frames(), 1);
    assert!(emulator.bus.get_if().contains(InterruptRegister::VBLANK));
}

#[test]
fn test_emulator_services_vblank() {
    // LD A, 0x01; LDH (0xFF), A; JR -2
    let (mut emulator, _input, _) = emulator_with(&[0x3e, 0x01, 0xe0, 0xff, 0x18, 0xfe]);

    let mut serviced = false;
    for _ in 0..20_000 {
        emulator.step().unwrap();
        if emulator.cpu.r.pc == 0x0040 {
            serviced = true;
            break;
        }
    }
    assert!(serviced, "V-Blank handler should be reached within a frame");
    assert!(!emulator.bus.get_if().contains(InterruptRegister::VBLANK));
    assert_eq!(emulator.cpu.r.sp, 0xFFFC, "Return address is on the stack");
}

#[test]
fn test_emulator_unmapped_register_is_fatal() {
    // LD A, 0x01; LDH (0x03), A
    let (mut emulator, _input, _) = emulator_with(&[0x3e, 0x01, 0xe0, 0x03]);
    emulator.step().unwrap();
    assert!(matches!(emulator.step(), Err(GBError::UnmappedRegister(0xFF03))));
}

#[test]
fn test_emulator_reports_fatal_fault() {
    // LD A, 0x01; LDH (0x03), A
    let (mut emulator, _input, frontend) = emulator_with(&[0x3e, 0x01, 0xe0, 0x03]);
    assert!(matches!(emulator.run(), Err(GBError::UnmappedRegister(0xFF03))));
    match frontend.try_recv() {
        Ok(EmulatorMessage::Aborted(reason)) => {
            assert_eq!(reason, "write to unmapped register address 0xff03")
        }
        _ => panic!("The frontend should be told about the abort"),
    }
}

#[test]
fn test_emulator_stops_on_message() {
    let (mut emulator, input, _) = emulator_with(&[0x18, 0xfe]);
    input.send(FrontendMessage::Stop).unwrap();
    assert!(emulator.run().is_ok());
}

#[test]
fn test_emulator_stops_on_disconnect() {
    let (mut emulator, input, _) = emulator_with(&[0x18, 0xfe]);
    drop(input);
    assert!(emulator.run().is_ok());
}

#[test]
fn test_emulator_forwards_input() {
    // LD A, 0x10; LDH (0x00), A; JR -2
    let (mut emulator, input, _) = emulator_with(&[0x3e, 0x10, 0xe0, 0x00, 0x18, 0xfe]);
    emulator.step().unwrap();
    emulator.step().unwrap();
    input
        .send(FrontendMessage::Input(crate::gb::joypad::JoypadInput {
            start: true,
            ..Default::default()
        }))
        .unwrap();
    emulator.handle_message();
    assert_eq!(emulator.bus.read(0xFF00), 0xD7);
    assert!(emulator.bus.get_if().contains(InterruptRegister::JOYPAD));
}

#[test]
fn test_interrupt_register_bits() {
    assert_eq!(InterruptRegister::all().bits(), 0b0001_1111);
    let flags = InterruptRegister::from_bits_retain(0b1110_0100);
    assert!(flags.contains(InterruptRegister::TIMER));
    assert!(!flags.contains(InterruptRegister::VBLANK));
    assert_eq!(flags.highest_prio(), Some(InterruptRegister::TIMER));
}
