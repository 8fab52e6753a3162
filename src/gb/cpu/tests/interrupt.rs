use crate::gb::bus::InterruptRegister;
use crate::gb::cpu::interrupt::{self, INTERRUPT_CYCLES};
use crate::gb::cpu::{CPU, ImeState};
use crate::gb::tests::MockBus;
use crate::gb::{AddressSpace, Bus};

#[test]
fn test_no_request() {
    let mut cpu = CPU::default();
    let mut bus = MockBus::new(vec![]);
    bus.set_ie(InterruptRegister::all());
    assert_eq!(interrupt::handle(&mut cpu, &mut bus), None);

    bus.set_ie(InterruptRegister::TIMER);
    bus.set_if(InterruptRegister::VBLANK);
    assert_eq!(
        interrupt::handle(&mut cpu, &mut bus),
        None,
        "Requests have to be enabled in IE"
    );
}

#[test]
fn test_wake_with_ime_disabled() {
    let mut cpu = CPU {
        is_halted: true,
        ime: ImeState::Disabled,
        ..Default::default()
    };
    let mut bus = MockBus::new(vec![0x00]);
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.r.pc, 1, "Execution continues after HALT");
    assert_eq!(cpu.r.sp, 0, "Nothing is pushed");
    assert!(!cpu.is_halted);
    assert_eq!(bus.get_if(), InterruptRegister::VBLANK, "IF is left untouched");
}

#[test]
fn test_dispatch_vectors() {
    let vectors = [
        (InterruptRegister::VBLANK, 0x0040),
        (InterruptRegister::STAT, 0x0048),
        (InterruptRegister::TIMER, 0x0050),
        (InterruptRegister::SERIAL, 0x0058),
        (InterruptRegister::JOYPAD, 0x0060),
    ];

    for (irq, address) in vectors {
        let mut cpu = CPU::default();
        cpu.r.sp = 0xD000;
        cpu.r.pc = 0x1234;
        cpu.is_halted = true;
        let mut bus = MockBus::new(vec![]);
        bus.set_ie(irq);
        bus.set_if(irq);

        assert_eq!(cpu.step(&mut bus), INTERRUPT_CYCLES);
        assert_eq!(cpu.r.pc, address, "PC should be set to {address:#06x}");
        assert_eq!(bus.get_if(), InterruptRegister::empty(), "IF bit is acknowledged");
        assert_eq!(bus.get_ie(), irq, "IE remains unchanged");
        assert_eq!(cpu.ime, ImeState::Disabled);
        assert!(!cpu.is_halted);
        assert_eq!(bus.read(0xCFFF), 0x12, "High byte of the old PC");
        assert_eq!(bus.read(0xCFFE), 0x34, "Low byte of the old PC");
        assert_eq!(cpu.r.sp, 0xCFFE);
    }
}

#[test]
fn test_priority() {
    let mut cpu = CPU::default();
    cpu.r.sp = 0xD000;
    let mut bus = MockBus::new(vec![]);
    bus.set_ie(InterruptRegister::all());
    bus.set_if(InterruptRegister::TIMER | InterruptRegister::JOYPAD | InterruptRegister::STAT);

    assert_eq!(interrupt::handle(&mut cpu, &mut bus), Some(INTERRUPT_CYCLES));
    assert_eq!(cpu.r.pc, 0x0048);
    assert_eq!(
        bus.get_if(),
        InterruptRegister::TIMER | InterruptRegister::JOYPAD,
        "Only the serviced request is cleared"
    );

    cpu.ime = ImeState::Enabled;
    interrupt::handle(&mut cpu, &mut bus);
    assert_eq!(cpu.r.pc, 0x0050);
    cpu.ime = ImeState::Enabled;
    interrupt::handle(&mut cpu, &mut bus);
    assert_eq!(cpu.r.pc, 0x0060);
    assert_eq!(bus.get_if(), InterruptRegister::empty());
}

#[test]
fn test_pending_ime_defers_dispatch() {
    let mut cpu = CPU {
        ime: ImeState::Pending,
        ..Default::default()
    };
    let mut bus = MockBus::new(vec![0x00]);
    bus.set_ie(InterruptRegister::SERIAL);
    bus.set_if(InterruptRegister::SERIAL);
    assert_eq!(interrupt::handle(&mut cpu, &mut bus), None);
    assert_eq!(cpu.r.pc, 0);
}

#[test]
fn test_highest_prio() {
    let mut flags = InterruptRegister::all();
    let expected = [
        InterruptRegister::VBLANK,
        InterruptRegister::STAT,
        InterruptRegister::TIMER,
        InterruptRegister::SERIAL,
        InterruptRegister::JOYPAD,
    ];
    for irq in expected {
        assert_eq!(flags.highest_prio(), Some(irq));
        flags.remove(irq);
    }
    assert_eq!(flags.highest_prio(), None);
    assert_eq!(
        InterruptRegister::from_bits_retain(0b1110_0000).highest_prio(),
        None,
        "Unused upper bits are not interrupt sources"
    );
}
