use crate::gb::Bus;
use crate::gb::bus::InterruptRegister;
use crate::gb::cpu::{CPU, ImeState};
use log::debug;

/// Cycles needed to dispatch an interrupt, including the push of PC.
pub const INTERRUPT_CYCLES: u16 = 20;

/// Interrupt sources and their handler addresses, highest priority first.
const VECTORS: [(InterruptRegister, u16); 5] = [
    (InterruptRegister::VBLANK, 0x40),
    (InterruptRegister::STAT, 0x48),
    (InterruptRegister::TIMER, 0x50),
    (InterruptRegister::SERIAL, 0x58),
    (InterruptRegister::JOYPAD, 0x60),
];

/// Handles pending interrupt requests.
/// A pending request always wakes the CPU from HALT, a pending joypad request also from STOP.
/// If IME is enabled the request with the highest priority is serviced and the consumed
/// cycles are returned.
pub fn handle<T: Bus>(cpu: &mut CPU, bus: &mut T) -> Option<u16> {
    if !bus.has_irq() {
        return None;
    }

    cpu.is_halted = false;
    if bus.get_if().contains(InterruptRegister::JOYPAD) {
        cpu.is_stopped = false;
    }

    if cpu.ime != ImeState::Enabled {
        return None;
    }

    let requested = bus.get_if();
    let irq = (bus.get_ie() & requested).highest_prio()?;
    let (_, address) = VECTORS.into_iter().find(|(source, _)| *source == irq)?;
    debug!(target: "cpu", "Servicing interrupt {irq:?} at {address:#06x}");

    bus.set_if(requested.difference(irq));
    cpu.ime = ImeState::Disabled;
    cpu.push(cpu.r.pc, bus);
    cpu.r.pc = address;
    Some(INTERRUPT_CYCLES)
}
