use crate::gb::bus::{InterruptRegister, MemoryBus};
use crate::gb::io::IoRegister;
use bitflags::bitflags;
use log::{error, trace};

/// DIV is incremented at 16384 Hz.
const DIVIDER_PERIOD: u32 = 256;

bitflags! {
    /// Represents the timer control register TAC at 0xFF07
    #[derive(Copy, Clone, PartialEq, Debug, Default)]
    pub struct TimerControl: u8 {
        const CLOCK_SELECT1 = 0b00000001;
        const CLOCK_SELECT2 = 0b00000010;
        const ENABLE        = 0b00000100;
    }
}

impl TimerControl {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.contains(TimerControl::ENABLE)
    }

    /// Number of cycles per TIMA increment.
    #[inline]
    pub fn period(&self) -> u32 {
        match self.bits() & 0b11 {
            0b00 => 1024, // 4096 Hz
            0b01 => 16,   // 262144 Hz
            0b10 => 64,   // 65536 Hz
            _ => 256,     // 16384 Hz
        }
    }
}

/// System timer, drives DIV and TIMA from the elapsed cycles.
#[derive(Default)]
pub struct Timer {
    divider_clock: u32,
    counter_clock: u32,
}

impl Timer {
    /// Advances DIV and, if enabled, TIMA by the given amount of cycles.
    pub fn step(&mut self, bus: &mut MemoryBus, cycles: u16) {
        self.divider_clock += u32::from(cycles);
        while self.divider_clock >= DIVIDER_PERIOD {
            self.divider_clock -= DIVIDER_PERIOD;
            if let Err(err) = bus.io.increment(IoRegister::DIV) {
                error!(target: "timer", "{err}");
            }
        }

        let control = TimerControl::from_bits_truncate(bus.io.read(IoRegister::TAC));
        if !control.is_enabled() {
            self.counter_clock = 0;
            return;
        }

        self.counter_clock += u32::from(cycles);
        let period = control.period();
        while self.counter_clock >= period {
            self.counter_clock -= period;
            let (counter, overflow) = bus.io.read(IoRegister::TIMA).overflowing_add(1);
            match overflow {
                true => {
                    trace!(target: "timer", "TIMA overflow");
                    bus.io.set(IoRegister::TIMA, bus.io.read(IoRegister::TMA));
                    bus.io.request_interrupt(InterruptRegister::TIMER);
                }
                false => bus.io.set(IoRegister::TIMA, counter),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gb::cartridge::Cartridge;
    use crate::gb::tests::rom_image;
    use std::sync::Arc;

    fn bus() -> MemoryBus {
        let rom = rom_image(0x00);
        MemoryBus::new(Cartridge::try_from(Arc::from(rom.into_boxed_slice())).unwrap())
    }

    #[test]
    fn test_divider() {
        let mut bus = bus();
        let mut timer = Timer::default();
        timer.step(&mut bus, 252);
        assert_eq!(bus.io.read(IoRegister::DIV), 0);
        timer.step(&mut bus, 4);
        assert_eq!(bus.io.read(IoRegister::DIV), 1);
        timer.step(&mut bus, 512);
        assert_eq!(bus.io.read(IoRegister::DIV), 3);
    }

    #[test]
    fn test_counter_disabled() {
        let mut bus = bus();
        let mut timer = Timer::default();
        bus.io.write(IoRegister::TAC, 0b0000_0001);
        timer.step(&mut bus, 1024);
        assert_eq!(bus.io.read(IoRegister::TIMA), 0);
    }

    #[test]
    fn test_counter_frequencies() {
        for (tac, period) in [(0b100, 1024), (0b101, 16), (0b110, 64), (0b111, 256)] {
            let mut bus = bus();
            let mut timer = Timer::default();
            bus.io.write(IoRegister::TAC, tac);
            timer.step(&mut bus, period - 4);
            assert_eq!(bus.io.read(IoRegister::TIMA), 0, "TAC {tac:#05b}");
            timer.step(&mut bus, 4);
            assert_eq!(bus.io.read(IoRegister::TIMA), 1, "TAC {tac:#05b}");
        }
    }

    #[test]
    fn test_counter_overflow() {
        let mut bus = bus();
        let mut timer = Timer::default();
        bus.io.write(IoRegister::TAC, 0b0000_0101);
        bus.io.write(IoRegister::TMA, 0xAB);
        bus.io.write(IoRegister::TIMA, 0xFF);

        timer.step(&mut bus, 8);
        assert!(!bus.io.interrupt_flag().contains(InterruptRegister::TIMER));
        timer.step(&mut bus, 8);
        assert_eq!(bus.io.read(IoRegister::TIMA), 0xAB);
        assert!(bus.io.interrupt_flag().contains(InterruptRegister::TIMER));
    }
}
