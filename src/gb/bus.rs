use crate::gb::cartridge::Cartridge;
use crate::gb::constants::*;
use crate::gb::io::IoRegisters;
use crate::gb::joypad::JoypadInput;
use crate::gb::{AddressSpace, Bus, GBError};
use bitflags::bitflags;
use log::{debug, error, trace, warn};

bitflags! {
    /// Represents interrupt registers IE at 0xFFFF and IF at 0xFF0F
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    pub struct InterruptRegister: u8 {
        const VBLANK = 0b00000001; // V-Blank Interrupt
        const STAT   = 0b00000010; // LCD STAT Interrupt
        const TIMER  = 0b00000100; // Timer Overflow Interrupt
        const SERIAL = 0b00001000; // Serial Transfer Completion Interrupt
        const JOYPAD = 0b00010000; // Joypad Input Interrupt
    }
}

impl InterruptRegister {
    /// Returns the interrupt with the highest priority.
    #[inline]
    pub fn highest_prio(&self) -> Option<InterruptRegister> {
        self.iter_names().map(|(_, irq)| irq).next()
    }
}

/// The 12 partitions of the address space, in ascending address order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Region {
    RomBank0,
    RomBankN,
    VideoRam,
    ExternalRam,
    WorkRam,
    EchoRam,
    SpriteTable,
    Unusable,
    Registers,
    UnusableIo,
    HighRam,
    InterruptEnable,
}

impl Region {
    pub const ALL: [Region; 12] = [
        Region::RomBank0,
        Region::RomBankN,
        Region::VideoRam,
        Region::ExternalRam,
        Region::WorkRam,
        Region::EchoRam,
        Region::SpriteTable,
        Region::Unusable,
        Region::Registers,
        Region::UnusableIo,
        Region::HighRam,
        Region::InterruptEnable,
    ];

    /// Classifies an address against `REGION_BOUNDARIES`.
    #[inline]
    pub fn of(address: u16) -> Region {
        let index = REGION_BOUNDARIES
            .partition_point(|&boundary| boundary <= address)
            .saturating_sub(1);
        Region::ALL[index]
    }
}

/// Owns all RAM regions, the cartridge and the peripheral register bank.
/// Every memory access of the CPU and the display controller goes through it.
pub struct MemoryBus {
    pub cartridge: Cartridge,
    pub io: IoRegisters,
    vram: [u8; VRAM_SIZE],
    wram: [u8; WRAM_SIZE],
    oam: [u8; OAM_SIZE],
    hram: [u8; HRAM_SIZE],
    fault: Option<GBError>,
}

impl MemoryBus {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            io: IoRegisters::default(),
            vram: [0u8; VRAM_SIZE],
            wram: [0u8; WRAM_SIZE],
            oam: [0u8; OAM_SIZE],
            hram: [0u8; HRAM_SIZE],
            fault: None,
        }
    }

    #[inline]
    pub fn vram(&self) -> &[u8; VRAM_SIZE] {
        &self.vram
    }

    #[inline]
    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    /// Forwards the button state to the joypad register.
    #[inline]
    pub fn handle_input(&mut self, input: JoypadInput) {
        self.io.handle_input(input);
    }

    /// Returns the first fatal fault raised since the last call, if any.
    #[inline]
    pub fn take_fault(&mut self) -> Option<GBError> {
        self.fault.take()
    }

    fn raise(&mut self, err: GBError) {
        error!(target: "bus", "{err}");
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    /// Copies 160 bytes from `source << 8` into the sprite attribute table.
    fn dma_transfer(&mut self, source: u8) {
        let begin = u16::from(source) << 8;
        debug!(target: "bus", "DMA transfer from {begin:#06x}");
        for offset in 0..DMA_TRANSFER_SIZE {
            let value = self.read(begin.wrapping_add(offset));
            self.write(OAM_BEGIN + offset, value);
        }
    }

    fn trace_vram(address: u16, value: u8) {
        match address {
            TILE_DATA_BEGIN..=TILE_DATA_END => {
                trace!(target: "bus", "tile data {address:#06x} <- {value:#04x}")
            }
            TILE_MAP0_BEGIN..=TILE_MAP0_END => {
                trace!(target: "bus", "tile map 0 {address:#06x} <- {value:#04x}")
            }
            _ => trace!(target: "bus", "tile map 1 {address:#06x} <- {value:#04x}"),
        }
    }
}

impl AddressSpace for MemoryBus {
    fn write(&mut self, address: u16, value: u8) {
        match Region::of(address) {
            Region::RomBank0 | Region::RomBankN => match self.cartridge.is_bank_switching() {
                true => self.cartridge.write(address, value),
                false => {
                    warn!(target: "bus", "ignored write to ROM {address:#06x} <- {value:#04x}")
                }
            },
            Region::VideoRam => {
                MemoryBus::trace_vram(address, value);
                self.vram[(address - VRAM_BEGIN) as usize] = value;
            }
            Region::ExternalRam => match self.cartridge.has_ram() {
                true => self.cartridge.write(address, value),
                false => warn!(target: "bus", "write to absent external RAM {address:#06x}"),
            },
            Region::WorkRam => self.wram[(address - WRAM_BEGIN) as usize] = value,
            Region::EchoRam => self.wram[(address - ERAM_BEGIN) as usize] = value,
            Region::SpriteTable => {
                let offset = address - OAM_BEGIN;
                trace!(
                    target: "bus",
                    "sprite {} byte {} <- {value:#04x}",
                    offset / OAM_ENTRY_SIZE,
                    offset % OAM_ENTRY_SIZE
                );
                self.oam[offset as usize] = value;
            }
            Region::Unusable | Region::UnusableIo => {
                warn!(target: "bus", "write to unusable address {address:#06x}")
            }
            Region::Registers | Region::InterruptEnable => {
                if address == PPU_DMA {
                    self.dma_transfer(value);
                }
                if let Err(err) = self.io.write_address(address, value) {
                    self.raise(err);
                }
            }
            Region::HighRam => self.hram[(address - HRAM_BEGIN) as usize] = value,
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match Region::of(address) {
            Region::RomBank0 | Region::RomBankN => self.cartridge.read(address),
            Region::VideoRam => self.vram[(address - VRAM_BEGIN) as usize],
            Region::ExternalRam => match self.cartridge.has_ram() {
                true => self.cartridge.read(address),
                false => {
                    warn!(target: "bus", "read from absent external RAM {address:#06x}");
                    0
                }
            },
            Region::WorkRam => self.wram[(address - WRAM_BEGIN) as usize],
            Region::EchoRam => self.wram[(address - ERAM_BEGIN) as usize],
            Region::SpriteTable => self.oam[(address - OAM_BEGIN) as usize],
            Region::Unusable | Region::UnusableIo => {
                warn!(target: "bus", "read from unusable address {address:#06x}");
                0
            }
            Region::Registers | Region::InterruptEnable => self.io.read_address(address),
            Region::HighRam => self.hram[(address - HRAM_BEGIN) as usize],
        }
    }
}

impl Bus for MemoryBus {
    #[cfg(test)]
    #[inline(always)]
    fn set_ie(&mut self, r: InterruptRegister) {
        self.io.set_interrupt_enable(r);
    }

    #[inline(always)]
    fn get_ie(&self) -> InterruptRegister {
        self.io.interrupt_enable()
    }

    #[inline(always)]
    fn set_if(&mut self, r: InterruptRegister) {
        self.io.set_interrupt_flag(r);
    }

    #[inline(always)]
    fn get_if(&self) -> InterruptRegister {
        self.io.interrupt_flag()
    }
}
