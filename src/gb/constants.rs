/// This area of memory always contains the first bank from the cartridge.
pub const ROM_LOW_BANK_BEGIN: u16 = 0x0000;
pub const ROM_LOW_BANK_END: u16 = 0x3FFF;

/// This area of memory contains a switchable bank from the cartridge (01..nn).
/// Writing to this area of memory changes the currently selected bank.
pub const ROM_HIGH_BANK_BEGIN: u16 = 0x4000;
pub const ROM_HIGH_BANK_END: u16 = 0x7FFF;

/// Video RAM holds the tile data and the two background tile maps.
pub const VRAM_BEGIN: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
pub const VRAM_SIZE: usize = (VRAM_END - VRAM_BEGIN + 1) as usize;

/// 384 tiles of 16 bytes, addressed either unsigned from 0x8000 or signed around 0x9000.
pub const TILE_DATA_BEGIN: u16 = 0x8000;
pub const TILE_DATA_END: u16 = 0x97FF;
pub const TILE_DATA_UNSIGNED: u16 = 0x8000;
pub const TILE_DATA_SIGNED: u16 = 0x8800;
pub const TILE_SIZE: u16 = 16;

/// Two 32x32 tile maps used by the background and the window, the second one ends at 0x9FFF.
pub const TILE_MAP0_BEGIN: u16 = 0x9800;
pub const TILE_MAP0_END: u16 = 0x9BFF;
pub const TILE_MAP1_BEGIN: u16 = 0x9C00;

/// Cartridge RAM, switchable by the bank controller if present at all.
pub const CRAM_BANK_BEGIN: u16 = 0xA000;
pub const CRAM_BANK_END: u16 = 0xBFFF;

/// Internal work RAM.
pub const WRAM_BEGIN: u16 = 0xC000;
pub const WRAM_END: u16 = 0xDFFF;
pub const WRAM_SIZE: usize = (WRAM_END - WRAM_BEGIN + 1) as usize;

/// Echo of the work RAM up to 0xFDFF. The backing offset is computed from the start of this region,
/// which lands on the same bytes as a mirror of 0xC000-0xDDFF.
pub const ERAM_BEGIN: u16 = 0xE000;

/// Sprite attribute table, 40 entries of 4 bytes each.
pub const OAM_BEGIN: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;
pub const OAM_SIZE: usize = (OAM_END - OAM_BEGIN + 1) as usize;
pub const OAM_ENTRY_SIZE: u16 = 4;

/// Not usable up to 0xFEFF, reads return 0 and writes are dropped.
pub const UNUSED_BEGIN: u16 = 0xFEA0;

/// Memory mapped I/O registers 0xFF00-0xFF4B handled by the register bank.
pub const IO_BEGIN: u16 = 0xFF00;

/// Second unusable gap up to 0xFF7F (CGB registers and the boot ROM lock on real hardware).
pub const UNUSED_IO_BEGIN: u16 = 0xFF4C;

/// High RAM, mostly used for the stack and the DMA routine.
pub const HRAM_BEGIN: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;
pub const HRAM_SIZE: usize = (HRAM_END - HRAM_BEGIN + 1) as usize;

/// Start address of each of the 12 memory regions, in ascending order.
/// A region spans from its boundary up to (excluding) the next one,
/// the last region only contains the interrupt enable register.
pub const REGION_BOUNDARIES: [u16; 12] = [
    ROM_LOW_BANK_BEGIN,
    ROM_HIGH_BANK_BEGIN,
    VRAM_BEGIN,
    CRAM_BANK_BEGIN,
    WRAM_BEGIN,
    ERAM_BEGIN,
    OAM_BEGIN,
    UNUSED_BEGIN,
    IO_BEGIN,
    UNUSED_IO_BEGIN,
    HRAM_BEGIN,
    INTERRUPT_ENABLE,
];

/// Joypad Input Register
pub const JOYPAD: u16 = 0xFF00;

pub const SERIAL_TRANSFER_DATA: u16 = 0xFF01;
pub const SERIAL_TRANSFER_CTRL: u16 = 0xFF02;

// Timer Registers
/// Counts up at a fixed 16384Hz rate, resets to 0 whenever written to (DIV).
pub const TIMER_DIVIDER: u16 = 0xFF04;

/// Counts up at a specified rate. Triggers INT (0x50) when overflows (TIMA).
pub const TIMER_COUNTER: u16 = 0xFF05;

/// When counter overflows, it's reset to start at modulo (TMA).
pub const TIMER_MODULO: u16 = 0xFF06;

/// Timer Controller (TAC), bit 2 enables the timer and bits 0-1 select the frequency.
pub const TIMER_CTRL: u16 = 0xFF07;

// Sound registers, the APU itself is not emulated
pub const AUDIO_NR10: u16 = 0xFF10;
pub const AUDIO_NR11: u16 = 0xFF11;
pub const AUDIO_NR12: u16 = 0xFF12;
pub const AUDIO_NR13: u16 = 0xFF13;
pub const AUDIO_NR14: u16 = 0xFF14;
pub const AUDIO_NR21: u16 = 0xFF16;
pub const AUDIO_NR22: u16 = 0xFF17;
pub const AUDIO_NR23: u16 = 0xFF18;
pub const AUDIO_NR24: u16 = 0xFF19;
pub const AUDIO_NR30: u16 = 0xFF1A;
pub const AUDIO_NR31: u16 = 0xFF1B;
pub const AUDIO_NR32: u16 = 0xFF1C;
pub const AUDIO_NR33: u16 = 0xFF1D;
pub const AUDIO_NR34: u16 = 0xFF1E;
pub const AUDIO_NR41: u16 = 0xFF20;
pub const AUDIO_NR42: u16 = 0xFF21;
pub const AUDIO_NR43: u16 = 0xFF22;
pub const AUDIO_NR44: u16 = 0xFF23;
pub const AUDIO_NR50: u16 = 0xFF24;
pub const AUDIO_NR51: u16 = 0xFF25;
pub const AUDIO_NR52: u16 = 0xFF26;

/// Wave pattern RAM of sound channel 3
pub const WAVE_PATTERN_BEGIN: u16 = 0xFF30;
pub const WAVE_PATTERN_END: u16 = 0xFF3F;

// Display controller registers
pub const PPU_LCDC: u16 = 0xFF40;
pub const PPU_STAT: u16 = 0xFF41;
pub const PPU_SCY: u16 = 0xFF42;
pub const PPU_SCX: u16 = 0xFF43;
pub const PPU_LY: u16 = 0xFF44;
pub const PPU_LYC: u16 = 0xFF45;
pub const PPU_DMA: u16 = 0xFF46;
pub const PPU_BGP: u16 = 0xFF47;
pub const PPU_OBP0: u16 = 0xFF48;
pub const PPU_OBP1: u16 = 0xFF49;
pub const PPU_WY: u16 = 0xFF4A;
pub const PPU_WX: u16 = 0xFF4B;

/// Number of bytes copied by an OAM DMA transfer.
pub const DMA_TRANSFER_SIZE: u16 = 0xA0;

// Interrupt Controller Registers
pub const INTERRUPT_FLAG: u16 = 0xFF0F;
pub const INTERRUPT_ENABLE: u16 = 0xFFFF;

/// Value returned when reading a register address nothing is mapped to.
pub const UNDEFINED_READ: u8 = 0xFF;
