use crate::gb::bus::{InterruptRegister, MemoryBus};
use crate::gb::cartridge::Cartridge;
use crate::gb::io::IoRegister;
use crate::gb::ppu::PPU;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::display::Display;
use crate::gb::ppu::misc::Shade;
use crate::gb::ppu::registers::{LCDState, PPUMode};
use crate::gb::tests::rom_image;
use crate::gb::{AddressSpace, Bus, EmulatorMessage, SCAN_LINES};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

const LINE_CYCLES: u16 = 456;

/// An 8x8 ring: colour 0 outside, 1 on the outer square, 2 inside.
const RING_TILE: [u8; 16] = [
    0x00, 0x00, 0x7E, 0x00, 0x42, 0x3C, 0x42, 0x3C, 0x42, 0x3C, 0x42, 0x3C, 0x7E, 0x00, 0x00, 0x00,
];

fn setup() -> (PPU, MemoryBus, Receiver<EmulatorMessage>) {
    let cartridge = Cartridge::try_from(Arc::from(rom_image(0x00).into_boxed_slice())).unwrap();
    let (sender, receiver) = mpsc::channel();
    let ppu = PPU::new(Some(Display::new(sender, false)));
    (ppu, MemoryBus::new(cartridge), receiver)
}

fn solid_tile(index: u8) -> [u8; 16] {
    let low = if index & 0b01 != 0 { 0xFF } else { 0x00 };
    let high = if index & 0b10 != 0 { 0xFF } else { 0x00 };
    let mut tile = [0u8; 16];
    for row in tile.chunks_exact_mut(2) {
        row.copy_from_slice(&[low, high]);
    }
    tile
}

fn write_bytes(bus: &mut MemoryBus, address: u16, data: &[u8]) {
    for (offset, value) in data.iter().enumerate() {
        bus.write(address + offset as u16, *value);
    }
}

fn run_lines(ppu: &mut PPU, bus: &mut MemoryBus, lines: u16) {
    for _ in 0..lines {
        ppu.step(bus, LINE_CYCLES);
    }
}

fn run_frame(
    ppu: &mut PPU,
    bus: &mut MemoryBus,
    receiver: &Receiver<EmulatorMessage>,
) -> FrameBuffer {
    run_lines(ppu, bus, u16::from(SCAN_LINES));
    match receiver.try_recv() {
        Ok(EmulatorMessage::Frame(frame)) => frame,
        Ok(EmulatorMessage::Aborted(err)) => panic!("Emulation aborted: {err}"),
        Err(err) => panic!("No frame received: {err}"),
    }
}

fn stat(bus: &MemoryBus) -> LCDState {
    LCDState::from_bits_retain(bus.io.read(IoRegister::STAT))
}

#[test]
fn test_get_lcd_mode() {
    let mut state = LCDState::empty();
    assert_eq!(state.mode(), PPUMode::HBlank);

    state = LCDState::PPU_MODE1;
    assert_eq!(state.mode(), PPUMode::VBlank);

    state = LCDState::PPU_MODE2;
    assert_eq!(state.mode(), PPUMode::AccessOAM);

    state = LCDState::PPU_MODE1 | LCDState::PPU_MODE2;
    assert_eq!(state.mode(), PPUMode::AccessVRAM);
}

#[test]
fn test_set_lcd_mode() {
    let mut state = LCDState::LY_INT;
    state.set_mode(PPUMode::HBlank);
    assert_eq!(state.bits(), 0b01000000);

    state.set_mode(PPUMode::VBlank);
    assert_eq!(state.bits(), 0b01000001);

    state.set_mode(PPUMode::AccessOAM);
    assert_eq!(state.bits(), 0b01000010);

    state.set_mode(PPUMode::AccessVRAM);
    assert_eq!(state.bits(), 0b01000011);
}

#[test]
fn test_mode_timing() {
    let (mut ppu, mut bus, _receiver) = setup();
    assert_eq!(ppu.mode(), PPUMode::AccessOAM);

    ppu.step(&mut bus, 79);
    assert_eq!(ppu.mode(), PPUMode::AccessOAM);
    assert_eq!(stat(&bus).mode(), PPUMode::AccessOAM);

    ppu.step(&mut bus, 1);
    assert_eq!(ppu.mode(), PPUMode::AccessVRAM);
    assert_eq!(stat(&bus).mode(), PPUMode::AccessVRAM);

    ppu.step(&mut bus, 172);
    assert_eq!(ppu.mode(), PPUMode::HBlank);
    assert_eq!(bus.io.read(IoRegister::LY), 0);

    ppu.step(&mut bus, 204);
    assert_eq!(ppu.mode(), PPUMode::AccessOAM);
    assert_eq!(bus.io.read(IoRegister::LY), 1);
}

#[test]
fn test_multiple_transitions_per_step() {
    let (mut ppu, mut bus, _receiver) = setup();
    ppu.step(&mut bus, 80 + 172 + 10);
    assert_eq!(ppu.mode(), PPUMode::HBlank);
    ppu.step(&mut bus, 194 + 80);
    assert_eq!(ppu.mode(), PPUMode::AccessVRAM);
    assert_eq!(bus.io.read(IoRegister::LY), 1);
}

#[test]
fn test_vblank() {
    let (mut ppu, mut bus, _receiver) = setup();
    run_lines(&mut ppu, &mut bus, 143);
    assert!(!bus.get_if().contains(InterruptRegister::VBLANK));

    run_lines(&mut ppu, &mut bus, 1);
    assert_eq!(ppu.mode(), PPUMode::VBlank);
    assert_eq!(bus.io.read(IoRegister::LY), 144);
    assert!(bus.get_if().contains(InterruptRegister::VBLANK));
    assert!(!bus.get_if().contains(InterruptRegister::STAT));

    run_lines(&mut ppu, &mut bus, 9);
    assert_eq!(ppu.mode(), PPUMode::VBlank);
    assert_eq!(bus.io.read(IoRegister::LY), 153);
}

#[test]
fn test_full_frame() {
    let (mut ppu, mut bus, receiver) = setup();
    let frame = run_frame(&mut ppu, &mut bus, &receiver);

    assert_eq!(frame, FrameBuffer::default(), "Empty tile data is white");
    assert_eq!(ppu.frames(), 1);
    assert_eq!(ppu.mode(), PPUMode::AccessOAM);
    assert_eq!(bus.io.read(IoRegister::LY), 0);
    assert!(receiver.try_recv().is_err(), "Exactly one frame per 70224 cycles");
}

#[test]
fn test_lcd_disabled() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x11);
    run_lines(&mut ppu, &mut bus, u16::from(SCAN_LINES));

    assert_eq!(ppu.frames(), 1);
    assert_eq!(bus.io.read(IoRegister::LY), 0);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_coincidence_flag() {
    let (mut ppu, mut bus, _receiver) = setup();
    bus.write(0xFF45, 5);

    for line in 0..SCAN_LINES {
        ppu.step(&mut bus, 0);
        assert_eq!(
            stat(&bus).contains(LCDState::LYC_STAT),
            line == 5,
            "Coincidence on line {line}"
        );
        run_lines(&mut ppu, &mut bus, 1);
    }
}

#[test]
fn test_lyc_interrupt() {
    let (mut ppu, mut bus, _receiver) = setup();
    bus.write(0xFF41, LCDState::LY_INT.bits());
    bus.write(0xFF45, 2);

    run_lines(&mut ppu, &mut bus, 2);
    assert!(!bus.get_if().contains(InterruptRegister::STAT));

    ppu.step(&mut bus, 80 + 172);
    assert!(bus.get_if().contains(InterruptRegister::STAT));
    assert!(stat(&bus).contains(LCDState::LY_INT), "Enable bits survive mode updates");
}

#[test]
fn test_hblank_interrupt() {
    let (mut ppu, mut bus, _receiver) = setup();
    bus.write(0xFF41, LCDState::H_BLANK_INT.bits());

    ppu.step(&mut bus, 80 + 171);
    assert!(!bus.get_if().contains(InterruptRegister::STAT));
    ppu.step(&mut bus, 1);
    assert!(bus.get_if().contains(InterruptRegister::STAT));
}

#[test]
fn test_oam_interrupt() {
    let (mut ppu, mut bus, _receiver) = setup();
    bus.write(0xFF41, LCDState::OAM_INT.bits());

    ppu.step(&mut bus, LINE_CYCLES - 1);
    assert!(!bus.get_if().contains(InterruptRegister::STAT));
    ppu.step(&mut bus, 1);
    assert!(bus.get_if().contains(InterruptRegister::STAT));
}

#[test]
fn test_vblank_stat_interrupt() {
    let (mut ppu, mut bus, _receiver) = setup();
    bus.write(0xFF41, LCDState::V_BLANK_INT.bits());

    run_lines(&mut ppu, &mut bus, 144);
    assert!(bus.get_if().contains(InterruptRegister::VBLANK | InterruptRegister::STAT));
}

#[test]
fn test_background_unsigned_tiles() {
    let (mut ppu, mut bus, receiver) = setup();
    write_bytes(&mut bus, 0x8010, &solid_tile(3));
    bus.write(0x9800, 1);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(frame.get_pixel(x, y), Shade::Black, "({x}, {y})");
        }
    }
    assert_eq!(frame.get_pixel(8, 0), Shade::White);
    assert_eq!(frame.get_pixel(0, 8), Shade::White);
}

#[test]
fn test_background_signed_tiles() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x81);
    write_bytes(&mut bus, 0x8800, &solid_tile(1));
    write_bytes(&mut bus, 0x8000, &solid_tile(3));
    bus.write(0x9800, 0x80);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::LightGrey);
    assert_eq!(frame.get_pixel(7, 7), Shade::LightGrey);
    assert_eq!(frame.get_pixel(8, 0), Shade::White, "Tile 0 resolves to 0x9000");
}

#[test]
fn test_background_ring_tile() {
    let (mut ppu, mut bus, receiver) = setup();
    write_bytes(&mut bus, 0x8010, &RING_TILE);
    bus.write(0x9800, 1);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    for y in 0..8u8 {
        for x in 0..8u8 {
            let index = x.min(y).min(7 - x).min(7 - y).min(2);
            assert_eq!(frame.get_pixel(x, y), Shade::from(index), "({x}, {y})");
        }
    }
}

#[test]
fn test_background_scroll_wraps() {
    let (mut ppu, mut bus, receiver) = setup();
    write_bytes(&mut bus, 0x8010, &solid_tile(3));
    bus.write(0x981F, 1);
    bus.write(0xFF43, 248);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::Black);
    assert_eq!(frame.get_pixel(7, 0), Shade::Black);
    assert_eq!(frame.get_pixel(8, 0), Shade::White);
}

#[test]
fn test_background_palette() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF47, 0b0001_1011);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert!(frame.rows().flatten().all(|&shade| shade == Shade::Black));
}

#[test]
fn test_window() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0xF1);
    write_bytes(&mut bus, 0x8010, &solid_tile(3));
    for offset in 0..0x400 {
        bus.write(0x9C00 + offset, 1);
    }
    bus.write(0xFF4A, 72);
    bus.write(0xFF4B, 87);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(79, 72), Shade::White);
    assert_eq!(frame.get_pixel(80, 72), Shade::Black);
    assert_eq!(frame.get_pixel(80, 71), Shade::White);
    assert_eq!(frame.get_pixel(159, 143), Shade::Black);
}

#[test]
fn test_sprite_origin() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0xFE00, &[16 + 10, 8 + 20, 2, 0x00]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(20, 10), Shade::Black);
    assert_eq!(frame.get_pixel(27, 17), Shade::Black);
    assert_eq!(frame.get_pixel(19, 10), Shade::White);
    assert_eq!(frame.get_pixel(28, 10), Shade::White);
    assert_eq!(frame.get_pixel(20, 18), Shade::White);
}

#[test]
fn test_sprites_disabled() {
    let (mut ppu, mut bus, receiver) = setup();
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0xFE00, &[16, 8, 2, 0x00]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame, FrameBuffer::default());
}

#[test]
fn test_sprite_clipping() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0xFE00, &[16, 4, 2, 0x00]);
    write_bytes(&mut bus, 0xFE04, &[0, 40, 2, 0x00]);
    write_bytes(&mut bus, 0xFE08, &[160, 40, 2, 0x00]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    for x in 0..4 {
        assert_eq!(frame.get_pixel(x, 0), Shade::Black);
    }
    assert_eq!(frame.get_pixel(4, 0), Shade::White);
    assert_eq!(
        frame.rows().flatten().filter(|&&shade| shade == Shade::Black).count(),
        4 * 8,
        "Sprites outside of the screen are not drawn"
    );
}

#[test]
fn test_sprite_transparency() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    bus.write(0xFF48, 0b1111_1100);
    write_bytes(&mut bus, 0x8000, &solid_tile(1));
    write_bytes(&mut bus, 0x8020, &RING_TILE);
    write_bytes(&mut bus, 0xFE00, &[16, 8, 2, 0x00]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::LightGrey);
    assert_eq!(frame.get_pixel(1, 1), Shade::Black);
    assert_eq!(frame.get_pixel(3, 4), Shade::Black);
    assert_eq!(frame.get_pixel(7, 7), Shade::LightGrey);
    assert_eq!(frame.get_pixel(8, 0), Shade::LightGrey);
}

#[test]
fn test_sprite_priority() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    write_bytes(&mut bus, 0x8010, &solid_tile(1));
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    bus.write(0x9800, 1);
    write_bytes(&mut bus, 0xFE00, &[16, 8 + 4, 2, 0x80]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    for x in 4..8 {
        assert_eq!(frame.get_pixel(x, 0), Shade::LightGrey, "Background wins at {x}");
    }
    for x in 8..12 {
        assert_eq!(frame.get_pixel(x, 0), Shade::Black, "Sprite wins at {x}");
    }
}

#[test]
fn test_sprite_flip() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    let mut corner = [0u8; 16];
    corner[0] = 0b1111_0000;
    corner[1] = 0b1111_0000;
    write_bytes(&mut bus, 0x8020, &corner);
    write_bytes(&mut bus, 0xFE00, &[16, 8, 2, 0x00]);
    write_bytes(&mut bus, 0xFE04, &[16, 8 + 16, 2, 0x20]);
    write_bytes(&mut bus, 0xFE08, &[16, 8 + 32, 2, 0x40]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::Black);
    assert_eq!(frame.get_pixel(4, 0), Shade::White);

    assert_eq!(frame.get_pixel(16, 0), Shade::White);
    assert_eq!(frame.get_pixel(20, 0), Shade::Black);

    assert_eq!(frame.get_pixel(32, 0), Shade::White);
    assert_eq!(frame.get_pixel(32, 7), Shade::Black);
}

#[test]
fn test_sprite_palettes() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    bus.write(0xFF49, 0b0100_0000);
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0xFE00, &[16, 8, 2, 0x00]);
    write_bytes(&mut bus, 0xFE04, &[16, 8 + 8, 2, 0x10]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::Black);
    assert_eq!(frame.get_pixel(8, 0), Shade::LightGrey);
}

#[test]
fn test_tall_sprites() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x97);
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0x8030, &solid_tile(1));
    write_bytes(&mut bus, 0xFE00, &[16, 8, 3, 0x00]);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(0, 0), Shade::Black);
    assert_eq!(frame.get_pixel(0, 7), Shade::Black);
    assert_eq!(frame.get_pixel(0, 8), Shade::LightGrey);
    assert_eq!(frame.get_pixel(0, 15), Shade::LightGrey);
    assert_eq!(frame.get_pixel(0, 16), Shade::White);
}

#[test]
fn test_sprites_from_dma() {
    let (mut ppu, mut bus, receiver) = setup();
    bus.write(0xFF40, 0x93);
    write_bytes(&mut bus, 0x8020, &solid_tile(3));
    write_bytes(&mut bus, 0xC000, &[16 + 100, 8 + 100, 2, 0x00]);
    bus.write(0xFF46, 0xC0);

    let frame = run_frame(&mut ppu, &mut bus, &receiver);
    assert_eq!(frame.get_pixel(100, 100), Shade::Black);
    assert_eq!(frame.get_pixel(107, 107), Shade::Black);
}
