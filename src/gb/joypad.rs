use crate::gb::utils::bit_at;

/// Bit 4 of P1 selects the direction keys when cleared.
const SELECT_DIRECTION_BIT: u8 = 4;
/// Bit 5 of P1 selects the action keys when cleared.
const SELECT_ACTION_BIT: u8 = 5;
const SELECTION_MASK: u8 = 0b0011_0000;

/// State of the eight buttons as reported by the frontend, `true` means pressed.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct JoypadInput {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
}

impl JoypadInput {
    /// Packs the buttons into a byte, directions in the low and actions in the high nibble.
    const fn bits(&self) -> u8 {
        (self.right as u8)
            | (self.left as u8) << 1
            | (self.up as u8) << 2
            | (self.down as u8) << 3
            | (self.a as u8) << 4
            | (self.b as u8) << 5
            | (self.select as u8) << 6
            | (self.start as u8) << 7
    }
}

/// Represents the Joypad register P1 at 0xFF00.
/// The eight buttons are arranged as a 2x4 matrix, a group is selected by clearing bit 4
/// (directions) or bit 5 (actions). The lower nibble is read-only and active-low.
#[derive(Copy, Clone, Debug)]
pub struct Joypad {
    selection: u8,
    input: JoypadInput,
}

impl Default for Joypad {
    fn default() -> Self {
        Self {
            selection: SELECTION_MASK,
            input: JoypadInput::default(),
        }
    }
}

impl Joypad {
    /// Reads the register, folding the pressed buttons of the selected groups into bits 0-3.
    pub fn read(&self) -> u8 {
        let pressed = self.input.bits();
        let mut lines = 0b1111;
        if !bit_at(self.selection, SELECT_DIRECTION_BIT) {
            lines &= !pressed & 0b1111;
        }
        if !bit_at(self.selection, SELECT_ACTION_BIT) {
            lines &= !(pressed >> 4) & 0b1111;
        }
        0b1100_0000 | self.selection | lines
    }

    /// Only the selection bits are writable.
    #[inline]
    pub fn write(&mut self, value: u8) {
        self.selection = value & SELECTION_MASK;
    }

    /// Stores the new button state.
    /// Returns true if any button went from released to pressed.
    pub fn handle_input(&mut self, input: JoypadInput) -> bool {
        let newly_pressed = input.bits() & !self.input.bits();
        self.input = input;
        newly_pressed != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_selected() {
        let mut joypad = Joypad::default();
        assert_eq!(joypad.read(), 0xFF);
        joypad.handle_input(JoypadInput {
            a: true,
            up: true,
            ..Default::default()
        });
        assert_eq!(joypad.read(), 0xFF, "Buttons are invisible without a selection");
    }

    #[test]
    fn test_direction_keys() {
        let mut joypad = Joypad::default();
        joypad.write(0b0010_0000);
        joypad.handle_input(JoypadInput {
            left: true,
            down: true,
            a: true,
            ..Default::default()
        });
        assert_eq!(joypad.read(), 0b1110_0101);
    }

    #[test]
    fn test_action_keys() {
        let mut joypad = Joypad::default();
        joypad.write(0b0001_0000);
        joypad.handle_input(JoypadInput {
            start: true,
            b: true,
            right: true,
            ..Default::default()
        });
        assert_eq!(joypad.read(), 0b1101_0101);

        joypad.write(0b0011_0000);
        assert_eq!(joypad.read(), 0xFF);
    }

    #[test]
    fn test_both_groups_selected() {
        let mut joypad = Joypad::default();
        joypad.write(0x00);
        joypad.handle_input(JoypadInput {
            right: true,
            select: true,
            ..Default::default()
        });
        assert_eq!(joypad.read(), 0b1100_1010);
    }

    #[test]
    fn test_newly_pressed() {
        let mut joypad = Joypad::default();
        let a = JoypadInput {
            a: true,
            ..Default::default()
        };
        assert!(joypad.handle_input(a));
        assert!(!joypad.handle_input(a), "Holding a button is not a new press");
        assert!(!joypad.handle_input(JoypadInput::default()));
        assert!(joypad.handle_input(a));
    }
}
