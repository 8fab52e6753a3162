/// Gets the bit at position `n`.
/// Bits are numbered from 0 (least significant) to 7 (most significant).
#[inline]
pub const fn bit_at(input: u8, n: u8) -> bool {
    n < 8 && input & (1 << n) != 0
}

/// Sets the bit at position `n` to the given state.
#[inline]
pub const fn set_bit(input: u8, n: u8, state: bool) -> u8 {
    match state {
        true => input | (1 << n),
        false => input & !(1 << n),
    }
}

/// Checks if adding `y` and the incoming carry to `x` carries from bit 3 to bit 4.
#[inline]
pub const fn half_carry_u8(x: u8, y: u8, carry: bool) -> bool {
    (x & 0x0F) + (y & 0x0F) + carry as u8 > 0x0F
}

/// Checks if subtracting `y` and the incoming borrow from `x` borrows from bit 4.
#[inline]
pub const fn half_borrow_u8(x: u8, y: u8, borrow: bool) -> bool {
    (x & 0x0F) < (y & 0x0F) + borrow as u8
}

/// Combines a colour index from the two bit planes of a tile row.
#[inline]
pub const fn plane_index(low: u8, high: u8, bit: u8) -> u8 {
    ((bit_at(high, bit) as u8) << 1) | bit_at(low, bit) as u8
}
