use bitflags::bitflags;

/// Holds all CPU registers
#[derive(Copy, Clone, Default, Debug)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: FlagsRegister,
    pub h: u8,
    pub l: u8,
    pub sp: u16, // Stack pointer
    pub pc: u16, // Program counter
}

impl Registers {
    /// Register state the boot ROM leaves behind before jumping to the cartridge entry point.
    pub fn post_boot() -> Self {
        let mut r = Self {
            sp: 0xFFFE,
            pc: 0x0100,
            ..Default::default()
        };
        r.set_af(0x01B0);
        r.set_bc(0x0013);
        r.set_de(0x00D8);
        r.set_hl(0x014D);
        r
    }

    #[inline]
    pub fn get_af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.bits()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.f = FlagsRegister::from_bits_truncate(f);
    }

    #[inline]
    pub fn get_bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    #[inline]
    pub fn get_de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    #[inline]
    pub fn get_hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }
}

bitflags! {
    /// Represents the special purpose "flags" register.
    /// Only the upper 4 bits are used, the lower nibble always reads 0.
    ///
    ///    ┌-> Carry
    ///  ┌-+> Subtraction
    ///  | |
    /// 1111 0000
    /// | |
    /// └-+> Zero
    ///   └-> Half Carry
    #[derive(Copy, Clone, PartialEq, Default, Debug)]
    pub struct FlagsRegister: u8 {
        const ZERO = 0b1000_0000;
        const SUBTRACTION = 0b0100_0000;
        const HALF_CARRY = 0b0010_0000;
        const CARRY = 0b0001_0000;
    }
}

impl FlagsRegister {
    #[inline]
    pub fn update(&mut self, zero: bool, negative: bool, half_carry: bool, carry: bool) {
        self.set(FlagsRegister::ZERO, zero);
        self.set(FlagsRegister::SUBTRACTION, negative);
        self.set(FlagsRegister::HALF_CARRY, half_carry);
        self.set(FlagsRegister::CARRY, carry);
    }

    #[inline]
    pub fn carry(&self) -> bool {
        self.contains(FlagsRegister::CARRY)
    }
}
