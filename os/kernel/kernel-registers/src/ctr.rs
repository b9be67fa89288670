use bitfield_struct::bitfield;

/// Cache Type Register (`CTR`), CP15 c0/c0/1.
///
/// Two encodings exist. The `ARMv7` format is identified by
/// [`format`](Ctr::format) being `0b100`; anything else is read with the
/// `ARMv6` layout where bits 23 and 11 are the data and instruction cache
/// "page colouring required" flags.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Ctr {
    /// Bits 3:0: log2 of the smallest instruction cache line, in words.
    #[bits(4)]
    pub iminline: u8,

    #[bits(10)]
    __: u16,

    /// Bits 15:14: L1 instruction cache indexing and tagging policy.
    #[bits(2)]
    pub l1_ip: L1InstructionPolicy,

    /// Bits 19:16: log2 of the smallest data cache line, in words.
    #[bits(4)]
    pub dminline: u8,

    /// Bits 23:20: Exclusives reservation granule.
    #[bits(4)]
    pub erg: u8,

    /// Bits 27:24: Cache writeback granule.
    #[bits(4)]
    pub cwg: u8,

    #[bits(1)]
    __: u8,

    /// Bits 31:29: Register format. `0b100` for the `ARMv7` layout.
    #[bits(3)]
    pub format: u8,
}

impl Ctr {
    /// [`format`](Self::format) value of the `ARMv7` register layout.
    pub const FORMAT_V7: u8 = 0b100;

    #[inline]
    #[must_use]
    pub const fn is_v7_format(self) -> bool {
        self.format() == Self::FORMAT_V7
    }

    /// `ARMv6` layout: data cache requires page colouring (bit 23).
    #[inline]
    #[must_use]
    pub const fn v6_dcache_aliasing(self) -> bool {
        self.into_bits() & (1 << 23) != 0
    }

    /// `ARMv6` layout: instruction cache requires page colouring (bit 11).
    #[inline]
    #[must_use]
    pub const fn v6_icache_aliasing(self) -> bool {
        self.into_bits() & (1 << 11) != 0
    }
}

/// `CTR.L1Ip` encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum L1InstructionPolicy {
    /// `0b00`, reserved in `ARMv7`.
    Reserved = 0b00,
    /// `0b01`, ASID-tagged virtually indexed, virtually tagged.
    AsidTagged = 0b01,
    /// `0b10`, virtually indexed, physically tagged.
    Vipt = 0b10,
    /// `0b11`, physically indexed, physically tagged.
    Pipt = 0b11,
}

impl L1InstructionPolicy {
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0b01 => Self::AsidTagged,
            0b10 => Self::Vipt,
            0b11 => Self::Pipt,
            _ => Self::Reserved,
        }
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Ctr {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c0", "1"))
    }
}
