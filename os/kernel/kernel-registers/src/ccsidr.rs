use bitfield_struct::bitfield;

/// Current Cache Size ID Register (`CCSIDR`), CP15 c0/c0/0 with `opc1 = 1`.
///
/// Describes the cache last selected through [`Csselr`](crate::csselr::Csselr).
/// The selection and this read must be separated by an `isb`.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Ccsidr {
    /// Bits 2:0: `log2(words per line) - 2`.
    #[bits(3)]
    pub line_size: u8,

    /// Bits 12:3: Associativity minus one.
    #[bits(10)]
    pub associativity: u16,

    /// Bits 27:13: Number of sets minus one.
    #[bits(15)]
    pub num_sets: u16,

    pub write_allocate: bool,
    pub read_allocate: bool,
    pub write_back: bool,
    pub write_through: bool,
}

impl Ccsidr {
    /// Cache line length in bytes.
    #[inline]
    #[must_use]
    pub fn line_bytes(self) -> u32 {
        4 << (u32::from(self.line_size()) + 2)
    }

    /// Number of sets (one-based).
    #[inline]
    #[must_use]
    pub fn sets(self) -> u32 {
        u32::from(self.num_sets()) + 1
    }

    /// Number of ways (one-based).
    #[inline]
    #[must_use]
    pub fn ways(self) -> u32 {
        u32::from(self.associativity()) + 1
    }

    /// Bytes covered by a single way, i.e. the span of the cache index.
    #[inline]
    #[must_use]
    pub fn way_bytes(self) -> u32 {
        self.line_bytes() * self.sets()
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Ccsidr {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("1", "c0", "c0", "0"))
    }
}
