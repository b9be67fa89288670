use bitfield_struct::bitfield;

/// Multiprocessor Affinity Register (`MPIDR`), CP15 c0/c0/5.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Mpidr {
    /// Bits 7:0: Affinity level 0, usually the core within a cluster.
    #[bits(8)]
    pub aff0: u8,

    /// Bits 15:8: Affinity level 1, usually the cluster.
    #[bits(8)]
    pub aff1: u8,

    /// Bits 23:16: Affinity level 2.
    #[bits(8)]
    pub aff2: u8,

    /// Bit 24: Lowest affinity level consists of multithreaded logical processors.
    pub mt: bool,

    #[bits(5)]
    __: u8,

    /// Bit 30: Uniprocessor system.
    pub up: bool,

    /// Bit 31: Set when the multiprocessing extensions register format is used.
    pub mp_format: bool,
}

impl Mpidr {
    /// Bits of the register that carry affinity information.
    pub const HWID_BITMASK: u32 = 0x00FF_FFFF;

    /// Number of bits per affinity level.
    pub const LEVEL_BITS: u32 = 8;

    /// Affinity fields only, as used for logical CPU mapping.
    #[inline]
    #[must_use]
    pub const fn hwid(self) -> u32 {
        self.into_bits() & Self::HWID_BITMASK
    }
}

/// Extracts affinity level `level` (0..=2) from a raw hardware id.
#[inline]
#[must_use]
pub const fn affinity_level(hwid: u32, level: u32) -> u32 {
    (hwid >> (level * Mpidr::LEVEL_BITS)) & 0xFF
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Mpidr {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c0", "5"))
    }
}
