use bitfield_struct::bitfield;

/// Cache Size Selection Register (`CSSELR`), CP15 c0/c0/0 with `opc1 = 2`.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Csselr {
    /// Bit 0: Select the instruction cache (1) or the data/unified cache (0).
    pub instruction: bool,

    /// Bits 3:1: Cache level minus one.
    #[bits(3)]
    pub level: u8,

    #[bits(28)]
    __: u32,
}

impl Csselr {
    /// Selects the level 1 instruction cache.
    #[inline]
    #[must_use]
    pub const fn l1_instruction() -> Self {
        Self::new().with_instruction(true).with_level(0)
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::StoreRegisterUnsafe for Csselr {
    unsafe fn store_unsafe(self) {
        let value = self.into_bits();
        unsafe {
            core::arch::asm!(
                "mcr p15, 2, {}, c0, c0, 0",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }
}
