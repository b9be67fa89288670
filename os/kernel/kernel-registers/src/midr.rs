use bitfield_struct::bitfield;

/// Main ID Register (`MIDR`), CP15 c0/c0/0.
///
/// The field layout below is the one used by cores following the revised
/// CPUID scheme (`architecture == 0xF`). Legacy ARM7 and pre-ARM7 parts pack
/// the same 32 bits differently; see [`Midr::uses_revised_scheme`].
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Midr {
    /// Bits 3:0: Revision (the `p` in `rNpM`).
    #[bits(4)]
    pub revision: u8,

    /// Bits 15:4: Primary part number.
    #[bits(12)]
    pub part_number: u16,

    /// Bits 19:16: Architecture code. `0xF` means "see the CPUID registers".
    #[bits(4)]
    pub architecture: u8,

    /// Bits 23:20: Variant (the `r` in `rNpM`).
    #[bits(4)]
    pub variant: u8,

    /// Bits 31:24: Implementer code, e.g. `0x41` for ARM Ltd.
    #[bits(8)]
    pub implementer: u8,
}

impl Midr {
    /// Implementer code for ARM Limited.
    pub const IMPLEMENTER_ARM: u8 = 0x41;

    /// `true` when the architecture field is all ones, i.e. the core describes
    /// its features through the `ID_*` registers.
    #[inline]
    #[must_use]
    pub const fn uses_revised_scheme(self) -> bool {
        self.architecture() == 0xF
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Midr {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c0", "0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cortex_a7_r0p5() {
        let midr = Midr::from_bits(0x410f_c075);
        assert_eq!(midr.implementer(), Midr::IMPLEMENTER_ARM);
        assert_eq!(midr.variant(), 0);
        assert_eq!(midr.part_number(), 0xc07);
        assert_eq!(midr.revision(), 5);
        assert!(midr.uses_revised_scheme());
    }

    #[test]
    fn arm1136_is_not_revised() {
        let midr = Midr::from_bits(0x4107_b362);
        assert!(!midr.uses_revised_scheme());
        assert_eq!(midr.part_number(), 0xb36);
    }
}
