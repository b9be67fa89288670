//! Instruction Set Attribute Registers (`ID_ISAR0`, `ID_ISAR3`, `ID_ISAR4`, `ID_ISAR5`).
//!
//! Only the registers consulted during capability probing are modelled.

use bitfield_struct::bitfield;

/// `ID_ISAR0`, CP15 c0/c2/0.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IdIsar0 {
    #[bits(4)]
    pub swap: u8,
    #[bits(4)]
    pub bitcount: u8,
    #[bits(4)]
    pub bitfield: u8,
    #[bits(4)]
    pub cmp_branch: u8,
    #[bits(4)]
    pub coproc: u8,
    #[bits(4)]
    pub debug: u8,

    /// Bits 27:24: Hardware divide.
    ///
    /// - `0`: none.
    /// - `1`: `SDIV`/`UDIV` in the Thumb instruction set.
    /// - `2`: `SDIV`/`UDIV` in both the Thumb and ARM instruction sets.
    #[bits(4)]
    pub divide: u8,

    #[bits(4)]
    __: u8,
}

/// `ID_ISAR3`, CP15 c0/c2/3.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IdIsar3 {
    #[bits(4)]
    pub saturate: u8,
    #[bits(4)]
    pub simd: u8,
    #[bits(4)]
    pub svc: u8,

    /// Bits 15:12: Exclusive load/store support, major part.
    #[bits(4)]
    pub synch_prim: u8,

    #[bits(4)]
    pub tab_branch: u8,
    #[bits(4)]
    pub thumb_copy: u8,
    #[bits(4)]
    pub true_nop: u8,
    #[bits(4)]
    pub thumbee: u8,
}

/// `ID_ISAR4`, CP15 c0/c2/4.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IdIsar4 {
    #[bits(4)]
    pub unpriv: u8,
    #[bits(4)]
    pub with_shifts: u8,
    #[bits(4)]
    pub writeback: u8,
    #[bits(4)]
    pub smc: u8,
    #[bits(4)]
    pub barrier: u8,

    /// Bits 23:20: Exclusive load/store support, fractional part.
    #[bits(4)]
    pub synch_prim_frac: u8,

    #[bits(4)]
    pub psr_m: u8,
    #[bits(4)]
    pub swp_frac: u8,
}

/// `ID_ISAR5`, CP15 c0/c2/5.
///
/// Reports the `ARMv8` crypto and CRC32 instructions available in `AArch32`
/// state. Fields read as zero on `ARMv7` cores.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IdIsar5 {
    #[bits(4)]
    pub sevl: u8,

    /// Bits 7:4: `1` adds `AESE`/`AESD`/`AESMC`/`AESIMC`, `2` also `VMULL.P64`.
    #[bits(4)]
    pub aes: u8,

    #[bits(4)]
    pub sha1: u8,
    #[bits(4)]
    pub sha2: u8,
    #[bits(4)]
    pub crc32: u8,

    #[bits(12)]
    __: u16,
}

/// Interprets a 4-bit ID field as signed, the convention for feature fields
/// where `0xf` means "not implemented" rather than "level 15".
#[inline]
#[must_use]
pub const fn signed_field(field: u8) -> i8 {
    i8::from_ne_bytes([field << 4]) >> 4
}

/// Combined synchronization primitive level, `ISAR3.SynchPrim:ISAR4.SynchPrim_frac`.
///
/// `0x13` and above means `LDREXB`/`LDREXH`/`LDREXD`/`CLREX` are implemented
/// in addition to `LDREX`/`STREX`.
#[inline]
#[must_use]
pub const fn synch_prim_level(isar3: IdIsar3, isar4: IdIsar4) -> u8 {
    (isar3.synch_prim() << 4) | isar4.synch_prim_frac()
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for IdIsar0 {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c2", "0"))
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for IdIsar3 {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c2", "3"))
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for IdIsar4 {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c2", "4"))
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for IdIsar5 {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c2", "5"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cortex_a7_divide_and_sync() {
        let isar0 = IdIsar0::from_bits(0x0210_1110);
        assert_eq!(isar0.divide(), 2);

        let isar3 = IdIsar3::from_bits(0x1111_2131);
        let isar4 = IdIsar4::from_bits(0x1001_1142);
        assert_eq!(synch_prim_level(isar3, isar4), 0x20);
    }

    #[test]
    fn matches_raw_shift_formula() {
        let isar3 = 0x1111_2131_u32;
        let isar4 = 0x1001_1142_u32;
        let raw = ((isar3 >> 8) & 0xf0) | ((isar4 >> 20) & 0x0f);
        let typed = synch_prim_level(IdIsar3::from_bits(isar3), IdIsar4::from_bits(isar4));
        assert_eq!(u32::from(typed), raw);
    }

    #[test]
    fn isar5_crypto_fields() {
        // Cortex-A53 in AArch32 state.
        let isar5 = IdIsar5::from_bits(0x0001_1121);
        assert_eq!(isar5.aes(), 2);
        assert_eq!(isar5.sha1(), 1);
        assert_eq!(isar5.sha2(), 1);
        assert_eq!(isar5.crc32(), 1);
    }

    #[test]
    fn signed_fields() {
        assert_eq!(signed_field(0), 0);
        assert_eq!(signed_field(7), 7);
        assert_eq!(signed_field(0x8), -8);
        assert_eq!(signed_field(0xf), -1);
    }
}
