//! Hardware capability bits.
//!
//! The set is built in four steps, each of which may only add or only remove:
//!
//! 1. base bits from the matching [`ProcInfo`](crate::ProcInfo) entry;
//! 2. [`CapabilitySet::amplify`] adds what `ID_ISAR0`/`ID_ISAR5`/`ID_MMFR0` report (adds only);
//! 3. [`CapabilitySet::apply_config_mask`] drops what the build cannot support (removes only);
//! 4. [`CapabilitySet::apply_fixup`] drops what errata make unsafe (removes only).

use crate::{CpuArchitecture, IdRegisters};
use bitflags::bitflags;
use core::fmt;
use kernel_registers::id_isar::{signed_field, synch_prim_level};
use kernel_registers::id_mmfr0::IdMmfr0;

bitflags! {
    /// First capability word.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct HwCap: u32 {
        const SWP = 1 << 0;
        const HALF = 1 << 1;
        const THUMB = 1 << 2;
        const BIT26 = 1 << 3;
        const FAST_MULT = 1 << 4;
        const FPA = 1 << 5;
        const VFP = 1 << 6;
        const EDSP = 1 << 7;
        const JAVA = 1 << 8;
        const IWMMXT = 1 << 9;
        const CRUNCH = 1 << 10;
        const THUMBEE = 1 << 11;
        const NEON = 1 << 12;
        const VFPV3 = 1 << 13;
        const VFPV3D16 = 1 << 14;
        const TLS = 1 << 15;
        const VFPV4 = 1 << 16;
        /// `SDIV`/`UDIV` in the ARM instruction set.
        const IDIVA = 1 << 17;
        /// `SDIV`/`UDIV` in the Thumb instruction set.
        const IDIVT = 1 << 18;
        const VFPD32 = 1 << 19;
        /// Large physical address extension.
        const LPAE = 1 << 20;
        const EVTSTRM = 1 << 21;
    }
}

bitflags! {
    /// Second capability word (crypto extensions).
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct HwCap2: u32 {
        const AES = 1 << 0;
        const PMULL = 1 << 1;
        const SHA1 = 1 << 2;
        const SHA2 = 1 << 3;
        const CRC32 = 1 << 4;
    }
}

/// Names of [`HwCap`] bits, indexed by bit position.
pub const HWCAP_NAMES: [&str; 22] = [
    "swp", "half", "thumb", "26bit", "fastmult", "fpa", "vfp", "edsp", "java", "iwmmxt", "crunch",
    "thumbee", "neon", "vfpv3", "vfpv3d16", "tls", "vfpv4", "idiva", "idivt", "vfpd32", "lpae",
    "evtstrm",
];

/// Names of [`HwCap2`] bits, indexed by bit position.
pub const HWCAP2_NAMES: [&str; 5] = ["aes", "pmull", "sha1", "sha2", "crc32"];

/// Both capability words of one core.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
    pub hwcap: HwCap,
    pub hwcap2: HwCap2,
}

/// Identifies the ARM1136 family, which has a broken TLS register before r1.
const ARM1136_MASK: u32 = 0xff00_fff0;
const ARM1136_ID: u32 = 0x4100_b360;

/// Synchronization level from which `LDREX`/`STREX` fully replace `SWP`.
const SYNCH_PRIM_EXCLUSIVES: u8 = 0x13;

impl CapabilitySet {
    #[must_use]
    pub const fn new(hwcap: HwCap) -> Self {
        Self {
            hwcap,
            hwcap2: HwCap2::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, cap: HwCap) -> bool {
        self.hwcap.contains(cap)
    }

    /// Adds capabilities probed from the feature registers.
    ///
    /// Only `ARMv7` and later cores expose the probed fields.
    pub fn amplify<R: IdRegisters + ?Sized>(&mut self, arch: CpuArchitecture, regs: &R) {
        if arch < CpuArchitecture::ARMv7 {
            return;
        }

        match regs.isar0().divide() {
            2 => self.hwcap |= HwCap::IDIVA | HwCap::IDIVT,
            1 => self.hwcap |= HwCap::IDIVT,
            _ => {}
        }

        if regs.mmfr0().vmsa() >= IdMmfr0::VMSA_LPAE {
            self.hwcap |= HwCap::LPAE;
        }

        self.amplify_crypto(regs);
    }

    /// `ARMv8` crypto extensions usable from `AArch32` state.
    fn amplify_crypto<R: IdRegisters + ?Sized>(&mut self, regs: &R) {
        let isar5 = regs.isar5();

        let aes = signed_field(isar5.aes());
        if aes >= 2 {
            self.hwcap2 |= HwCap2::PMULL;
        }
        if aes >= 1 {
            self.hwcap2 |= HwCap2::AES;
        }
        if signed_field(isar5.sha1()) >= 1 {
            self.hwcap2 |= HwCap2::SHA1;
        }
        if signed_field(isar5.sha2()) >= 1 {
            self.hwcap2 |= HwCap2::SHA2;
        }
        if signed_field(isar5.crc32()) >= 1 {
            self.hwcap2 |= HwCap2::CRC32;
        }
    }

    /// Removes capabilities the kernel was built without support for.
    pub fn apply_config_mask(&mut self, thumb_enabled: bool) {
        if !thumb_enabled {
            self.hwcap.remove(HwCap::THUMB | HwCap::IDIVT);
        }
    }

    /// Removes capabilities that are present but unsafe to advertise.
    ///
    /// Idempotent, and never adds a bit.
    pub fn apply_fixup<R: IdRegisters + ?Sized>(&mut self, regs: &R) {
        let id = regs.read_id();
        let raw = id.into_bits();

        // ARM1136 r0 cannot be trusted with the user TLS register.
        if raw & ARM1136_MASK == ARM1136_ID && raw & (3 << 20) == 0 {
            self.hwcap.remove(HwCap::TLS);
            return;
        }

        // The synchronization fields only exist in the revised CPUID scheme.
        if !id.uses_revised_scheme() {
            return;
        }

        // SWP is not atomic across cores once exclusives are available; user
        // space must use LDREX/STREX.
        if synch_prim_level(regs.isar3(), regs.isar4()) >= SYNCH_PRIM_EXCLUSIVES {
            self.hwcap.remove(HwCap::SWP);
        }
    }

    /// Names of all set bits in both words, in bit order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let first = HWCAP_NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.hwcap.bits() & (1 << bit) != 0)
            .map(|(_, name)| *name);
        let second = HWCAP2_NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.hwcap2.bits() & (1 << bit) != 0)
            .map(|(_, name)| *name);
        first.chain(second)
    }
}

/// Space-separated feature list, e.g. `half thumb fastmult edsp tls idiva idivt lpae`.
impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegisterSnapshot;

    fn v7_with_divide(divide: u32) -> RegisterSnapshot {
        let mut regs = RegisterSnapshot::cortex_a7();
        regs.isar0 = divide << 24;
        regs
    }

    #[test]
    fn divide_levels() {
        for (level, expected) in [
            (0, HwCap::empty()),
            (1, HwCap::IDIVT),
            (2, HwCap::IDIVA | HwCap::IDIVT),
            (3, HwCap::empty()),
        ] {
            let mut caps = CapabilitySet::default();
            caps.amplify(CpuArchitecture::ARMv7, &v7_with_divide(level));
            assert_eq!(caps.hwcap & (HwCap::IDIVA | HwCap::IDIVT), expected, "level {level}");
        }
    }

    #[test]
    fn lpae_from_vmsa() {
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv7, &RegisterSnapshot::cortex_a7());
        assert!(caps.contains(HwCap::LPAE));

        let mut regs = RegisterSnapshot::cortex_a7();
        regs.mmfr0 = 0x0010_1104;
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv7, &regs);
        assert!(!caps.contains(HwCap::LPAE));
    }

    #[test]
    fn no_amplification_before_v7() {
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv6, &v7_with_divide(2));
        assert_eq!(caps, CapabilitySet::default());
    }

    #[test]
    fn crypto_from_isar5() {
        // Cortex-A53 running in AArch32 state.
        let regs = RegisterSnapshot {
            isar5: 0x0001_1121,
            ..RegisterSnapshot::cortex_a7()
        };
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv7, &regs);
        assert_eq!(
            caps.hwcap2,
            HwCap2::AES | HwCap2::PMULL | HwCap2::SHA1 | HwCap2::SHA2 | HwCap2::CRC32
        );

        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv7, &RegisterSnapshot::cortex_a7());
        assert_eq!(caps.hwcap2, HwCap2::empty());
    }

    #[test]
    fn crypto_levels() {
        for (isar5, expected) in [
            (0x0000_0010, HwCap2::AES),
            (0x0000_0020, HwCap2::AES | HwCap2::PMULL),
            // Negative levels mean "not implemented".
            (0x0000_00f0, HwCap2::empty()),
            (0x000f_ff00, HwCap2::empty()),
            (0x0001_0000, HwCap2::CRC32),
        ] {
            let regs = RegisterSnapshot {
                isar5,
                ..RegisterSnapshot::cortex_a7()
            };
            let mut caps = CapabilitySet::default();
            caps.amplify(CpuArchitecture::ARMv7, &regs);
            assert_eq!(caps.hwcap2, expected, "{isar5:08x}");
        }
    }

    #[test]
    fn no_crypto_before_v7() {
        let regs = RegisterSnapshot {
            isar5: 0x0001_1121,
            ..RegisterSnapshot::arm1136()
        };
        let mut caps = CapabilitySet::default();
        caps.amplify(CpuArchitecture::ARMv6, &regs);
        assert_eq!(caps.hwcap2, HwCap2::empty());
    }

    #[test]
    fn config_mask_strips_thumb_divide() {
        let mut caps = CapabilitySet::new(HwCap::THUMB | HwCap::IDIVA | HwCap::IDIVT);
        caps.apply_config_mask(true);
        assert_eq!(caps.hwcap, HwCap::THUMB | HwCap::IDIVA | HwCap::IDIVT);
        caps.apply_config_mask(false);
        assert_eq!(caps.hwcap, HwCap::IDIVA);
    }

    #[test]
    fn fixup_removes_swp_with_exclusives() {
        let mut caps = CapabilitySet::new(HwCap::SWP | HwCap::HALF);
        caps.apply_fixup(&RegisterSnapshot::cortex_a7());
        assert_eq!(caps.hwcap, HwCap::HALF);
    }

    #[test]
    fn fixup_keeps_swp_on_legacy_scheme() {
        let mut regs = RegisterSnapshot::cortex_a7();
        // Architecture field 0x7 instead of 0xF.
        regs.midr = 0x4117_c075;
        let mut caps = CapabilitySet::new(HwCap::SWP | HwCap::TLS);
        caps.apply_fixup(&regs);
        assert_eq!(caps.hwcap, HwCap::SWP | HwCap::TLS);
    }

    #[test]
    fn fixup_arm1136_r0_drops_tls() {
        let mut regs = RegisterSnapshot::arm1136();
        regs.midr = 0x4107_b362;
        let mut caps = CapabilitySet::new(HwCap::SWP | HwCap::TLS);
        caps.apply_fixup(&regs);
        assert_eq!(caps.hwcap, HwCap::SWP);

        // r1 keeps TLS.
        let mut caps = CapabilitySet::new(HwCap::SWP | HwCap::TLS);
        caps.apply_fixup(&RegisterSnapshot::arm1136());
        assert_eq!(caps.hwcap, HwCap::SWP | HwCap::TLS);
    }

    #[test]
    fn names_in_bit_order() {
        let caps = CapabilitySet {
            hwcap: HwCap::HALF | HwCap::THUMB | HwCap::LPAE,
            hwcap2: HwCap2::CRC32,
        };
        assert_eq!(caps.to_string(), "half thumb lpae crc32");
    }
}
