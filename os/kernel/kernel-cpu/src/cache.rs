//! Cache topology classification and the default cache policy.

use crate::{CpuArchitecture, FatalPrecondition, IdRegisters};
use bitflags::bitflags;
use core::fmt;
use kernel_info::memory::PAGE_SIZE;
use kernel_registers::ctr::{Ctr, L1InstructionPolicy};
use log::info;

bitflags! {
    /// Cache indexing properties of the boot core.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct CacheId: u32 {
        /// Virtually indexed, virtually tagged data cache.
        const VIVT = 1 << 0;
        const VIPT_NONALIASING = 1 << 1;
        const VIPT_ALIASING = 1 << 2;
        /// Instruction cache tagged with the address space id.
        const ASID_TAGGED = 1 << 3;
        /// Instruction cache spans more than a page per way.
        const VIPT_I_ALIASING = 1 << 4;
        /// Physically indexed instruction cache.
        const PIPT = 1 << 5;
    }
}

/// Data cache behaviour as seen by cache maintenance code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataCacheKind {
    /// Incoherent with respect to virtual aliases; flushed on context switch.
    Vivt,
    ViptAliasing,
    /// Coherent: behaves as physically indexed.
    ViptNonAliasing,
    Unknown,
}

/// Instruction cache behaviour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InstructionCacheKind {
    VivtAsidTagged,
    ViptAliasing,
    Pipt,
    ViptNonAliasing,
    Unknown,
}

/// Boot-wide cache classification, computed once from the boot core.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheClassification {
    pub id: CacheId,
}

impl CacheClassification {
    /// The classification used when the core has no architected caches.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            id: CacheId::empty(),
        }
    }

    #[must_use]
    pub const fn data(&self) -> DataCacheKind {
        if self.id.contains(CacheId::VIVT) {
            DataCacheKind::Vivt
        } else if self.id.contains(CacheId::VIPT_ALIASING) {
            DataCacheKind::ViptAliasing
        } else if self.id.contains(CacheId::VIPT_NONALIASING) {
            DataCacheKind::ViptNonAliasing
        } else {
            DataCacheKind::Unknown
        }
    }

    #[must_use]
    pub const fn instruction(&self) -> InstructionCacheKind {
        if self.id.contains(CacheId::ASID_TAGGED) {
            InstructionCacheKind::VivtAsidTagged
        } else if self.id.contains(CacheId::VIPT_I_ALIASING) {
            InstructionCacheKind::ViptAliasing
        } else if self.id.contains(CacheId::PIPT) {
            InstructionCacheKind::Pipt
        } else if self.id.contains(CacheId::VIPT_NONALIASING) {
            InstructionCacheKind::ViptNonAliasing
        } else {
            InstructionCacheKind::Unknown
        }
    }

    /// Whether instruction cache lines can alias between virtual mappings.
    #[inline]
    #[must_use]
    pub const fn icache_aliasing(&self) -> bool {
        self.id.contains(CacheId::VIPT_I_ALIASING)
    }
}

impl fmt::Display for DataCacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vivt => "VIVT",
            Self::ViptAliasing => "VIPT aliasing",
            Self::ViptNonAliasing => "PIPT / VIPT nonaliasing",
            Self::Unknown => "unknown",
        })
    }
}

impl fmt::Display for InstructionCacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VivtAsidTagged => "VIVT ASID tagged",
            Self::ViptAliasing => "VIPT aliasing",
            Self::Pipt => "PIPT",
            Self::ViptNonAliasing => "VIPT nonaliasing",
            Self::Unknown => "unknown",
        })
    }
}

/// Classifies the data and instruction caches of the executing core.
///
/// # Errors
/// [`FatalPrecondition::UnknownArchitecture`] if `arch` is unknown; no cache
/// maintenance strategy is safe on an unidentified core.
pub fn classify_cache<R: IdRegisters + ?Sized>(
    arch: CpuArchitecture,
    regs: &R,
) -> Result<CacheClassification, FatalPrecondition> {
    if !arch.is_known() {
        return Err(FatalPrecondition::UnknownArchitecture {
            id: regs.read_id().into_bits(),
        });
    }

    let classification = if arch == CpuArchitecture::ARMv7M {
        CacheClassification::neutral()
    } else if arch >= CpuArchitecture::ARMv6 {
        let ctr = regs.read_cache_type();
        // The register format, not the decoded generation, decides which
        // layout applies from here on.
        let (format, mut id) = if ctr.is_v7_format() {
            let mut id = CacheId::VIPT_NONALIASING;
            match ctr.l1_ip() {
                L1InstructionPolicy::AsidTagged => id |= CacheId::ASID_TAGGED,
                L1InstructionPolicy::Pipt => id |= CacheId::PIPT,
                L1InstructionPolicy::Vipt | L1InstructionPolicy::Reserved => {}
            }
            (CpuArchitecture::ARMv7, id)
        } else if ctr.v6_dcache_aliasing() {
            (CpuArchitecture::ARMv6, CacheId::VIPT_ALIASING)
        } else {
            (CpuArchitecture::ARMv6, CacheId::VIPT_NONALIASING)
        };

        if has_aliasing_icache(format, id, ctr, regs) {
            id |= CacheId::VIPT_I_ALIASING;
        }
        CacheClassification { id }
    } else {
        CacheClassification { id: CacheId::VIVT }
    };

    info!(
        "CPU: {} data cache, {} instruction cache",
        classification.data(),
        classification.instruction()
    );
    Ok(classification)
}

fn has_aliasing_icache<R: IdRegisters + ?Sized>(
    format: CpuArchitecture,
    id: CacheId,
    ctr: Ctr,
    regs: &R,
) -> bool {
    if id.contains(CacheId::PIPT) {
        return false;
    }

    match format {
        CpuArchitecture::ARMv7 => {
            let ccsidr = regs.read_l1_icache_size();
            u64::from(ccsidr.way_bytes()) > PAGE_SIZE
        }
        CpuArchitecture::ARMv6 => ctr.v6_icache_aliasing(),
        _ => false,
    }
}

/// Default memory type for normal kernel mappings.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CachePolicy {
    Uncached,
    Buffered,
    Writethrough,
    #[default]
    Writeback,
    Writealloc,
}

/// TEX, C and B bits of a short-descriptor section.
const SECT_CACHE_MASK: u32 = (7 << 12) | (1 << 3) | (1 << 2);

impl CachePolicy {
    /// Derives the policy from processor-info section flags.
    ///
    /// Unrecognized combinations keep the write-back default.
    #[must_use]
    pub const fn from_section_flags(mmu_flags: u32) -> Self {
        match mmu_flags & SECT_CACHE_MASK {
            0 => Self::Uncached,
            0x0004 => Self::Buffered,
            0x0008 => Self::Writethrough,
            0x100c => Self::Writealloc,
            _ => Self::Writeback,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uncached => "uncached",
            Self::Buffered => "buffered",
            Self::Writethrough => "writethrough",
            Self::Writeback => "writeback",
            Self::Writealloc => "writealloc",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegisterSnapshot;

    #[test]
    fn cortex_a7_has_aliasing_vipt_icache() {
        let c = classify_cache(CpuArchitecture::ARMv7, &RegisterSnapshot::cortex_a7())
            .expect("known arch");
        assert_eq!(c.id, CacheId::VIPT_NONALIASING | CacheId::VIPT_I_ALIASING);
        assert_eq!(c.data(), DataCacheKind::ViptNonAliasing);
        assert_eq!(c.instruction(), InstructionCacheKind::ViptAliasing);
    }

    #[test]
    fn small_icache_way_does_not_alias() {
        let mut regs = RegisterSnapshot::cortex_a7();
        // 32-byte lines, 128 sets: exactly one page per way.
        regs.l1_icache_ccsidr = (127 << 13) | 1;
        let c = classify_cache(CpuArchitecture::ARMv7, &regs).expect("known arch");
        assert!(!c.icache_aliasing());
        assert_eq!(c.instruction(), InstructionCacheKind::ViptNonAliasing);
    }

    #[test]
    fn pipt_icache_never_aliases() {
        let mut regs = RegisterSnapshot::cortex_a7();
        regs.ctr = 0x8444_c004;
        let c = classify_cache(CpuArchitecture::ARMv7, &regs).expect("known arch");
        assert_eq!(c.id, CacheId::VIPT_NONALIASING | CacheId::PIPT);
        assert_eq!(c.instruction(), InstructionCacheKind::Pipt);
    }

    #[test]
    fn asid_tagged_icache() {
        let mut regs = RegisterSnapshot::cortex_a7();
        regs.ctr = 0x8444_4003;
        let c = classify_cache(CpuArchitecture::ARMv7, &regs).expect("known arch");
        assert!(c.id.contains(CacheId::ASID_TAGGED));
        assert_eq!(c.instruction(), InstructionCacheKind::VivtAsidTagged);
    }

    #[test]
    fn v6_format_bits() {
        let c = classify_cache(CpuArchitecture::ARMv6, &RegisterSnapshot::arm1136())
            .expect("known arch");
        assert_eq!(c.id, CacheId::VIPT_NONALIASING | CacheId::VIPT_I_ALIASING);

        let mut regs = RegisterSnapshot::arm1136();
        regs.ctr |= 1 << 23;
        regs.ctr &= !(1 << 11);
        let c = classify_cache(CpuArchitecture::ARMv6, &regs).expect("known arch");
        assert_eq!(c.id, CacheId::VIPT_ALIASING);
        assert_eq!(c.data(), DataCacheKind::ViptAliasing);
    }

    #[test]
    fn older_generations_are_vivt() {
        let c = classify_cache(CpuArchitecture::ARMv5TEJ, &RegisterSnapshot::with_id(0x4106_9265))
            .expect("known arch");
        assert_eq!(c.id, CacheId::VIVT);
        assert!(!c.icache_aliasing());
    }

    #[test]
    fn microcontroller_is_neutral() {
        let c = classify_cache(CpuArchitecture::ARMv7M, &RegisterSnapshot::cortex_a7())
            .expect("known arch");
        assert_eq!(c, CacheClassification::neutral());
        assert_eq!(c.data(), DataCacheKind::Unknown);
    }

    #[test]
    fn unknown_generation_is_fatal() {
        let regs = RegisterSnapshot::with_id(0x4100_0000);
        assert_eq!(
            classify_cache(CpuArchitecture::Unknown, &regs),
            Err(FatalPrecondition::UnknownArchitecture { id: 0x4100_0000 })
        );
    }

    #[test]
    fn policy_from_section_flags() {
        assert_eq!(CachePolicy::from_section_flags(0x11c0e), CachePolicy::Writealloc);
        assert_eq!(CachePolicy::from_section_flags(0xc0e), CachePolicy::Writeback);
        assert_eq!(CachePolicy::from_section_flags(0xc02), CachePolicy::Uncached);
        assert_eq!(CachePolicy::from_section_flags(0xc06), CachePolicy::Buffered);
        assert_eq!(CachePolicy::from_section_flags(0xc0a), CachePolicy::Writethrough);
    }
}
