use crate::{CapabilitySet, FatalPrecondition, HwCap};

/// Short-descriptor section attribute bits used for the kernel's own mappings.
mod pmd {
    pub const TYPE_SECT: u32 = 0b10;
    pub const BUFFERABLE: u32 = 1 << 2;
    pub const CACHEABLE: u32 = 1 << 3;
    pub const AP_WRITE: u32 = 1 << 10;
    pub const AP_READ: u32 = 1 << 11;
    pub const TEX1: u32 = 1 << 12;
    pub const SHARED: u32 = 1 << 16;

    /// Write-back, write-allocate.
    pub const WBWA: u32 = TEX1 | CACHEABLE | BUFFERABLE;
    /// Write-back, no write-allocate.
    pub const WB: u32 = CACHEABLE | BUFFERABLE;

    pub const KERNEL_RW: u32 = TYPE_SECT | AP_WRITE | AP_READ;
}

/// One row of the supported-processor table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    /// `MIDR & cpu_mask` must equal this value.
    pub cpu_val: u32,
    pub cpu_mask: u32,
    /// Marketing name shown in the boot banner.
    pub cpu_name: &'static str,
    /// Machine name stem, completed with the endianness suffix.
    pub arch_name: &'static str,
    /// ELF platform stem, completed with the endianness suffix.
    pub elf_name: &'static str,
    /// Capabilities every matching core implements.
    pub hwcap: HwCap,
    /// Section attributes for kernel memory; the cache bits select the default policy.
    pub mm_mmu_flags: u32,
}

impl ProcInfo {
    #[inline]
    #[must_use]
    pub const fn matches(&self, id: u32) -> bool {
        id & self.cpu_mask == self.cpu_val
    }

    /// Base capability set before probing.
    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(self.hwcap)
    }
}

const V7_HWCAP: HwCap = HwCap::SWP
    .union(HwCap::HALF)
    .union(HwCap::THUMB)
    .union(HwCap::FAST_MULT)
    .union(HwCap::EDSP)
    .union(HwCap::TLS);

const V6_HWCAP: HwCap = HwCap::SWP
    .union(HwCap::HALF)
    .union(HwCap::THUMB)
    .union(HwCap::FAST_MULT)
    .union(HwCap::EDSP)
    .union(HwCap::JAVA);

const V7_SMP_MMU: u32 = pmd::KERNEL_RW | pmd::WBWA | pmd::SHARED;
const V6_UP_MMU: u32 = pmd::KERNEL_RW | pmd::WB;

const fn v7(cpu_val: u32, cpu_mask: u32) -> ProcInfo {
    ProcInfo {
        cpu_val,
        cpu_mask,
        cpu_name: "ARMv7 Processor",
        arch_name: "armv7",
        elf_name: "v7",
        hwcap: V7_HWCAP,
        mm_mmu_flags: V7_SMP_MMU,
    }
}

/// Supported processors, most specific first.
pub const PROC_INFO_TABLE: &[ProcInfo] = &[
    // Cortex-A5, A7, A9, A15 MPCore.
    v7(0x410f_c050, 0xff0f_fff0),
    v7(0x410f_c070, 0xff0f_fff0),
    v7(0x410f_c090, 0xff0f_fff0),
    v7(0x410f_c0f0, 0xff0f_fff0),
    // Any other core using the revised CPUID scheme.
    v7(0x000f_0000, 0x000f_0000),
    // ARM1136, whose TLS register fixup depends on the revision.
    ProcInfo {
        cpu_val: 0x4107_b360,
        cpu_mask: 0xff0f_fff0,
        cpu_name: "ARMv6-compatible processor",
        arch_name: "armv6",
        elf_name: "v6",
        hwcap: V6_HWCAP.union(HwCap::TLS),
        mm_mmu_flags: V6_UP_MMU,
    },
    // Any other ARMv6 part with the architecture field set to 7.
    ProcInfo {
        cpu_val: 0x0007_b000,
        cpu_mask: 0x0007_f000,
        cpu_name: "ARMv6-compatible processor",
        arch_name: "armv6",
        elf_name: "v6",
        hwcap: V6_HWCAP.union(HwCap::TLS),
        mm_mmu_flags: V6_UP_MMU,
    },
];

/// Finds the processor-info entry for `id`.
///
/// # Errors
/// [`FatalPrecondition::UnsupportedProcessor`] if no entry matches.
pub fn lookup_processor_type(id: u32) -> Result<&'static ProcInfo, FatalPrecondition> {
    PROC_INFO_TABLE
        .iter()
        .find(|p| p.matches(id))
        .ok_or(FatalPrecondition::UnsupportedProcessor { id })
}
