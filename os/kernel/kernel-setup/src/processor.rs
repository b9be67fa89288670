use core::fmt;
use kernel_cpu::{
    CacheClassification, CachePolicy, CapabilitySet, CpuIdentity, FatalPrecondition, IdRegisters,
    ProcInfo, classify_cache, identify, lookup_processor_type,
};
use log::{error, info};

/// Byte order the kernel was built for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub const NATIVE: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };

    /// Suffix appended to machine and platform names.
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Self::Little => 'l',
            Self::Big => 'b',
        }
    }
}

/// A name stem completed with the endianness suffix, e.g. `armv7l`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformName {
    pub stem: &'static str,
    pub endianness: Endianness,
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.endianness.suffix())
    }
}

/// Everything learned about the boot processor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcessorInfo {
    pub identity: CpuIdentity,
    pub proc_info: &'static ProcInfo,
    pub capabilities: CapabilitySet,
    pub cache: CacheClassification,
    pub cache_policy: CachePolicy,
    /// System control register value at the time of identification.
    pub control: u32,
    pub endianness: Endianness,
}

impl ProcessorInfo {
    #[must_use]
    pub const fn cpu_name(&self) -> &'static str {
        self.proc_info.cpu_name
    }

    /// `uname -m` value.
    #[must_use]
    pub const fn machine(&self) -> PlatformName {
        PlatformName {
            stem: self.proc_info.arch_name,
            endianness: self.endianness,
        }
    }

    /// ELF platform string reported to user space.
    #[must_use]
    pub const fn elf_platform(&self) -> PlatformName {
        PlatformName {
            stem: self.proc_info.elf_name,
            endianness: self.endianness,
        }
    }
}

/// Identifies the boot processor and derives its capabilities and cache
/// behaviour.
///
/// `control` is the current system control register, shown in the banner.
///
/// # Errors
/// The processor is not in the processor-info table or its architecture
/// cannot be determined.
pub fn setup_processor<R: IdRegisters + ?Sized>(
    regs: &R,
    control: u32,
    thumb_enabled: bool,
) -> Result<ProcessorInfo, FatalPrecondition> {
    let id = regs.read_id().into_bits();
    let proc_info = lookup_processor_type(id).inspect_err(|e| error!("{e}"))?;

    let identity = identify(regs);
    let arch = identity.require_known().inspect_err(|e| error!("{e}"))?;

    info!(
        "CPU: {} [{:08x}] revision {} ({}), cr={:08x}",
        proc_info.cpu_name, id, identity.revision, arch, control
    );

    let mut capabilities = proc_info.capabilities();
    capabilities.amplify(arch, regs);
    capabilities.apply_config_mask(thumb_enabled);
    let cache_policy = CachePolicy::from_section_flags(proc_info.mm_mmu_flags);
    capabilities.apply_fixup(regs);

    let cache = classify_cache(arch, regs)?;

    Ok(ProcessorInfo {
        identity,
        proc_info,
        capabilities,
        cache,
        cache_policy,
        control,
        endianness: Endianness::NATIVE,
    })
}
