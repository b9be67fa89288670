use crate::cmdline::{CommandLine, FpeType, MemParam, ParamError};
use crate::crashkernel::reserve_crashkernel;
use crate::processor::{ProcessorInfo, setup_processor};
use crate::resources::request_standard_resources;
use crate::{BootResources, SetupError};
use kernel_cpu::{IdRegisters, THUMB_ENABLED};
use kernel_info::boot::{KernelImage, MachineDesc, RebootMode, RestartFn};
use kernel_info::memory::{LOWMEM_SIZE, NR_CPUS, PHYS_OFFSET};
use kernel_memblock::{Memblock, MemblockRegion, MemoryRegistrar, RegionLimits};
use kernel_smp::{AffinityHash, LogicalCoreTable, build_hash};
use log::{debug, info, warn};

/// Runtime knobs of [`setup_arch`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub limits: RegionLimits,
    /// Whether secondary cores will be brought up.
    pub smp: bool,
    /// End of directly mapped memory.
    pub lowmem_limit: u64,
    pub thumb_enabled: bool,
}

impl SetupConfig {
    pub const KERNEL: Self = Self {
        limits: RegionLimits::KERNEL,
        smp: false,
        lowmem_limit: PHYS_OFFSET + LOWMEM_SIZE,
        thumb_enabled: THUMB_ENABLED,
    };
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self::KERNEL
    }
}

/// What architecture setup needs from the board and the rest of the kernel.
pub trait Platform {
    type Memblock: Memblock + ?Sized;

    /// The region allocator, already holding the memory found in the
    /// hardware descriptor.
    fn memblock(&mut self) -> &mut Self::Memblock;

    /// Current system control register.
    fn control_register(&self) -> u32;

    fn kernel_image(&self) -> KernelImage;

    /// Affinity id of the boot core.
    fn boot_hwid(&self) -> u32;

    /// Affinity ids of all cores listed in the hardware descriptor.
    fn cpu_hwids(&self) -> &[u32];

    /// Builds the kernel page tables. Runs once memory is final.
    fn paging_init(&mut self, mdesc: &MachineDesc, processor: &ProcessorInfo) {
        let _ = (mdesc, processor);
    }
}

/// Parameters recognized before memory setup.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EarlyParams {
    pub fpe: Option<FpeType>,
}

/// Applies `mem=` and records `fpe=`. Bad values are logged and ignored.
pub fn parse_early_params<M: Memblock + ?Sized>(
    cmdline: &CommandLine,
    registrar: &mut MemoryRegistrar,
    memblock: &mut M,
) -> EarlyParams {
    let mut params = EarlyParams::default();
    for (key, value) in cmdline.params() {
        match (key, value) {
            ("mem", Some(value)) => {
                let parsed = MemParam::parse(value, registrar.limits().phys_offset);
                match parsed {
                    Ok(MemParam { size, start }) => {
                        if let Err(e) = registrar.add_user_region(memblock, start, size) {
                            warn!("mem={value}: {e}");
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            ("mem", None) => warn!("{}", ParamError::MissingValue { key: "mem" }),
            ("fpe", Some(value)) => params.fpe = Some(FpeType::parse(value)),
            _ => {}
        }
    }
    params
}

/// Facts established during architecture setup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct BootSystemInfo {
    pub processor: ProcessorInfo,
    pub machine_name: &'static str,
    pub reboot_mode: RebootMode,
    pub restart: Option<RestartFn>,
    pub command_line: CommandLine,
    pub fpe: Option<FpeType>,
    pub cpus: LogicalCoreTable<NR_CPUS>,
    /// Present on SMP configurations.
    pub mpidr_hash: Option<AffinityHash>,
    pub crash_kernel: Option<MemblockRegion>,
    pub resources: BootResources,
}

/// Architecture-specific boot setup of the boot core.
///
/// `cpus` is the provisional numbering made at entry; on SMP it is replaced
/// by the cores of the hardware descriptor.
///
/// # Errors
/// Only the conditions in [`SetupError`]; region, parameter and crash
/// kernel problems are logged and boot continues without them.
pub fn setup_arch<P, R>(
    platform: &mut P,
    regs: &R,
    mdesc: &MachineDesc,
    boot_command_line: &str,
    config: &SetupConfig,
    mut cpus: LogicalCoreTable<NR_CPUS>,
) -> Result<BootSystemInfo, SetupError>
where
    P: Platform + ?Sized,
    R: IdRegisters + ?Sized,
{
    let processor = setup_processor(regs, platform.control_register(), config.thumb_enabled)?;

    let reboot_mode = if mdesc.reboot_mode == RebootMode::Hard {
        RebootMode::default()
    } else {
        mdesc.reboot_mode
    };

    let command_line = CommandLine::new(boot_command_line);
    let mut registrar = MemoryRegistrar::new(config.limits);
    let early = parse_early_params(&command_line, &mut registrar, platform.memblock());

    platform.paging_init(mdesc, &processor);

    let image = platform.kernel_image();
    let mut resources = BootResources::new();
    request_standard_resources(platform.memblock(), mdesc, &image, &mut resources);

    let mpidr_hash = if config.smp {
        if let Err(e) = cpus.install_discovered(platform.boot_hwid(), platform.cpu_hwids()) {
            warn!("{e}, keeping the provisional CPU map");
        }
        Some(build_hash(&cpus))
    } else {
        None
    };

    let crash_kernel = reserve_crashkernel(
        &command_line,
        platform.memblock(),
        &mut resources,
        config.lowmem_limit,
    )
    .ok()
    .flatten();

    if let Some(init_early) = mdesc.init_early {
        init_early();
    }

    info!(
        "{}: {} on {}, {} cache policy",
        mdesc.name,
        processor.machine(),
        processor.cpu_name(),
        processor.cache_policy
    );

    Ok(BootSystemInfo {
        processor,
        machine_name: mdesc.name,
        reboot_mode,
        restart: mdesc.restart,
        command_line,
        fpe: early.fpe,
        cpus,
        mpidr_hash,
        crash_kernel,
        resources,
    })
}

/// Board device setup, run after [`setup_arch`] once drivers can register.
///
/// Returns `false` if the board has no hook; its devices then come from the
/// hardware descriptor alone.
pub fn customize_machine(mdesc: &MachineDesc) -> bool {
    let Some(init_machine) = mdesc.init_machine else {
        debug!("{}: no machine init hook", mdesc.name);
        return false;
    };
    init_machine();
    true
}

/// Last board hook, after every other boot-time initialization.
pub fn init_machine_late(mdesc: &MachineDesc) {
    if let Some(init_late) = mdesc.init_late {
        init_late();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memblock::StaticMemblock;

    #[test]
    fn first_mem_param_replaces_discovered_memory() {
        let mut m = StaticMemblock::<8>::new();
        m.add(0x4000_0000, 0x4000_0000).unwrap();
        let mut registrar = MemoryRegistrar::new(RegionLimits::KERNEL);
        let cl = CommandLine::new("mem=256M mem=64M@0x60000000 fpe=nwfpe");

        let params = parse_early_params(&cl, &mut registrar, &mut m);

        assert_eq!(params.fpe, Some(FpeType::parse("nwfpe")));
        assert_eq!(
            m.memory_regions(),
            [
                MemblockRegion::new(0x4000_0000, 0x1000_0000),
                MemblockRegion::new(0x6000_0000, 0x0400_0000)
            ]
        );
    }

    #[test]
    fn bad_mem_param_is_ignored() {
        let mut m = StaticMemblock::<8>::new();
        m.add(0x4000_0000, 0x4000_0000).unwrap();
        let mut registrar = MemoryRegistrar::new(RegionLimits::KERNEL);
        let cl = CommandLine::new("mem mem=lots");

        let params = parse_early_params(&cl, &mut registrar, &mut m);

        assert_eq!(params, EarlyParams::default());
        assert_eq!(m.phys_mem_size(), 0x4000_0000);
    }
}
