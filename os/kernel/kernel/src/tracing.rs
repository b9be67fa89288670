//! # Kernel Tracing helpers

use kernel_setup::BootSystemInfo;
use log::{debug, info};

pub fn trace_boot_system_info(bi: &BootSystemInfo) {
    let p = &bi.processor;
    info!(
        concat!(
            "Boot System Info:\n",
            "  CPU      = {name} [{id:08x}] variant 0x{variant:x} part 0x{part:03x} rev {rev} ({arch})\n",
            "  Features = {features}\n",
            "  Machine  = {machine}, ELF platform = {elf}\n",
            "  Caches   = {dcache} data, {icache} instruction, policy {policy}\n",
            "  Board    = {board}, reboot mode {reboot:?}\n",
            "  Cmdline  = {cmdline}"
        ),
        name = p.cpu_name(),
        id = p.identity.id,
        variant = p.identity.variant,
        part = p.identity.part,
        rev = p.identity.revision,
        arch = p.identity.architecture,
        features = p.capabilities,
        machine = p.machine(),
        elf = p.elf_platform(),
        dcache = p.cache.data(),
        icache = p.cache.instruction(),
        policy = p.cache_policy,
        board = bi.machine_name,
        reboot = bi.reboot_mode,
        cmdline = bi.command_line,
    );

    for (cpu, hwid) in bi.cpus.possible_cores() {
        info!("  CPU{cpu} -> MPIDR 0x{hwid:x}");
    }
    if let Some(hash) = bi.mpidr_hash {
        debug!("  MPIDR hash buckets = {}", hash.size());
    }
    if let Some(crash) = bi.crash_kernel {
        info!("  Crash kernel = 0x{:08x}+0x{:x}", crash.base, crash.size);
    }

    info!("iomem:\n{}", bi.resources.display(bi.resources.iomem()));
    info!("ioports:\n{}", bi.resources.display(bi.resources.ioport()));
}
