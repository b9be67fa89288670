//! # Kernel Entry Point
//!
//! Boot flow on the QEMU `virt` machine:
//!
//! ```text
//! _start            mask interrupts, clear .bss, boot stack
//!  └─ kernel_entry  logger, provisional logical CPU map
//!      └─ kernel_main
//!          ├─ setup_arch        identification, memory, resources, CPU map
//!          ├─ cpu_init          exception stacks of logical CPU 0
//!          ├─ publish           BootSystemInfo for the other cores
//!          └─ machine hooks     init_machine, then init_late
//! ```

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod platform;
mod tracing;

use core::fmt::Display;
use kernel_cpu::{Cp15, ExceptionStackTable, apply_stack_layout};
use kernel_info::boot::MachineDesc;
use kernel_info::memory::NR_CPUS;
use kernel_memblock::{LockedMemblock, StaticMemblock};
use kernel_qemu::QemuLogger;
#[cfg(feature = "qemu")]
use kernel_qemu::qemu_trace;
use kernel_registers::LoadRegisterUnsafe;
use kernel_registers::mpidr::Mpidr;
use kernel_setup::{BootSystemInfo, SetupConfig, customize_machine, init_machine_late, setup_arch};
use kernel_smp::{Dccmvac, LogicalCoreTable, Published};
use log::{LevelFilter, error};
use platform::QemuVirt;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    error!("{info}");
    halt()
}

/// Parks the core for good.
fn halt() -> ! {
    loop {
        // SAFETY: `wfe` has no memory effects.
        unsafe { core::arch::asm!("wfe", options(nomem, nostack, preserves_flags)) };
    }
}

fn fatal(e: impl Display) -> ! {
    error!("{e}");
    halt()
}

/// Stack size.
const BOOT_STACK_SIZE: usize = 64 * 1024;

/// Regions the early allocator can track.
const MEMBLOCK_REGIONS: usize = 128;

/// Command line used until the hardware descriptor is parsed.
const BOOT_COMMAND_LINE: &str = match option_env!("KERNEL_CMDLINE") {
    Some(cmdline) => cmdline,
    None => "console=ttyAMA0",
};

/// 8-byte aligned stack, as the AAPCS requires at public interfaces.
#[repr(align(8))]
struct Aligned<const N: usize>([u8; N]);

#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned<BOOT_STACK_SIZE> = Aligned([0; BOOT_STACK_SIZE]);

static MEMBLOCK: LockedMemblock<StaticMemblock<MEMBLOCK_REGIONS>> =
    LockedMemblock::new(StaticMemblock::new());

static EXCEPTION_STACKS: ExceptionStackTable<NR_CPUS> = ExceptionStackTable::new();

static BOOT_INFO: Published<BootSystemInfo> = Published::new();

/// The kernel entry point.
///
/// # Boot Protocol
/// QEMU enters here in SVC mode with the MMU and caches off, `r0 = 0`,
/// `r1` = machine number and `r2` = physical address of the hardware
/// descriptor.
///
/// # Naked function & Stack
/// Naked so that no prologue touches memory before a stack exists. `.bss`
/// (which holds the boot stack) is cleared before the first call.
#[unsafe(no_mangle)]
#[unsafe(naked)]
#[unsafe(link_section = ".text.head")]
pub extern "C" fn _start() -> ! {
    core::arch::naked_asm!(
        "cpsid if",

        // Clear .bss; r2 must survive.
        "ldr r4, ={bss_start}",
        "ldr r5, ={bss_end}",
        "mov r6, #0",
        "1:",
        "cmp r4, r5",
        "strlo r6, [r4], #4",
        "blo 1b",

        "ldr sp, ={stack_sym}",
        "add sp, sp, #{stack_size}",

        // Hardware descriptor pointer becomes the first argument.
        "mov r0, r2",
        "bl {rust_entry}",
        "2:",
        "wfe",
        "b 2b",
        bss_start = sym __bss_start,
        bss_end = sym __bss_end,
        stack_sym = sym BOOT_STACK,
        stack_size = const BOOT_STACK_SIZE,
        rust_entry = sym kernel_entry,
    );
}

unsafe extern "C" {
    static __bss_start: u8;
    static __bss_end: u8;
}

/// Kernel entry running on the boot stack.
#[unsafe(no_mangle)]
extern "C" fn kernel_entry(dtb: usize) -> ! {
    #[cfg(feature = "qemu")]
    qemu_trace!("Kernel reporting to QEMU!\n");

    // The logger holds no per-core state, so it may precede the CPU map.
    QemuLogger::init(LevelFilter::Debug).ok();

    // SAFETY: we are at PL1 on the boot core.
    let boot = unsafe { Mpidr::load_unsafe() };
    let cpus = LogicalCoreTable::assign_logical_ids(boot, cfg!(feature = "smp"), NR_CPUS);

    kernel_main(dtb, cpus)
}

fn kernel_main(dtb: usize, cpus: LogicalCoreTable<NR_CPUS>) -> ! {
    let config = SetupConfig {
        smp: cfg!(feature = "smp"),
        ..SetupConfig::KERNEL
    };
    let mdesc = MachineDesc::generic("Generic DT based system");

    // SAFETY: PL1, boot core.
    let regs = unsafe { Cp15::new() };

    let info = {
        let mut platform = QemuVirt::new(MEMBLOCK.lock(), dtb);
        platform.add_memory(config.limits);
        setup_arch(&mut platform, &regs, &mdesc, BOOT_COMMAND_LINE, &config, cpus)
            .unwrap_or_else(|e| fatal(e))
    };

    let layout = EXCEPTION_STACKS.cpu_init(0).unwrap_or_else(|e| fatal(e));
    // SAFETY: PL1 with interrupts masked; the table is a static.
    unsafe { apply_stack_layout(&layout) };

    // SAFETY: PL1; cache maintenance by address is always permitted there.
    let sync = unsafe { Dccmvac::new() };
    let Ok(info) = BOOT_INFO.publish(info, &sync) else {
        fatal("boot information published twice")
    };

    tracing::trace_boot_system_info(info);

    customize_machine(&mdesc);
    init_machine_late(&mdesc);

    #[cfg(feature = "qemu")]
    qemu_trace!("Boot CPU idle\n");
    halt()
}
