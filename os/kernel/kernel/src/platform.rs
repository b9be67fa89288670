//! The QEMU `virt` board as seen by architecture setup.

use crate::MEMBLOCK_REGIONS;
use kernel_info::boot::{KernelImage, MachineDesc};
use kernel_memblock::{LockedMemblockGuard, MemoryRegistrar, RegionLimits, StaticMemblock};
use kernel_registers::LoadRegisterUnsafe;
use kernel_registers::mpidr::Mpidr;
use kernel_registers::sctlr::Sctlr;
use kernel_setup::{Platform, ProcessorInfo};
use log::{info, warn};

/// RAM bank of the `virt` machine at its default size.
const VIRT_RAM_BASE: u64 = 0x4000_0000;
const VIRT_RAM_SIZE: u64 = 128 << 20;

/// Affinity ids of `-smp 4`: one cluster, cores 0 to 3.
const VIRT_CPU_HWIDS: [u32; 4] = [0x0, 0x1, 0x2, 0x3];

unsafe extern "C" {
    static _text: u8;
    static _etext: u8;
    static _sdata: u8;
    static _edata: u8;
}

pub struct QemuVirt {
    memblock: LockedMemblockGuard<'static, StaticMemblock<MEMBLOCK_REGIONS>>,
    dtb: usize,
    boot_hwid: u32,
}

impl QemuVirt {
    pub fn new(
        memblock: LockedMemblockGuard<'static, StaticMemblock<MEMBLOCK_REGIONS>>,
        dtb: usize,
    ) -> Self {
        // SAFETY: the kernel runs at PL1.
        let boot_hwid = unsafe { Mpidr::load_unsafe() }.hwid();
        Self {
            memblock,
            dtb,
            boot_hwid,
        }
    }

    /// Registers the board's RAM as the hardware descriptor would.
    pub fn add_memory(&mut self, limits: RegionLimits) {
        info!("Hardware descriptor at 0x{:08x}", self.dtb);
        let registrar = MemoryRegistrar::new(limits);
        if let Err(e) = registrar.add_region(&mut *self.memblock, VIRT_RAM_BASE, VIRT_RAM_SIZE) {
            warn!("RAM 0x{VIRT_RAM_BASE:08x}+0x{VIRT_RAM_SIZE:x}: {e}");
        }
    }
}

fn phys(sym: *const u8) -> u64 {
    // Identity addressing: with the MMU off a symbol address is physical.
    u64::try_from(sym.addr()).unwrap_or_default()
}

impl Platform for QemuVirt {
    type Memblock = StaticMemblock<MEMBLOCK_REGIONS>;

    fn memblock(&mut self) -> &mut Self::Memblock {
        &mut self.memblock
    }

    fn control_register(&self) -> u32 {
        // SAFETY: the kernel runs at PL1.
        unsafe { Sctlr::load_unsafe() }.into_bits()
    }

    fn kernel_image(&self) -> KernelImage {
        KernelImage {
            code_start: phys(&raw const _text),
            code_end: phys(&raw const _etext),
            data_start: phys(&raw const _sdata),
            data_end: phys(&raw const _edata),
        }
    }

    fn boot_hwid(&self) -> u32 {
        self.boot_hwid
    }

    fn cpu_hwids(&self) -> &[u32] {
        if cfg!(feature = "smp") {
            &VIRT_CPU_HWIDS
        } else {
            &VIRT_CPU_HWIDS[..1]
        }
    }

    fn paging_init(&mut self, mdesc: &MachineDesc, processor: &ProcessorInfo) {
        info!("Memory policy: Data cache {}", processor.cache_policy);
        info!("{}: running with the MMU off", mdesc.name);
    }
}
