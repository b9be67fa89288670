//! Barriers and single-line data cache maintenance.

use core::arch::asm;

/// Instruction synchronization barrier.
///
/// Required between a CP15 write and a dependent CP15 read, e.g. after
/// selecting a cache level in `CSSELR` and before reading `CCSIDR`.
#[inline]
pub fn isb() {
    unsafe {
        asm!("isb", options(nostack, preserves_flags));
    }
}

/// Data synchronization barrier (full system).
#[inline]
pub fn dsb() {
    unsafe {
        asm!("dsb", options(nostack, preserves_flags));
    }
}

/// Clean the data cache line holding `addr` to the point of coherency (`DCCMVAC`).
///
/// # Safety
/// Must run at PL1.
#[inline]
pub unsafe fn clean_dcache_line_poc(addr: usize) {
    unsafe {
        asm!(
            "mcr p15, 0, {}, c7, c10, 1",
            in(reg) addr,
            options(nostack, preserves_flags)
        );
    }
}
