//! # Memory Layout

use kernel_memory_addresses::{PageSize, Size1M, Size4K};

/// Granule of the region allocator and of all region clipping.
pub const PAGE_SIZE: u64 = Size4K::SIZE;

/// Physical address of the start of RAM. Memory below is never registered.
///
/// Matches the QEMU `virt` machine.
pub const PHYS_OFFSET: u64 = 0x4000_0000;

/// Offset of the kernel image from [`PHYS_OFFSET`].
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const KERNEL_TEXT_OFFSET: u64 = 0x8000;

/// Highest physical address a kernel without the large physical address
/// extension can represent.
pub const PHYS_ADDR_CEILING: u64 = 0xFFFF_FFFF;

/// Physical memory directly mapped by the kernel, starting at [`PHYS_OFFSET`].
///
/// Memory above `PHYS_OFFSET + LOWMEM_SIZE` is highmem.
pub const LOWMEM_SIZE: u64 = 760 * Size1M::SIZE;

/// Number of cores the static per-core tables are sized for.
pub const NR_CPUS: usize = 8;

/// Capacity of the saved boot command line, including the terminator.
pub const COMMAND_LINE_SIZE: usize = 1024;

/// L1 data cache line size; per-core tables are padded to it.
pub const L1_CACHE_BYTES: usize = 64;

/// Default alignment of an automatically placed crash-capture kernel.
pub const CRASH_ALIGN: u64 = 128 * Size1M::SIZE;

const _: () = {
    assert!(PHYS_OFFSET.is_multiple_of(Size1M::SIZE));
    assert!(KERNEL_TEXT_OFFSET.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_ADDR_CEILING > PHYS_OFFSET);
    assert!(PHYS_OFFSET + LOWMEM_SIZE <= PHYS_ADDR_CEILING);
    assert!(L1_CACHE_BYTES.is_power_of_two());
    assert!(NR_CPUS > 0 && NR_CPUS <= 32);
};
