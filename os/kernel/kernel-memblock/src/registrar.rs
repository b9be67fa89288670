use crate::memblock::{Memblock, MemblockError, MemblockRegion};
use kernel_info::memory::{PAGE_SIZE, PHYS_ADDR_CEILING, PHYS_OFFSET};
use kernel_memory_addresses::{PhysicalAddress, Size4K};
use log::{error, info};

/// Bounds applied to every candidate RAM range.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegionLimits {
    /// Memory below this address is never registered.
    pub phys_offset: u64,
    /// Highest representable physical address, or `None` when the kernel
    /// can address the full 64-bit range.
    pub ceiling: Option<u64>,
}

impl RegionLimits {
    /// [`PHYS_OFFSET`] with a 32-bit physical address space.
    pub const KERNEL: Self = Self::new(PHYS_OFFSET, Some(PHYS_ADDR_CEILING));

    #[must_use]
    pub const fn new(phys_offset: u64, ceiling: Option<u64>) -> Self {
        Self {
            phys_offset,
            ceiling,
        }
    }
}

impl Default for RegionLimits {
    fn default() -> Self {
        Self::KERNEL
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("memory at {start:#010x} lies outside the physical address space")]
    AddressOutOfRange { start: u64 },
    #[error("memory {start:#010x}-{end:#010x} lies below the physical base")]
    BelowPhysicalBase { start: u64, end: u64 },
    #[error("region is empty after alignment")]
    EmptyRegion,
    #[error(transparent)]
    Allocator(#[from] MemblockError),
}

/// Validates and clips RAM ranges before they reach the region allocator.
#[derive(Debug, Copy, Clone, Default)]
pub struct MemoryRegistrar {
    limits: RegionLimits,
    user_defined: bool,
}

impl MemoryRegistrar {
    #[must_use]
    pub const fn new(limits: RegionLimits) -> Self {
        Self {
            limits,
            user_defined: false,
        }
    }

    #[must_use]
    pub const fn limits(&self) -> RegionLimits {
        self.limits
    }

    /// Whether a `mem=` range has replaced the discovered memory.
    #[must_use]
    pub const fn user_defined(&self) -> bool {
        self.user_defined
    }

    /// Computes the page-aligned part of `[start, start + size)` that may be
    /// registered, without touching any allocator.
    ///
    /// # Errors
    /// See [`RegionError`]; every error means nothing of the range is usable.
    pub fn clip(&self, start: u64, size: u64) -> Result<MemblockRegion, RegionError> {
        let Some(aligned) = PhysicalAddress::new(start).align_up::<Size4K>() else {
            error!("Ignoring memory at 0x{start:08x} outside physical address space");
            return Err(RegionError::AddressOutOfRange { start });
        };
        let mut base = aligned.as_u64();
        let mut size = size.saturating_sub(base - start);

        if let Some(ceiling) = self.limits.ceiling {
            if base > ceiling {
                error!("Ignoring memory at 0x{start:08x} outside 32-bit physical address space");
                return Err(RegionError::AddressOutOfRange { start });
            }
            if base.saturating_add(size) > ceiling {
                info!("Truncating memory at 0x{start:08x} to fit in 32-bit physical address space");
                size = ceiling - base;
            }
        }

        let phys_offset = self.limits.phys_offset;
        if base < phys_offset {
            let end = base.saturating_add(size);
            if end <= phys_offset {
                info!("Ignoring memory below PHYS_OFFSET: 0x{base:08x}-0x{end:08x}");
                return Err(RegionError::BelowPhysicalBase { start: base, end });
            }
            info!("Ignoring memory below PHYS_OFFSET: 0x{base:08x}-0x{phys_offset:08x}");
            size -= phys_offset - base;
            base = phys_offset;
        }

        size &= !(PAGE_SIZE - 1);
        if size == 0 {
            return Err(RegionError::EmptyRegion);
        }
        Ok(MemblockRegion::new(base, size))
    }

    /// Clips `[start, start + size)` and registers the remainder.
    ///
    /// # Errors
    /// The range was rejected by [`clip`](Self::clip) or by the allocator.
    /// Nothing is registered in either case.
    pub fn add_region<M: Memblock + ?Sized>(
        &self,
        memblock: &mut M,
        start: u64,
        size: u64,
    ) -> Result<MemblockRegion, RegionError> {
        let region = self.clip(start, size)?;
        memblock.add(region.base, region.size)?;
        Ok(region)
    }

    /// Registers a range given on the command line. The first call drops
    /// every previously discovered region.
    ///
    /// # Errors
    /// As [`add_region`](Self::add_region), or the allocator failed to drop
    /// the discovered memory.
    pub fn add_user_region<M: Memblock + ?Sized>(
        &mut self,
        memblock: &mut M,
        start: u64,
        size: u64,
    ) -> Result<MemblockRegion, RegionError> {
        if !self.user_defined {
            self.user_defined = true;
            if let (Some(first), Some(last)) = (memblock.start_of_dram(), memblock.end_of_dram()) {
                memblock.remove(first, last - first)?;
            }
        }
        self.add_region(memblock, start, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticMemblock;

    fn registrar(phys_offset: u64) -> MemoryRegistrar {
        MemoryRegistrar::new(RegionLimits::new(phys_offset, Some(PHYS_ADDR_CEILING)))
    }

    #[test]
    fn aligned_region_is_registered_as_is() {
        let mut m = StaticMemblock::<4>::new();
        let r = registrar(0).add_region(&mut m, 0x1000, 0x2000).unwrap();
        assert_eq!(r, MemblockRegion::new(0x1000, 0x2000));
        assert_eq!(m.memory_regions(), [MemblockRegion::new(0x1000, 0x2000)]);
    }

    #[test]
    fn unaligned_start_is_rounded_up_and_size_down() {
        let mut m = StaticMemblock::<4>::new();
        let r = registrar(0).add_region(&mut m, 0x500, 0x2000).unwrap();
        assert_eq!(r, MemblockRegion::new(0x1000, 0x1000));
    }

    #[test]
    fn region_below_base_is_rejected() {
        let mut m = StaticMemblock::<4>::new();
        assert_eq!(
            registrar(0x8000).add_region(&mut m, 0x0, 0x4000),
            Err(RegionError::BelowPhysicalBase { start: 0, end: 0x4000 })
        );
        assert!(m.memory_regions().is_empty());
    }

    #[test]
    fn region_straddling_base_is_trimmed() {
        let r = registrar(0x8000).clip(0x4000, 0x8000).unwrap();
        assert_eq!(r, MemblockRegion::new(0x8000, 0x4000));
    }

    #[test]
    fn alignment_larger_than_size_leaves_nothing() {
        assert_eq!(registrar(0).clip(0x1001, 0x10), Err(RegionError::EmptyRegion));
        assert_eq!(registrar(0).clip(0x1000, 0xfff), Err(RegionError::EmptyRegion));
    }

    #[test]
    fn ceiling_truncates_and_rejects() {
        let r = registrar(0).clip(0xF000_0000, 0x2000_0000).unwrap();
        assert_eq!(r, MemblockRegion::new(0xF000_0000, 0x0FFF_F000));

        assert_eq!(
            registrar(0).clip(0x1_0000_0000, 0x1000),
            Err(RegionError::AddressOutOfRange { start: 0x1_0000_0000 })
        );

        let wide = MemoryRegistrar::new(RegionLimits::new(0, None));
        assert_eq!(
            wide.clip(0x1_0000_0000, 0x1000),
            Ok(MemblockRegion::new(0x1_0000_0000, 0x1000))
        );
    }

    #[test]
    fn start_near_top_of_address_space() {
        let wide = MemoryRegistrar::new(RegionLimits::new(0, None));
        assert_eq!(
            wide.clip(u64::MAX - 0x10, 0x10),
            Err(RegionError::AddressOutOfRange { start: u64::MAX - 0x10 })
        );
    }

    #[test]
    fn user_region_replaces_discovered_memory_once() {
        let mut m = StaticMemblock::<4>::new();
        let mut reg = registrar(0x4000_0000);
        reg.add_region(&mut m, 0x4000_0000, 0x4000_0000).unwrap();

        reg.add_user_region(&mut m, 0x4000_0000, 0x1000_0000).unwrap();
        reg.add_user_region(&mut m, 0x6000_0000, 0x1000_0000).unwrap();
        assert!(reg.user_defined());
        assert_eq!(
            m.memory_regions(),
            [
                MemblockRegion::new(0x4000_0000, 0x1000_0000),
                MemblockRegion::new(0x6000_0000, 0x1000_0000)
            ]
        );
    }
}
