//! The early region allocator.

/// A physical range `[base, base + size)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MemblockRegion {
    pub base: u64,
    pub size: u64,
}

impl MemblockRegion {
    #[inline]
    #[must_use]
    pub const fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    const fn from_range(base: u64, end: u64) -> Self {
        Self {
            base,
            size: end - base,
        }
    }

    /// Exclusive end.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base + self.size
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, base: u64, end: u64) -> bool {
        self.base <= base && end <= self.end()
    }

    #[inline]
    #[must_use]
    pub const fn overlaps(&self, base: u64, end: u64) -> bool {
        self.base < end && base < self.end()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemblockError {
    #[error("empty range")]
    ZeroSize,
    #[error("range at {base:#x} wraps the address space")]
    Overflow { base: u64 },
    #[error("region table full")]
    TableFull,
    #[error("range {base:#x}+{size:#x} overlaps an existing reservation")]
    Overlap { base: u64, size: u64 },
    #[error("range {base:#x}+{size:#x} is not registered memory")]
    NotMemory { base: u64, size: u64 },
}

/// Interface of the early region allocator.
///
/// Region slices are sorted by base address and never overlap.
/// Implementations shared between cores must serialize mutation, see
/// [`LockedMemblock`](crate::LockedMemblock).
pub trait Memblock {
    /// Registers `[base, base + size)` as usable RAM.
    ///
    /// # Errors
    /// Empty or wrapping ranges, or no room to record the range.
    fn add(&mut self, base: u64, size: u64) -> Result<(), MemblockError>;

    /// Unregisters `[base, base + size)`; parts that were never added are ignored.
    ///
    /// # Errors
    /// Empty or wrapping ranges, or no room to split a region.
    fn remove(&mut self, base: u64, size: u64) -> Result<(), MemblockError>;

    /// Marks `[base, base + size)` as in use.
    ///
    /// # Errors
    /// The range is not entirely registered memory, overlaps an existing
    /// reservation, or there is no room to record it.
    fn reserve(&mut self, base: u64, size: u64) -> Result<(), MemblockError>;

    fn memory_regions(&self) -> &[MemblockRegion];

    fn reserved_regions(&self) -> &[MemblockRegion];

    /// Lowest registered address.
    fn start_of_dram(&self) -> Option<u64> {
        self.memory_regions().first().map(|r| r.base)
    }

    /// Exclusive end of the highest registered region.
    fn end_of_dram(&self) -> Option<u64> {
        self.memory_regions().last().map(MemblockRegion::end)
    }

    /// Total registered memory.
    fn phys_mem_size(&self) -> u64 {
        self.memory_regions().iter().map(|r| r.size).sum()
    }

    /// Registered memory below `limit`.
    fn mem_size_below(&self, limit: u64) -> u64 {
        self.memory_regions()
            .iter()
            .filter(|r| r.base < limit)
            .map(|r| r.end().min(limit) - r.base)
            .sum()
    }

    fn is_region_memory(&self, base: u64, size: u64) -> bool {
        base.checked_add(size)
            .is_some_and(|end| self.memory_regions().iter().any(|r| r.contains(base, end)))
    }

    fn is_region_reserved(&self, base: u64, size: u64) -> bool {
        base.checked_add(size)
            .is_some_and(|end| self.reserved_regions().iter().any(|r| r.overlaps(base, end)))
    }

    /// Calls `f(start, end)` for every registered, unreserved range in
    /// ascending order.
    fn for_each_free(&self, f: &mut dyn FnMut(u64, u64)) {
        let reserved = self.reserved_regions();
        for mem in self.memory_regions() {
            let mut cursor = mem.base;
            for r in reserved {
                if r.end() <= cursor {
                    continue;
                }
                if r.base >= mem.end() {
                    break;
                }
                if r.base > cursor {
                    f(cursor, r.base);
                }
                cursor = cursor.max(r.end());
            }
            if cursor < mem.end() {
                f(cursor, mem.end());
            }
        }
    }

    /// Highest `align`-aligned free range of `size` bytes within `[start, end)`.
    fn find_free(&self, start: u64, end: u64, size: u64, align: u64) -> Option<u64> {
        let align_mask = align.max(1) - 1;
        let mut best: Option<u64> = None;
        self.for_each_free(&mut |free_start, free_end| {
            let lo = free_start.max(start);
            let hi = free_end.min(end);
            if hi <= lo || hi - lo < size {
                return;
            }
            let candidate = (hi - size) & !align_mask;
            if candidate >= lo {
                best = Some(best.map_or(candidate, |b| b.max(candidate)));
            }
        });
        best
    }
}

/// Sorted, non-overlapping region list of fixed capacity.
#[derive(Debug, Copy, Clone)]
struct RegionArray<const N: usize> {
    regions: [MemblockRegion; N],
    len: usize,
}

impl<const N: usize> RegionArray<N> {
    const fn new() -> Self {
        Self {
            regions: [MemblockRegion::new(0, 0); N],
            len: 0,
        }
    }

    fn as_slice(&self) -> &[MemblockRegion] {
        &self.regions[..self.len]
    }

    fn push(&mut self, region: MemblockRegion) -> Result<(), MemblockError> {
        let slot = self.regions.get_mut(self.len).ok_or(MemblockError::TableFull)?;
        *slot = region;
        self.len += 1;
        Ok(())
    }

    /// Adds `[base, end)`, absorbing overlapping and adjacent regions.
    fn insert_merged(&mut self, base: u64, end: u64) -> Result<(), MemblockError> {
        let mut out = Self::new();
        let mut merged = MemblockRegion::from_range(base, end);
        let mut placed = false;

        for &r in self.as_slice() {
            if r.end() < merged.base {
                out.push(r)?;
            } else if r.base > merged.end() {
                if !placed {
                    out.push(merged)?;
                    placed = true;
                }
                out.push(r)?;
            } else {
                merged = MemblockRegion::from_range(
                    merged.base.min(r.base),
                    merged.end().max(r.end()),
                );
            }
        }
        if !placed {
            out.push(merged)?;
        }

        *self = out;
        Ok(())
    }

    /// Removes `[base, end)`, splitting regions that straddle it.
    fn subtract(&mut self, base: u64, end: u64) -> Result<(), MemblockError> {
        let mut out = Self::new();
        for &r in self.as_slice() {
            if !r.overlaps(base, end) {
                out.push(r)?;
                continue;
            }
            if r.base < base {
                out.push(MemblockRegion::from_range(r.base, base))?;
            }
            if r.end() > end {
                out.push(MemblockRegion::from_range(end, r.end()))?;
            }
        }
        *self = out;
        Ok(())
    }
}

/// Region allocator with room for `N` memory and `N` reserved regions.
#[derive(Debug, Copy, Clone)]
pub struct StaticMemblock<const N: usize> {
    memory: RegionArray<N>,
    reserved: RegionArray<N>,
}

impl<const N: usize> Default for StaticMemblock<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StaticMemblock<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memory: RegionArray::new(),
            reserved: RegionArray::new(),
        }
    }
}

fn checked_range(base: u64, size: u64) -> Result<u64, MemblockError> {
    if size == 0 {
        return Err(MemblockError::ZeroSize);
    }
    base.checked_add(size).ok_or(MemblockError::Overflow { base })
}

impl<const N: usize> Memblock for StaticMemblock<N> {
    fn add(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        let end = checked_range(base, size)?;
        self.memory.insert_merged(base, end)
    }

    fn remove(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        let end = checked_range(base, size)?;
        self.memory.subtract(base, end)
    }

    fn reserve(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        let end = checked_range(base, size)?;
        if !self.is_region_memory(base, size) {
            return Err(MemblockError::NotMemory { base, size });
        }
        if self.reserved.as_slice().iter().any(|r| r.overlaps(base, end)) {
            return Err(MemblockError::Overlap { base, size });
        }
        self.reserved.insert_merged(base, end)
    }

    fn memory_regions(&self) -> &[MemblockRegion] {
        self.memory.as_slice()
    }

    fn reserved_regions(&self) -> &[MemblockRegion] {
        self.reserved.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions<M: Memblock>(m: &M) -> Vec<(u64, u64)> {
        m.memory_regions().iter().map(|r| (r.base, r.size)).collect()
    }

    #[test]
    fn add_merges_overlapping_and_adjacent() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x1000, 0x1000).unwrap();
        m.add(0x3000, 0x1000).unwrap();
        m.add(0x2000, 0x1000).unwrap();
        assert_eq!(regions(&m), [(0x1000, 0x3000)]);

        m.add(0x1800, 0x4000).unwrap();
        assert_eq!(regions(&m), [(0x1000, 0x4800)]);
    }

    #[test]
    fn add_same_region_twice_is_noop() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x4000_0000, 0x1000_0000).unwrap();
        let before = regions(&m);
        m.add(0x4000_0000, 0x1000_0000).unwrap();
        assert_eq!(regions(&m), before);
    }

    #[test]
    fn add_keeps_order_and_reports_full() {
        let mut m = StaticMemblock::<2>::new();
        m.add(0x9000, 0x1000).unwrap();
        m.add(0x1000, 0x1000).unwrap();
        assert_eq!(regions(&m), [(0x1000, 0x1000), (0x9000, 0x1000)]);
        assert_eq!(m.add(0x5000, 0x1000), Err(MemblockError::TableFull));
        assert_eq!(regions(&m), [(0x1000, 0x1000), (0x9000, 0x1000)]);
    }

    #[test]
    fn remove_splits() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x0, 0x10000).unwrap();
        m.remove(0x4000, 0x2000).unwrap();
        assert_eq!(regions(&m), [(0x0, 0x4000), (0x6000, 0xa000)]);
        assert_eq!(m.phys_mem_size(), 0xe000);
        assert_eq!(m.start_of_dram(), Some(0));
        assert_eq!(m.end_of_dram(), Some(0x10000));
    }

    #[test]
    fn reserve_rules() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x10_0000, 0x10_0000).unwrap();
        m.reserve(0x10_0000, 0x1000).unwrap();
        assert_eq!(
            m.reserve(0x10_0800, 0x1000),
            Err(MemblockError::Overlap { base: 0x10_0800, size: 0x1000 })
        );
        assert_eq!(
            m.reserve(0x30_0000, 0x1000),
            Err(MemblockError::NotMemory { base: 0x30_0000, size: 0x1000 })
        );
        assert_eq!(m.add(0, 0), Err(MemblockError::ZeroSize));
        assert_eq!(m.add(u64::MAX, 2), Err(MemblockError::Overflow { base: u64::MAX }));
    }

    #[test]
    fn find_free_is_top_down_and_skips_reservations() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x4000_0000, 0x4000_0000).unwrap();
        m.reserve(0x7000_0000, 0x1000_0000).unwrap();
        assert_eq!(
            m.find_free(0, u64::MAX, 0x1000_0000, 0x1000_0000),
            Some(0x6000_0000)
        );
        assert_eq!(m.find_free(0, 0x4800_0000, 0x1000_0000, 0x1000_0000), None);
        assert_eq!(m.find_free(0, u64::MAX, 0x4000_0000, 1), None);
    }

    #[test]
    fn size_below_limit() {
        let mut m = StaticMemblock::<4>::new();
        m.add(0x4000_0000, 0x4000_0000).unwrap();
        assert_eq!(m.mem_size_below(0x6000_0000), 0x2000_0000);
        assert_eq!(m.mem_size_below(0x1000_0000), 0);
    }
}
