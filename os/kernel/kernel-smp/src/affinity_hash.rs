use crate::LogicalCoreTable;
use kernel_registers::mpidr::{Mpidr, affinity_level};
use log::{debug, warn};

/// Parameters of a collision-free hash from affinity id to a dense index.
///
/// Only the affinity bits that differ between the possible cores are kept;
/// each level's significant bits are packed down against the previous level's.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AffinityHash {
    /// Right shift applied to each level's masked bits.
    pub shift_aff: [u32; 3],
    /// Affinity bits that vary across the possible cores.
    pub mask: u32,
    /// Width of the resulting index.
    pub bits: u32,
}

impl AffinityHash {
    /// Hashes `hwid`. Distinct ids of the cores the parameters were built from
    /// map to distinct values below [`size`](Self::size).
    #[must_use]
    pub fn index(&self, hwid: u32) -> usize {
        let masked = hwid & self.mask;
        let index = (0..3).fold(0, |acc, level| {
            let level_mask = 0xFF << (level * Mpidr::LEVEL_BITS);
            acc | ((masked & level_mask) >> self.shift_aff[level as usize])
        });
        index as usize
    }

    /// Number of buckets, `2^bits`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        1 << self.bits
    }
}

/// Builds the hash over every possible core in `table`.
///
/// Must run after the CPU list has been installed; rerun if it changes.
#[must_use]
pub fn build_hash<const N: usize>(table: &LogicalCoreTable<N>) -> AffinityHash {
    let Some(first) = table.hwid(0) else {
        return AffinityHash::default();
    };

    let mask = table
        .possible_cores()
        .fold(0, |mask, (_, hwid)| mask | (hwid ^ first));
    debug!("mask of set bits 0x{mask:x}");

    let mut first_set = [0_u32; 3];
    let mut level_bits = [0_u32; 3];
    for level in 0..3_u32 {
        let aff = affinity_level(mask, level);
        // Highest set bit, one-based; 0 when empty.
        let last = u32::BITS - aff.leading_zeros();
        let first = if aff == 0 { 0 } else { aff.trailing_zeros() };
        first_set[level as usize] = first;
        level_bits[level as usize] = last - first;
    }

    let width = Mpidr::LEVEL_BITS;
    let hash = AffinityHash {
        shift_aff: [
            first_set[0],
            width + first_set[1] - level_bits[0],
            2 * width + first_set[2] - (level_bits[1] + level_bits[0]),
        ],
        mask,
        bits: level_bits.iter().sum(),
    };

    debug!(
        "MPIDR hash: aff0[{}] aff1[{}] aff2[{}] mask[0x{:x}] bits[{}]",
        hash.shift_aff[0], hash.shift_aff[1], hash.shift_aff[2], hash.mask, hash.bits
    );

    if hash.size() > 4 * table.nr_possible() {
        warn!("Large number of MPIDR hash buckets detected");
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(hwids: &[u32]) -> LogicalCoreTable<8> {
        let mut t = LogicalCoreTable::<8>::new();
        t.install_discovered(hwids[0], hwids).expect("valid list");
        t
    }

    #[test]
    fn single_core_hashes_to_zero() {
        let h = build_hash(&table(&[0x3]));
        assert_eq!(h.bits, 0);
        assert_eq!(h.size(), 1);
        assert_eq!(h.index(0x3), 0);
    }

    #[test]
    fn quad_core_cluster() {
        let h = build_hash(&table(&[0, 1, 2, 3]));
        assert_eq!(h.mask, 0x3);
        assert_eq!(h.shift_aff, [0, 6, 14]);
        assert_eq!(h.bits, 2);
        for hwid in 0..4 {
            assert_eq!(h.index(hwid), hwid as usize);
        }
    }

    #[test]
    fn big_little_two_clusters() {
        let h = build_hash(&table(&[0x000, 0x001, 0x100, 0x101]));
        assert_eq!(h.mask, 0x101);
        assert_eq!(h.bits, 2);
        assert_eq!(h.shift_aff, [0, 7, 14]);
        assert_eq!(h.index(0x000), 0);
        assert_eq!(h.index(0x001), 1);
        assert_eq!(h.index(0x100), 2);
        assert_eq!(h.index(0x101), 3);
    }

    #[test]
    fn sparse_ids_are_packed() {
        // Cores 0x4 and 0xC differ only in bit 3.
        let h = build_hash(&table(&[0x4, 0xC]));
        assert_eq!(h.mask, 0x8);
        assert_eq!(h.shift_aff[0], 3);
        assert_eq!(h.bits, 1);
        assert_ne!(h.index(0x4), h.index(0xC));
    }
}
