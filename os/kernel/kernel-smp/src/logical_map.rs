use kernel_registers::mpidr::{Mpidr, affinity_level};
use log::{info, warn};

/// Marks an unpopulated logical slot. Never a valid `MPIDR[23:0]` value.
pub const MPIDR_INVALID: u32 = 0xFF00_0000;

/// Affinity bits of `MPIDR`.
pub const MPIDR_HWID_BITMASK: u32 = Mpidr::HWID_BITMASK;

/// Rejections of a descriptor-reported CPU list.
///
/// The table is left untouched when any of these is returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CpuMapError {
    #[error("CPU hwid {hwid:#x} has bits outside MPIDR[23:0]")]
    InvalidHwid { hwid: u32 },
    #[error("duplicate CPU hwid {hwid:#x}")]
    DuplicateHwid { hwid: u32 },
    #[error("boot CPU hwid {boot_hwid:#x} missing from the CPU list")]
    BootCpuMissing { boot_hwid: u32 },
}

/// Logical core number to hardware affinity id, for up to `N` cores.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LogicalCoreTable<const N: usize> {
    map: [u32; N],
    possible: usize,
}

impl<const N: usize> Default for LogicalCoreTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LogicalCoreTable<N> {
    /// A table with every slot invalid.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: [MPIDR_INVALID; N],
            possible: 0,
        }
    }

    /// Provisional numbering from the boot core's own `MPIDR`.
    ///
    /// Logical 0 is the boot core. Every other slot `i` gets `i`, except the
    /// slot whose index equals the boot core's id, which takes the unused
    /// value 0. Only meaningful while physical ids are small dense integers;
    /// [`install_discovered`](Self::install_discovered) supersedes it.
    ///
    /// Slot 0 holds the whole masked `MPIDR` (all affinity levels), not just
    /// `Aff0` as a single-cluster numbering would. A boot core on a second
    /// cluster therefore keeps its cluster bits and never collides with the
    /// index-valued slots.
    #[must_use]
    pub fn assign_logical_ids(boot: Mpidr, smp: bool, nr_cpu_ids: usize) -> Self {
        let hwid = if smp { boot.hwid() } else { 0 };
        let possible = nr_cpu_ids.clamp(1, N);

        let mut table = Self::new();
        table.map[0] = hwid;
        for (i, slot) in (1u32..).zip(&mut table.map[1..possible]) {
            *slot = if i == hwid { 0 } else { i };
        }
        table.possible = possible;

        info!("Booting on physical CPU 0x{hwid:x}");
        table
    }

    /// Replaces the numbering with the cores listed by the hardware descriptor.
    ///
    /// `boot_hwid` becomes logical 0; the others follow in list order. Cores
    /// beyond the table's capacity are dropped with a warning. Returns the
    /// number of possible cores.
    ///
    /// # Errors
    /// See [`CpuMapError`]. On error the current numbering stays in place.
    pub fn install_discovered(&mut self, boot_hwid: u32, hwids: &[u32]) -> Result<usize, CpuMapError> {
        let boot_hwid = boot_hwid & MPIDR_HWID_BITMASK;
        let mut map = [MPIDR_INVALID; N];
        let mut next = 1;
        let mut boot_seen = false;

        for (n, &hwid) in hwids.iter().enumerate() {
            if hwid & !MPIDR_HWID_BITMASK != 0 {
                return Err(CpuMapError::InvalidHwid { hwid });
            }
            if hwids[..n].contains(&hwid) {
                return Err(CpuMapError::DuplicateHwid { hwid });
            }

            if hwid == boot_hwid {
                map[0] = hwid;
                boot_seen = true;
                continue;
            }

            if next >= N {
                warn!(
                    "{} CPU entries exceed the maximum of {N} cores, capping them",
                    hwids.len()
                );
                break;
            }
            map[next] = hwid;
            next += 1;
        }

        if !boot_seen {
            return Err(CpuMapError::BootCpuMissing { boot_hwid });
        }

        self.map = map;
        self.possible = next;
        for (i, hwid) in self.possible_cores() {
            info!("CPU{i}: MPIDR 0x{hwid:06x}");
        }
        Ok(next)
    }

    /// Hardware id of logical core `cpu`, if populated.
    #[must_use]
    pub fn hwid(&self, cpu: usize) -> Option<u32> {
        self.map
            .get(cpu)
            .copied()
            .filter(|&hwid| hwid != MPIDR_INVALID)
    }

    /// Logical number of the core with hardware id `hwid`.
    #[must_use]
    pub fn logical_id(&self, hwid: u32) -> Option<usize> {
        self.map[..self.possible]
            .iter()
            .position(|&h| h == hwid & MPIDR_HWID_BITMASK)
    }

    /// Number of possible cores, i.e. populated slots.
    #[inline]
    #[must_use]
    pub const fn nr_possible(&self) -> usize {
        self.possible
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// `(logical, hwid)` for every possible core.
    pub fn possible_cores(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.map[..self.possible].iter().copied().enumerate()
    }

    /// Affinity level `level` of logical core `cpu`.
    #[must_use]
    pub fn affinity(&self, cpu: usize, level: u32) -> Option<u32> {
        self.hwid(cpu).map(|hwid| affinity_level(hwid, level))
    }

    /// Raw slots, including invalid ones.
    #[must_use]
    pub const fn as_slice(&self) -> &[u32] {
        &self.map
    }
}
