/// Makes a memory range visible to observers that bypass the caches.
///
/// Secondary cores read bring-up results before their MMU and caches are on,
/// so anything they consume must be cleaned to the point of coherency.
pub trait CacheSync {
    fn clean_range(&self, start: usize, len: usize);

    fn clean<T>(&self, value: &T) {
        self.clean_range(core::ptr::from_ref(value).addr(), size_of::<T>());
    }
}

/// For systems where all observers are coherent, and for host tests.
#[derive(Debug, Default, Copy, Clone)]
pub struct Coherent;

impl CacheSync for Coherent {
    fn clean_range(&self, _start: usize, _len: usize) {}
}

/// Line-by-line `DCCMVAC` clean followed by a `dsb`.
#[cfg(all(feature = "asm", target_arch = "arm"))]
#[derive(Debug, Copy, Clone)]
pub struct Dccmvac {
    line: usize,
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl Dccmvac {
    /// Reads the smallest data cache line size from `CTR`.
    ///
    /// # Safety
    /// The caller must be executing in a privileged (PL1) mode.
    #[must_use]
    pub unsafe fn new() -> Self {
        use kernel_registers::LoadRegisterUnsafe;
        use kernel_registers::ctr::Ctr;

        let ctr = unsafe { Ctr::load_unsafe() };
        Self {
            line: 4 << ctr.dminline(),
        }
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl CacheSync for Dccmvac {
    fn clean_range(&self, start: usize, len: usize) {
        use kernel_registers::barrier;

        let end = start.saturating_add(len);
        let mut addr = start & !(self.line - 1);
        while addr < end {
            // SAFETY: construction required PL1.
            unsafe { barrier::clean_dcache_line_poc(addr) };
            addr += self.line;
        }
        barrier::dsb();
    }
}
