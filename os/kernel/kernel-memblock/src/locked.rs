use crate::memblock::{Memblock, MemblockError, MemblockRegion};
use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

/// A region allocator shared between cores.
///
/// Each mutation runs under a test-and-test-and-set spin lock so that
/// concurrent registrations serialize.
pub struct LockedMemblock<M> {
    /// * `false`: unlocked
    /// * `true`: locked
    locked: AtomicBool,
    inner: UnsafeCell<M>,
}

// Safety: mutual exclusion; only M: Send may cross cores.
unsafe impl<M: Send> Sync for LockedMemblock<M> {}

impl<M> LockedMemblock<M> {
    pub const fn new(inner: M) -> Self {
        Self {
            locked: AtomicBool::new(false),
            inner: UnsafeCell::new(inner),
        }
    }

    #[inline]
    fn acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn try_lock(&self) -> Option<LockedMemblockGuard<'_, M>> {
        self.acquire().then(|| LockedMemblockGuard { lock: self })
    }

    /// Spin until acquired, then return a guard.
    #[inline]
    pub fn lock(&self) -> LockedMemblockGuard<'_, M> {
        while !self.acquire() {
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
        LockedMemblockGuard { lock: self }
    }

    #[inline]
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        let mut g = self.lock();
        f(&mut g)
    }

    #[inline]
    pub const fn get_mut(&mut self) -> &mut M {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> M {
        self.inner.into_inner()
    }
}

pub struct LockedMemblockGuard<'a, M> {
    lock: &'a LockedMemblock<M>,
}

impl<M> Deref for LockedMemblockGuard<'_, M> {
    type Target = M;
    fn deref(&self) -> &M {
        // Safety: the guard holds the lock.
        unsafe { &*self.lock.inner.get() }
    }
}

impl<M> DerefMut for LockedMemblockGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        // Safety: the guard holds the lock exclusively.
        unsafe { &mut *self.lock.inner.get() }
    }
}

impl<M> Drop for LockedMemblockGuard<'_, M> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

impl<M: Memblock> Memblock for LockedMemblockGuard<'_, M> {
    fn add(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        (**self).add(base, size)
    }

    fn remove(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        (**self).remove(base, size)
    }

    fn reserve(&mut self, base: u64, size: u64) -> Result<(), MemblockError> {
        (**self).reserve(base, size)
    }

    fn memory_regions(&self) -> &[MemblockRegion] {
        (**self).memory_regions()
    }

    fn reserved_regions(&self) -> &[MemblockRegion] {
        (**self).reserved_regions()
    }
}
