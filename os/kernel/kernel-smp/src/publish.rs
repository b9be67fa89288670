use crate::CacheSync;
use core::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

/// 0 = EMPTY, 1 = WRITING, 2 = PUBLISHED
const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const PUBLISHED: u8 = 2;

/// Write-once slot for bring-up results read by other cores.
///
/// The value is cleaned to the point of coherency before the state flips to
/// published, and the state itself is cleaned afterwards, so a reader that
/// observes `PUBLISHED` (cached or not) also observes the value.
pub struct Published<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Default for Published<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Published<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Returns `Some(&T)` once published.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) == PUBLISHED {
            // SAFETY: PUBLISHED guarantees the write is done
            Some(unsafe { &*(*self.value.get()).as_ptr() })
        } else {
            None
        }
    }

    /// Stores `value` unless something was already published.
    ///
    /// # Errors
    /// Hands `value` back if the slot is taken.
    pub fn publish<C: CacheSync + ?Sized>(&self, value: T, sync: &C) -> Result<&T, T> {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(value);
        }

        // SAFETY: WRITING gives us exclusive access to the slot.
        let stored = unsafe { (*self.value.get()).write(value) };
        sync.clean(stored);

        self.state.store(PUBLISHED, Ordering::Release);
        sync.clean(&self.state);

        // SAFETY: just wrote it
        Ok(unsafe { &*(*self.value.get()).as_ptr() })
    }
}

// Safety: shared after PUBLISHED; publication is single-writer.
unsafe impl<T: Sync> Sync for Published<T> {}
unsafe impl<T: Send> Send for Published<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coherent;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(usize, usize)>>);

    impl CacheSync for Recorder {
        fn clean_range(&self, start: usize, len: usize) {
            self.0.borrow_mut().push((start, len));
        }
    }

    #[test]
    fn publish_once() {
        let slot = Published::<u32>::new();
        assert_eq!(slot.get(), None);
        assert_eq!(slot.publish(7, &Coherent), Ok(&7));
        assert_eq!(slot.publish(8, &Coherent), Err(8));
        assert_eq!(slot.get(), Some(&7));
    }

    #[test]
    fn value_cleaned_before_state() {
        let slot = Published::<[u32; 4]>::new();
        let sync = Recorder::default();
        let stored = slot.publish([1, 2, 3, 4], &sync).expect("empty slot");

        let cleaned = sync.0.borrow();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0], (core::ptr::from_ref(stored).addr(), 16));
        assert_eq!(cleaned[1].1, 1);
    }
}
