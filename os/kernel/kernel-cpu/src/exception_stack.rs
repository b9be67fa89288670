//! Per-core exception stacks.
//!
//! The IRQ, abort, undefined-instruction and FIQ modes each get a tiny banked
//! stack: just enough to save `r0`, `lr` and `spsr` before the entry code
//! switches to the supervisor stack and runs the real handler.
//!
//! Layout (one cache-line aligned slot per core):
//!
//! ```text
//! ExceptionStackTable
//!   [core 0] ┌ irq [3 words] ┬ abt [3 words] ┬ und [3 words] ┬ fiq [3 words] ┐ pad
//!   [core 1] ├ …
//! ```
//!
//! The table is sized at build time and never moves. Computing a core's
//! [`StackLayout`] is pure; installing it is the privileged
//! [`apply_stack_layout`] step.

use crate::FatalPrecondition;
use core::cell::UnsafeCell;
use core::mem::offset_of;
use kernel_info::memory::L1_CACHE_BYTES;
use kernel_registers::cpsr::ProcessorMode;
use log::error;

/// Words saved per exception class: `r0`, `lr`, `spsr`.
pub const STACK_WORDS: usize = 3;

/// Save area for one core.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct ExceptionStack {
    pub irq: [u32; STACK_WORDS],
    pub abt: [u32; STACK_WORDS],
    pub und: [u32; STACK_WORDS],
    pub fiq: [u32; STACK_WORDS],
}

const _: () = {
    assert!(align_of::<ExceptionStack>() == L1_CACHE_BYTES);
    assert!(size_of::<ExceptionStack>() == L1_CACHE_BYTES);
};

/// Asynchronous exception classes, in slot order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExceptionClass {
    Irq,
    Abort,
    Undefined,
    Fiq,
}

impl ExceptionClass {
    pub const ALL: [Self; 4] = [Self::Irq, Self::Abort, Self::Undefined, Self::Fiq];

    /// Processor mode the core enters for this class.
    #[must_use]
    pub const fn mode(self) -> ProcessorMode {
        match self {
            Self::Irq => ProcessorMode::Irq,
            Self::Abort => ProcessorMode::Abort,
            Self::Undefined => ProcessorMode::Undefined,
            Self::Fiq => ProcessorMode::Fiq,
        }
    }

    /// Byte offset of this class's save area within an [`ExceptionStack`].
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Irq => offset_of!(ExceptionStack, irq),
            Self::Abort => offset_of!(ExceptionStack, abt),
            Self::Undefined => offset_of!(ExceptionStack, und),
            Self::Fiq => offset_of!(ExceptionStack, fiq),
        }
    }
}

/// Statically allocated exception stacks for `N` cores.
///
/// Cores only ever reach their own slot, through the banked stack pointer, so
/// the table is shared without locking.
pub struct ExceptionStackTable<const N: usize> {
    stacks: UnsafeCell<[ExceptionStack; N]>,
}

// SAFETY: the table itself is never mutated from Rust; each slot is written
// by exception entry code on exactly one core.
unsafe impl<const N: usize> Sync for ExceptionStackTable<N> {}

impl<const N: usize> Default for ExceptionStackTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ExceptionStackTable<N> {
    const EMPTY: ExceptionStack = ExceptionStack {
        irq: [0; STACK_WORDS],
        abt: [0; STACK_WORDS],
        und: [0; STACK_WORDS],
        fiq: [0; STACK_WORDS],
    };

    #[must_use]
    pub const fn new() -> Self {
        Self {
            stacks: UnsafeCell::new([Self::EMPTY; N]),
        }
    }

    /// Number of cores the table was built for.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the stack slot of `core`.
    ///
    /// # Errors
    /// [`FatalPrecondition::CoreIndexOutOfRange`] if `core >= N`.
    pub fn stack_for(&self, core: usize) -> Result<StackHandle, FatalPrecondition> {
        if core >= N {
            return Err(FatalPrecondition::CoreIndexOutOfRange { core, capacity: N });
        }
        let base = self.stacks.get().cast::<ExceptionStack>().wrapping_add(core);
        Ok(StackHandle {
            core,
            base: base.addr(),
        })
    }

    /// Computes the stack layout `core` installs on itself during its init.
    ///
    /// # Errors
    /// As [`stack_for`](Self::stack_for); logged before returning.
    pub fn cpu_init(&self, core: usize) -> Result<StackLayout, FatalPrecondition> {
        self.stack_for(core).map(|handle| handle.layout()).inspect_err(|e| {
            error!("{e}");
        })
    }
}

/// A core's slot in an [`ExceptionStackTable`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StackHandle {
    pub core: usize,
    base: usize,
}

impl StackHandle {
    /// Address of the slot.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Stack pointer value for `class`, i.e. the start of its save area.
    ///
    /// Entry code stores upwards from `sp`, so this is the lowest address.
    #[inline]
    #[must_use]
    pub const fn stack_pointer(&self, class: ExceptionClass) -> usize {
        self.base + class.offset()
    }

    #[must_use]
    pub fn layout(&self) -> StackLayout {
        StackLayout {
            entries: ExceptionClass::ALL.map(|class| (class.mode(), self.stack_pointer(class))),
            restore: ProcessorMode::Supervisor,
        }
    }
}

/// Mode to stack-pointer assignments for one core.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StackLayout {
    /// `(mode, sp)` pairs in install order.
    pub entries: [(ProcessorMode, usize); 4],
    /// Mode to return to once all banked stack pointers are set.
    pub restore: ProcessorMode,
}

impl StackLayout {
    #[must_use]
    pub fn stack_pointer(&self, mode: ProcessorMode) -> Option<usize> {
        self.entries
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, sp)| *sp)
    }
}

/// Installs `layout` into the banked stack pointers of the executing core.
///
/// Each mode is entered with IRQ and FIQ masked, `sp` is set and the core
/// returns to [`StackLayout::restore`] before the next entry; only `r0`-`r2`
/// are used, which are not banked in any mode.
///
/// # Safety
/// Must run at PL1 on the core `layout` was computed for, with interrupts
/// disabled, and the table backing `layout` must live for the rest of the
/// kernel run.
#[cfg(all(feature = "asm", target_arch = "arm"))]
pub unsafe fn apply_stack_layout(layout: &StackLayout) {
    use kernel_registers::cpsr::Cpsr;

    let restore = Cpsr::masked_entry(layout.restore).into_bits();
    for &(mode, sp) in &layout.entries {
        let enter = Cpsr::masked_entry(mode).into_bits();
        unsafe {
            core::arch::asm!(
                "msr cpsr_c, r0",
                "mov sp, r1",
                "msr cpsr_c, r2",
                in("r0") enter,
                in("r1") sp,
                in("r2") restore,
                options(nostack, preserves_flags)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_offsets_follow_class_order() {
        assert_eq!(ExceptionClass::Irq.offset(), 0);
        assert_eq!(ExceptionClass::Abort.offset(), 12);
        assert_eq!(ExceptionClass::Undefined.offset(), 24);
        assert_eq!(ExceptionClass::Fiq.offset(), 36);
    }

    #[test]
    fn slots_are_cache_line_strided() {
        let table = ExceptionStackTable::<4>::new();
        let a = table.stack_for(0).expect("in range");
        let b = table.stack_for(3).expect("in range");
        assert_eq!(b.base() - a.base(), 3 * L1_CACHE_BYTES);
        assert_eq!(a.base() % L1_CACHE_BYTES, 0);
    }

    #[test]
    fn out_of_range_is_fatal() {
        let table = ExceptionStackTable::<2>::new();
        assert_eq!(
            table.stack_for(2),
            Err(FatalPrecondition::CoreIndexOutOfRange { core: 2, capacity: 2 })
        );
        assert!(table.cpu_init(7).is_err());
    }

    #[test]
    fn layout_maps_each_mode_once() {
        let table = ExceptionStackTable::<2>::new();
        let handle = table.stack_for(1).expect("in range");
        let layout = table.cpu_init(1).expect("in range");
        assert_eq!(layout.restore, ProcessorMode::Supervisor);
        assert_eq!(
            layout.stack_pointer(ProcessorMode::Fiq),
            Some(handle.base() + 36)
        );
        assert_eq!(layout.stack_pointer(ProcessorMode::Supervisor), None);
        let modes = layout.entries.map(|(m, _)| m);
        assert_eq!(
            modes,
            [
                ProcessorMode::Irq,
                ProcessorMode::Abort,
                ProcessorMode::Undefined,
                ProcessorMode::Fiq
            ]
        );
    }
}
