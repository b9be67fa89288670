//! # Early Physical Memory Bookkeeping
//!
//! Everything that decides which physical memory the kernel may use, before
//! any page allocator exists.
//!
//! ## Components
//!
//! | Item | Role |
//! |---|---|
//! | [`Memblock`] | Interface of the early region allocator: registered memory, reservations, free-range search. |
//! | [`StaticMemblock`] | Fixed-capacity implementation with merge-on-add semantics. |
//! | [`LockedMemblock`] | Spin-locked wrapper serializing callers on different cores. |
//! | [`MemoryRegistrar`] | Validates and clips candidate RAM ranges before they reach the allocator. |
//! | [`ResourceTree`] | `iomem`/`ioport` trees of named ranges for conflict detection and introspection. |
//!
//! ## Region Clipping
//!
//! ```text
//!   start            aligned start                      end
//!     │░░░░│─────────────────────────────────────────│░░│
//!      ^ sub-page head dropped              sub-page tail dropped ^
//!
//!   below PHYS_OFFSET → trimmed or rejected
//!   above the 32-bit ceiling → truncated or rejected
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod locked;
mod memblock;
mod registrar;
mod resource;

pub use locked::{LockedMemblock, LockedMemblockGuard};
pub use memblock::{Memblock, MemblockError, MemblockRegion, StaticMemblock};
pub use registrar::{MemoryRegistrar, RegionError, RegionLimits};
pub use resource::{
    Children, Resource, ResourceError, ResourceFlags, ResourceId, ResourceTree, ResourceTreeDisplay,
};
