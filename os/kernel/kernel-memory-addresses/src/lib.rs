//! # Physical Address Types
//!
//! Strongly typed physical addresses and page-size markers for early memory
//! bookkeeping on 32-bit ARM.
//!
//! Physical addresses are always carried as `u64`: with the large physical
//! address extension a 32-bit core can address up to 40 bits of physical
//! memory, so narrowing happens explicitly at the points where a 32-bit
//! kernel has to give up on a region.
//!
//! ## Page Sizes
//!
//! | Marker | Size | Use |
//! |---|---|---|
//! | [`Size4K`] | 4 KiB | Small page, the region allocator's granule |
//! | [`Size1M`] | 1 MiB | Short-descriptor section |
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x4000_0500);
//! assert_eq!(pa.align_up::<Size4K>(), Some(PhysicalAddress::new(0x4000_1000)));
//! assert_eq!(pa.align_down::<Size1M>().as_u64(), 0x4000_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page_size;
mod physical_address;

pub use page_size::{PageSize, Size1M, Size4K};
pub use physical_address::PhysicalAddress;
