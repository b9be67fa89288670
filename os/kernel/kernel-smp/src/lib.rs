//! # Logical CPU Numbering
//!
//! Maps hardware affinity ids (`MPIDR[23:0]`) to the dense logical core
//! numbers the rest of the kernel indexes per-core data with, and back.
//!
//! * [`LogicalCoreTable::assign_logical_ids`] runs first thing on the boot
//!   core and guarantees the boot core is logical 0.
//! * [`LogicalCoreTable::install_discovered`] replaces that provisional
//!   numbering with the cores reported by the hardware descriptor.
//! * [`build_hash`] derives an [`AffinityHash`] that turns an affinity id into
//!   a table index with three mask-and-shift steps, for code paths (secondary
//!   entry, resume) that cannot afford a search.
//! * [`Published`] hands the results to other cores exactly once, cleaned to
//!   the point of coherency so that cores running with caches off see them.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod affinity_hash;
mod cache_sync;
mod logical_map;
mod publish;

pub use affinity_hash::{AffinityHash, build_hash};
#[cfg(all(feature = "asm", target_arch = "arm"))]
pub use cache_sync::Dccmvac;
pub use cache_sync::{CacheSync, Coherent};
pub use logical_map::{CpuMapError, LogicalCoreTable, MPIDR_HWID_BITMASK, MPIDR_INVALID};
pub use publish::Published;
