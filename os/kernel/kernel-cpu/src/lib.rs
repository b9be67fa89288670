//! # CPU Identification and Per-Core Exception Stacks
//!
//! Decodes the processor's identification registers into the facts the rest
//! of the kernel depends on:
//!
//! * [`identify`]: architecture generation and implementer/variant/part/revision
//!   from `MIDR`, consulting `ID_MMFR0` for cores using the revised CPUID scheme.
//! * [`CapabilitySet`]: the hardware capability bits, built from the
//!   processor-info table ([`lookup_processor_type`]), amplified from `ID_ISAR0`
//!   and `ID_MMFR0`, then narrowed by build configuration and errata.
//! * [`classify_cache`]: data and instruction cache indexing behaviour.
//! * [`ExceptionStackTable`]: the statically sized table of per-core exception
//!   stacks and the mode/stack-pointer layout each core installs on itself.
//!
//! Every decoder takes its input through [`IdRegisters`], so the algorithms are
//! pure functions of register values. [`RegisterSnapshot`] is a plain-data
//! implementation for tests and replay; the `asm` feature adds [`Cp15`], which
//! reads the live registers on a 32-bit ARM target.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod architecture;
mod cache;
mod error;
mod exception_stack;
mod hwcap;
mod id_registers;
mod identity;
mod proc_info;

pub use architecture::CpuArchitecture;
pub use cache::{
    CacheClassification, CacheId, CachePolicy, DataCacheKind, InstructionCacheKind,
    classify_cache,
};
pub use error::FatalPrecondition;
#[cfg(all(feature = "asm", target_arch = "arm"))]
pub use exception_stack::apply_stack_layout;
pub use exception_stack::{
    ExceptionClass, ExceptionStack, ExceptionStackTable, STACK_WORDS, StackHandle, StackLayout,
};
pub use hwcap::{CapabilitySet, HWCAP_NAMES, HWCAP2_NAMES, HwCap, HwCap2};
#[cfg(all(feature = "asm", target_arch = "arm"))]
pub use id_registers::Cp15;
pub use id_registers::{ExtReg, IdRegisters, RegisterSnapshot};
pub use identity::{CpuIdentity, identify};
pub use proc_info::{PROC_INFO_TABLE, ProcInfo, lookup_processor_type};

/// Whether the kernel is built to run Thumb user space.
///
/// When `false`, [`CapabilitySet::apply_config_mask`] strips the Thumb and
/// Thumb-divide capabilities.
pub const THUMB_ENABLED: bool = cfg!(feature = "thumb");
