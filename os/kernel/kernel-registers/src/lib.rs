//! # Typed `ARMv7` System Registers
//!
//! Bitfield views over the CP15 identification block, the cache
//! identification registers and the program status register.
//!
//! Every register type is a plain value: decoding is pure and testable on any
//! host. Reading or writing the live register is only available with the
//! `asm` feature on a 32-bit ARM target.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(all(feature = "asm", target_arch = "arm"))]
pub mod barrier;

#[cfg(feature = "cache")]
pub mod ccsidr;

#[cfg(feature = "cache")]
pub mod csselr;

#[cfg(feature = "cache")]
pub mod ctr;

#[cfg(feature = "psr")]
pub mod cpsr;

#[cfg(feature = "id")]
pub mod id_isar;

#[cfg(feature = "id")]
pub mod id_mmfr0;

#[cfg(feature = "id")]
pub mod midr;

#[cfg(feature = "id")]
pub mod mpidr;

#[cfg(feature = "sctlr")]
pub mod sctlr;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require a PL1 mode.
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require a PL1 mode.
    unsafe fn store_unsafe(self);
}

pub trait LoadRegister {
    /// # Safety
    /// It is generally safe to load this register even from user mode.
    fn load() -> Self;
}

pub trait StoreRegister {
    /// # Safety
    /// It is generally safe to store this register even from user mode.
    fn store(self);
}

impl<T> LoadRegisterUnsafe for T
where
    T: LoadRegister,
{
    #[inline]
    unsafe fn load_unsafe() -> Self {
        <Self as LoadRegister>::load()
    }
}

impl<T> StoreRegisterUnsafe for T
where
    T: StoreRegister,
{
    #[inline]
    unsafe fn store_unsafe(self) {
        <Self as StoreRegister>::store(self);
    }
}

/// Emits `mrc p15, <opc1>, <Rt>, <CRn>, <CRm>, <opc2>` and yields the value.
#[cfg(all(feature = "asm", target_arch = "arm"))]
macro_rules! read_cp15 {
    ($opc1:literal, $crn:literal, $crm:literal, $opc2:literal) => {{
        let value: u32;
        unsafe {
            core::arch::asm!(
                concat!("mrc p15, ", $opc1, ", {}, ", $crn, ", ", $crm, ", ", $opc2),
                out(reg) value,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }};
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
pub(crate) use read_cp15;
