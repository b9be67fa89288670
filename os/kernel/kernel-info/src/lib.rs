//! # Kernel Configuration and Boot Interface
//!
//! Shared facts about the machine the kernel boots on and the fixed layout of
//! its memory, consumed by the bring-up crates and by the kernel's build
//! script.
//!
//! ## Boot Information ([`boot`])
//! * **Machine descriptor**: the board description resolved by the boot
//!   descriptor parser (name, restart handler, init hooks, legacy port
//!   reservations, video memory window).
//! * **Kernel image**: physical extents of the kernel's code and data, used
//!   when publishing the standard resources.
//!
//! ## Memory Layout ([`memory`])
//! Compile-time constants for page size, the physical base of RAM, the
//! number of supported cores and the 32-bit physical address ceiling.
//!
//! ```text
//! Physical Address Space (QEMU `virt`, 32-bit view):
//!
//! 0x0000_0000 ┌──────────────────────────────┐
//!             │  Flash, GIC, UART, virtio    │
//! PHYS_OFFSET ├──────────────────────────────┤ 0x4000_0000
//!             │  RAM                         │
//!             │   + KERNEL_TEXT_OFFSET       │ kernel image
//!             │                              │
//! 0xFFFF_FFFF └──────────────────────────────┘ PHYS_ADDR_CEILING
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod boot;
pub mod memory;
