//! # QEMU Development and Debug Support
//!
//! Early console output for kernels running on the QEMU `virt` machine.
//!
//! ## Overview
//!
//! Bring-up code runs long before any driver exists, yet is exactly the code
//! whose decisions (CPU generation, cache aliasing, which memory regions were
//! dropped) most need to be visible. The `virt` board exposes a PL011 UART at a
//! fixed physical address that is usable without initialization, so this crate
//! writes straight to its data register.
//!
//! ## Output Mechanism
//! ```text
//! log::info!(..) / qemu_trace!(..)
//!     ↓
//! QemuSink (fmt::Write)
//!     ↓
//! dbg_putc() → PL011 UARTDR @ 0x0900_0000
//!     ↓
//! qemu-system-arm -serial stdio
//! ```
//!
//! ## Core Components
//!
//! * [`QemuLogger`]: a `log::Log` implementation with a level threshold,
//!   formatting records as `[LEVEL] target: message`.
//! * [`qemu_trace!`]: direct, allocation-free formatted output that bypasses
//!   the logging framework.
//!
//! ## Feature System
//!
//! With the `enabled` feature on a 32-bit ARM target, output goes to the UART.
//! Everywhere else (host tests, feature off) every operation is a no-op, so
//! crates can log unconditionally.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! QemuLogger::init(LevelFilter::Debug).ok();
//! info!("CPU: ARMv7 Processor [410fc075] revision 5 (ARMv7)");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

#[cfg(all(feature = "enabled", target_arch = "arm"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};
    use core::ptr;

    /// Physical base of the first PL011 UART on the QEMU `virt` machine.
    const UART0_BASE: usize = 0x0900_0000;

    /// Data register.
    const UARTDR: usize = 0x000;

    /// Flag register.
    const UARTFR: usize = 0x018;

    /// `UARTFR.TXFF`: transmit FIFO full.
    const FR_TXFF: u32 = 1 << 5;

    /// Write a single byte to the UART, waiting for FIFO space.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        // SAFETY: the `virt` board maps the PL011 at this address and the
        // MMU is off or identity-maps the device window during bring-up.
        unsafe {
            while ptr::read_volatile((UART0_BASE + UARTFR) as *const u32) & FR_TXFF != 0 {
                core::hint::spin_loop();
            }
            ptr::write_volatile((UART0_BASE + UARTDR) as *mut u32, u32::from(c));
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                if b == b'\n' {
                    dbg_putc(b'\r');
                }
                dbg_putc(b);
            }
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(all(feature = "enabled", target_arch = "arm")))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub const fn qemu_write(_: fmt::Arguments) {}
}

#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
