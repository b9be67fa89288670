use bitfield_struct::bitfield;

/// Current Program Status Register.
///
/// Only the control byte and the condition flags are named; the IT/GE state in
/// between is kept opaque.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Cpsr {
    /// Bits 4:0: Processor mode, see [`ProcessorMode`].
    #[bits(5)]
    pub mode: u8,

    /// Bit 5: Thumb execution state.
    pub thumb: bool,

    /// Bit 6: FIQ mask.
    pub fiq_masked: bool,

    /// Bit 7: IRQ mask.
    pub irq_masked: bool,

    /// Bit 8: Asynchronous abort mask.
    pub async_abort_masked: bool,

    /// Bit 9: Big-endian data accesses.
    pub big_endian: bool,

    #[bits(17)]
    __: u32,

    pub q: bool,
    pub v: bool,
    pub c: bool,
    pub z: bool,
    pub n: bool,
}

impl Cpsr {
    #[inline]
    #[must_use]
    pub const fn processor_mode(self) -> Option<ProcessorMode> {
        ProcessorMode::from_bits(self.mode())
    }

    #[inline]
    #[must_use]
    pub const fn with_processor_mode(self, mode: ProcessorMode) -> Self {
        self.with_mode(mode as u8)
    }

    /// Control byte that enters `mode` with IRQ and FIQ masked, as written
    /// to `cpsr_c` when switching into an exception mode.
    #[inline]
    #[must_use]
    pub const fn masked_entry(mode: ProcessorMode) -> Self {
        Self::new()
            .with_processor_mode(mode)
            .with_irq_masked(true)
            .with_fiq_masked(true)
    }
}

/// `CPSR.M` encodings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProcessorMode {
    User = 0x10,
    Fiq = 0x11,
    Irq = 0x12,
    Supervisor = 0x13,
    Monitor = 0x16,
    Abort = 0x17,
    Hyp = 0x1a,
    Undefined = 0x1b,
    System = 0x1f,
}

impl ProcessorMode {
    #[must_use]
    pub const fn from_bits(value: u8) -> Option<Self> {
        Some(match value {
            0x10 => Self::User,
            0x11 => Self::Fiq,
            0x12 => Self::Irq,
            0x13 => Self::Supervisor,
            0x16 => Self::Monitor,
            0x17 => Self::Abort,
            0x1a => Self::Hyp,
            0x1b => Self::Undefined,
            0x1f => Self::System,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "usr",
            Self::Fiq => "fiq",
            Self::Irq => "irq",
            Self::Supervisor => "svc",
            Self::Monitor => "mon",
            Self::Abort => "abt",
            Self::Hyp => "hyp",
            Self::Undefined => "und",
            Self::System => "sys",
        }
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegister for Cpsr {
    fn load() -> Self {
        let value: u32;
        unsafe {
            core::arch::asm!("mrs {}, cpsr", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(value)
    }
}
