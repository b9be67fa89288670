use kernel_registers::ccsidr::Ccsidr;
use kernel_registers::ctr::Ctr;
use kernel_registers::id_isar::{IdIsar0, IdIsar3, IdIsar4, IdIsar5};
use kernel_registers::id_mmfr0::IdMmfr0;
use kernel_registers::midr::Midr;
use kernel_registers::mpidr::Mpidr;

/// Extension feature registers consulted during identification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtReg {
    Mmfr0,
    Isar0,
    Isar3,
    Isar4,
    Isar5,
}

/// The narrow window through which identification reads hardware state.
///
/// Implementations read the *current* core's registers.
pub trait IdRegisters {
    /// `MIDR`.
    fn read_id(&self) -> Midr;

    /// One of the `ID_*` feature registers, raw.
    fn read_ext(&self, reg: ExtReg) -> u32;

    /// `CTR`.
    fn read_cache_type(&self) -> Ctr;

    /// `CCSIDR` of the level 1 instruction cache.
    ///
    /// Implementations select the cache through `CSSELR` and synchronize
    /// before reading.
    fn read_l1_icache_size(&self) -> Ccsidr;

    /// `MPIDR`.
    fn read_mpidr(&self) -> Mpidr;

    #[inline]
    fn mmfr0(&self) -> IdMmfr0 {
        IdMmfr0::from_bits(self.read_ext(ExtReg::Mmfr0))
    }

    #[inline]
    fn isar0(&self) -> IdIsar0 {
        IdIsar0::from_bits(self.read_ext(ExtReg::Isar0))
    }

    #[inline]
    fn isar3(&self) -> IdIsar3 {
        IdIsar3::from_bits(self.read_ext(ExtReg::Isar3))
    }

    #[inline]
    fn isar4(&self) -> IdIsar4 {
        IdIsar4::from_bits(self.read_ext(ExtReg::Isar4))
    }

    #[inline]
    fn isar5(&self) -> IdIsar5 {
        IdIsar5::from_bits(self.read_ext(ExtReg::Isar5))
    }
}

/// Captured register values.
///
/// Used wherever identification must run without touching hardware, such as
/// host tests or replaying a boot log from another machine.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub midr: u32,
    pub mmfr0: u32,
    pub isar0: u32,
    pub isar3: u32,
    pub isar4: u32,
    pub isar5: u32,
    pub ctr: u32,
    pub l1_icache_ccsidr: u32,
    pub mpidr: u32,
}

impl RegisterSnapshot {
    /// A snapshot with only `MIDR` populated.
    #[must_use]
    pub const fn with_id(midr: u32) -> Self {
        Self {
            midr,
            mmfr0: 0,
            isar0: 0,
            isar3: 0,
            isar4: 0,
            isar5: 0,
            ctr: 0,
            l1_icache_ccsidr: 0,
            mpidr: 0,
        }
    }

    /// Cortex-A7 r0p5 as found on a Raspberry Pi 2.
    #[must_use]
    pub const fn cortex_a7() -> Self {
        Self {
            midr: 0x410f_c075,
            mmfr0: 0x1010_1105,
            isar0: 0x0210_1110,
            isar3: 0x1111_2131,
            isar4: 0x1001_1142,
            isar5: 0,
            ctr: 0x8444_8003,
            l1_icache_ccsidr: 0x203f_e009,
            mpidr: 0x8000_0f00,
        }
    }

    /// ARM1136JF-S r1p5, an `ARMv6` core without the revised CPUID scheme.
    #[must_use]
    pub const fn arm1136() -> Self {
        Self {
            midr: 0x4117_b365,
            mmfr0: 0,
            isar0: 0,
            isar3: 0,
            isar4: 0,
            isar5: 0,
            ctr: 0x1d19_2992,
            l1_icache_ccsidr: 0,
            mpidr: 0,
        }
    }
}

impl IdRegisters for RegisterSnapshot {
    fn read_id(&self) -> Midr {
        Midr::from_bits(self.midr)
    }

    fn read_ext(&self, reg: ExtReg) -> u32 {
        match reg {
            ExtReg::Mmfr0 => self.mmfr0,
            ExtReg::Isar0 => self.isar0,
            ExtReg::Isar3 => self.isar3,
            ExtReg::Isar4 => self.isar4,
            ExtReg::Isar5 => self.isar5,
        }
    }

    fn read_cache_type(&self) -> Ctr {
        Ctr::from_bits(self.ctr)
    }

    fn read_l1_icache_size(&self) -> Ccsidr {
        Ccsidr::from_bits(self.l1_icache_ccsidr)
    }

    fn read_mpidr(&self) -> Mpidr {
        Mpidr::from_bits(self.mpidr)
    }
}

/// Live CP15 access for the executing core.
///
/// Constructing one asserts that the caller runs at PL1; every read below
/// relies on that.
#[cfg(all(feature = "asm", target_arch = "arm"))]
#[derive(Debug)]
pub struct Cp15 {
    _private: (),
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl Cp15 {
    /// # Safety
    /// The caller must be executing in a privileged (PL1) mode.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl IdRegisters for Cp15 {
    fn read_id(&self) -> Midr {
        use kernel_registers::LoadRegisterUnsafe;
        unsafe { Midr::load_unsafe() }
    }

    fn read_ext(&self, reg: ExtReg) -> u32 {
        use kernel_registers::LoadRegisterUnsafe;
        unsafe {
            match reg {
                ExtReg::Mmfr0 => IdMmfr0::load_unsafe().into_bits(),
                ExtReg::Isar0 => IdIsar0::load_unsafe().into_bits(),
                ExtReg::Isar3 => IdIsar3::load_unsafe().into_bits(),
                ExtReg::Isar4 => IdIsar4::load_unsafe().into_bits(),
                ExtReg::Isar5 => IdIsar5::load_unsafe().into_bits(),
            }
        }
    }

    fn read_cache_type(&self) -> Ctr {
        use kernel_registers::LoadRegisterUnsafe;
        unsafe { Ctr::load_unsafe() }
    }

    fn read_l1_icache_size(&self) -> Ccsidr {
        use kernel_registers::csselr::Csselr;
        use kernel_registers::{LoadRegisterUnsafe, StoreRegisterUnsafe, barrier};
        unsafe {
            Csselr::l1_instruction().store_unsafe();
            barrier::isb();
            Ccsidr::load_unsafe()
        }
    }

    fn read_mpidr(&self) -> Mpidr {
        use kernel_registers::LoadRegisterUnsafe;
        unsafe { Mpidr::load_unsafe() }
    }
}
