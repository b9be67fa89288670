use bitfield_struct::bitfield;

/// System Control Register (`SCTLR`), CP15 c1/c0/0.
///
/// Only read during bring-up for the boot banner; writes belong to the MMU
/// setup code.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Sctlr {
    /// Bit 0: MMU enable.
    pub m: bool,
    /// Bit 1: Alignment check enable.
    pub a: bool,
    /// Bit 2: Data and unified cache enable.
    pub c: bool,
    #[bits(8)]
    __: u8,
    /// Bit 11: Branch prediction enable.
    pub z: bool,
    /// Bit 12: Instruction cache enable.
    pub i: bool,
    /// Bit 13: High exception vectors.
    pub v: bool,
    #[bits(11)]
    __: u16,
    /// Bit 25: Exception endianness.
    pub ee: bool,
    #[bits(4)]
    __: u8,
    /// Bit 30: Thumb exception enable.
    pub te: bool,
    __: bool,
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Sctlr {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c1", "c0", "0"))
    }
}
