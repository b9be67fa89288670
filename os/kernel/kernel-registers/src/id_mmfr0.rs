use bitfield_struct::bitfield;

/// Memory Model Feature Register 0 (`ID_MMFR0`), CP15 c0/c1/4.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IdMmfr0 {
    /// Bits 3:0: VMSA support.
    ///
    /// - `2`: `ARMv6` VMSA with subpage bits disabled.
    /// - `3`: `ARMv7` VMSA with remapping and access flag.
    /// - `4`: adds PXN.
    /// - `5`: adds the Long-descriptor translation table format (LPAE).
    #[bits(4)]
    pub vmsa: u8,

    /// Bits 7:4: PMSA support, with the same `2`/`3` split between
    /// `ARMv6` and `ARMv7` protected memory systems.
    #[bits(4)]
    pub pmsa: u8,

    #[bits(4)]
    pub outer_shareability: u8,

    #[bits(4)]
    pub shareability_levels: u8,

    #[bits(4)]
    pub tcm: u8,

    #[bits(4)]
    pub auxiliary_registers: u8,

    #[bits(4)]
    pub fcse: u8,

    #[bits(4)]
    pub innermost_shareability: u8,
}

impl IdMmfr0 {
    /// Lowest [`vmsa`](Self::vmsa) value that implements the large physical
    /// address extension.
    pub const VMSA_LPAE: u8 = 5;
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for IdMmfr0 {
    unsafe fn load_unsafe() -> Self {
        Self::from_bits(crate::read_cp15!("0", "c0", "c1", "4"))
    }
}
