use crate::{CpuArchitecture, FatalPrecondition, IdRegisters};
use kernel_registers::id_mmfr0::IdMmfr0;

/// Decoded identification of one core.
///
/// Each core computes its own; the fields are never shared between cores.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CpuIdentity {
    /// Raw `MIDR`.
    pub id: u32,
    pub architecture: CpuArchitecture,
    pub implementer: u8,
    pub variant: u8,
    pub part: u32,
    pub revision: u8,
}

/// Reads `MIDR` (and `ID_MMFR0` where the scheme requires it) and decodes it.
pub fn identify<R: IdRegisters + ?Sized>(regs: &R) -> CpuIdentity {
    let midr = regs.read_id();
    let mmfr0 = if midr.uses_revised_scheme() {
        regs.mmfr0()
    } else {
        IdMmfr0::new()
    };
    CpuIdentity::decode(midr.into_bits(), mmfr0)
}

impl CpuIdentity {
    /// Splits `id` according to the identification scheme it uses.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(id: u32, mmfr0: IdMmfr0) -> Self {
        let architecture = CpuArchitecture::decode(id, mmfr0);
        let implementer = (id >> 24) as u8;
        let revision = (id & 0xf) as u8;

        let (variant, part) = if id & 0x0008_f000 == 0 {
            // Pre-ARM7: no variant, the part number fills everything above the revision.
            (0, id >> 4)
        } else if id & 0x0008_f000 == 0x7000 {
            (((id >> 16) & 0x7f) as u8, (id >> 4) & 0xfff)
        } else {
            (((id >> 20) & 0xf) as u8, (id >> 4) & 0xfff)
        };

        Self {
            id,
            architecture,
            implementer,
            variant,
            part,
            revision,
        }
    }

    /// Fails unless the generation could be decoded.
    ///
    /// # Errors
    /// [`FatalPrecondition::UnknownArchitecture`] when the core is unidentified.
    pub const fn require_known(&self) -> Result<CpuArchitecture, FatalPrecondition> {
        if self.architecture.is_known() {
            Ok(self.architecture)
        } else {
            Err(FatalPrecondition::UnknownArchitecture { id: self.id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegisterSnapshot;

    #[test]
    fn cortex_a7_fields() {
        let id = identify(&RegisterSnapshot::cortex_a7());
        assert_eq!(id.architecture, CpuArchitecture::ARMv7);
        assert_eq!(id.implementer, 0x41);
        assert_eq!(id.variant, 0);
        assert_eq!(id.part, 0xc07);
        assert_eq!(id.revision, 5);
        assert_eq!(id.require_known(), Ok(CpuArchitecture::ARMv7));
    }

    #[test]
    fn arm7_variant_is_seven_bits() {
        let id = CpuIdentity::decode(0x41f0_7100, IdMmfr0::new());
        assert_eq!(id.variant, 0x70);
        assert_eq!(id.part, 0x710);
    }

    #[test]
    fn pre_arm7_part_spans_upper_bits() {
        let id = CpuIdentity::decode(0x4156_0603, IdMmfr0::new());
        assert_eq!(id.architecture, CpuArchitecture::Unknown);
        assert_eq!(id.part, 0x0415_6060);
        assert_eq!(id.revision, 3);
        assert_eq!(
            id.require_known(),
            Err(FatalPrecondition::UnknownArchitecture { id: 0x4156_0603 })
        );
    }

    #[test]
    fn mmfr0_not_read_for_legacy_scheme() {
        let mut regs = RegisterSnapshot::arm1136();
        regs.mmfr0 = 0xffff_ffff;
        assert_eq!(identify(&regs).architecture, CpuArchitecture::ARMv6);
    }
}
