use core::fmt;
use kernel_registers::id_mmfr0::IdMmfr0;
use kernel_registers::midr::Midr;

/// Architecture generation of a core.
///
/// Ordered, so "at least `ARMv6`" is a plain comparison. The discriminants
/// are the values reported to user space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CpuArchitecture {
    Unknown = 0,
    ARMv3 = 1,
    ARMv4 = 2,
    ARMv4T = 3,
    ARMv5 = 4,
    ARMv5T = 5,
    ARMv5TE = 6,
    ARMv5TEJ = 7,
    ARMv6 = 8,
    ARMv7 = 9,
    ARMv7M = 10,
}

/// Architecture names indexed by generation number, as shown in `(ARMv…)`.
pub const ARCH_NAMES: [&str; 17] = [
    "undefined/unknown",
    "3",
    "4",
    "4T",
    "5",
    "5T",
    "5TE",
    "5TEJ",
    "6TEJ",
    "7",
    "7M",
    "?(12)",
    "?(13)",
    "?(14)",
    "?(15)",
    "?(16)",
    "?(17)",
];

/// `MIDR` bits that distinguish pre-ARM7, ARM7 and later identification schemes.
const SCHEME_MASK: u32 = 0x0008_f000;

/// ARM7 family marker within [`SCHEME_MASK`].
const ARM7_SCHEME: u32 = 0x0000_7000;

/// On ARM7 parts, set when the core implements Thumb (`ARMv4T`).
const ARM7_THUMB: u32 = 1 << 23;

/// Clear when bits 18:16 directly encode the generation.
const REVISED_FLAG: u32 = 0x0008_0000;

/// Architecture field value of the revised CPUID scheme.
const REVISED_SCHEME: u32 = 0x000f_0000;

impl CpuArchitecture {
    /// Decodes the generation from a raw `MIDR` value.
    ///
    /// `mmfr0` is only consulted for cores using the revised CPUID scheme.
    #[must_use]
    pub fn decode(id: u32, mmfr0: IdMmfr0) -> Self {
        if cfg!(feature = "v7m") {
            return Self::ARMv7M;
        }

        if id & SCHEME_MASK == 0 {
            return Self::Unknown;
        }

        if id & SCHEME_MASK == ARM7_SCHEME {
            return if id & ARM7_THUMB != 0 {
                Self::ARMv4T
            } else {
                Self::ARMv3
            };
        }

        if id & REVISED_FLAG == 0 {
            // Bits 18:16 hold the generation counted from ARMv4.
            let code = (id >> 16) & 7;
            return if code == 0 {
                Self::Unknown
            } else {
                Self::from_number(code + Self::ARMv3 as u32)
            };
        }

        if id & REVISED_SCHEME == REVISED_SCHEME {
            return Self::from_mmfr0(mmfr0);
        }

        Self::Unknown
    }

    /// Revised CPUID scheme: VMSA or PMSA support level tells v7 from v6.
    const fn from_mmfr0(mmfr0: IdMmfr0) -> Self {
        let vmsa = mmfr0.vmsa();
        let pmsa = mmfr0.pmsa();
        if vmsa >= 3 || pmsa >= 3 {
            Self::ARMv7
        } else if vmsa == 2 || pmsa == 2 {
            Self::ARMv6
        } else {
            Self::Unknown
        }
    }

    const fn from_number(n: u32) -> Self {
        match n {
            1 => Self::ARMv3,
            2 => Self::ARMv4,
            3 => Self::ARMv4T,
            4 => Self::ARMv5,
            5 => Self::ARMv5T,
            6 => Self::ARMv5TE,
            7 => Self::ARMv5TEJ,
            8 => Self::ARMv6,
            9 => Self::ARMv7,
            10 => Self::ARMv7M,
            _ => Self::Unknown,
        }
    }

    /// Convenience wrapper over [`decode`](Self::decode) for a typed `MIDR`.
    #[must_use]
    pub fn from_midr(midr: Midr, mmfr0: IdMmfr0) -> Self {
        Self::decode(midr.into_bits(), mmfr0)
    }

    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Name suffix for `ARMv…` banners.
    #[must_use]
    pub const fn name(self) -> &'static str {
        ARCH_NAMES[self as usize]
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARMv{}", self.name())
    }
}
