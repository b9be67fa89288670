use core::fmt;
use core::hash::Hash;

mod sealed {
    pub trait Sealed {}
}

/// Granule marker. Only the short-descriptor sizes below implement it.
pub trait PageSize:
    sealed::Sealed + Clone + Copy + Eq + Ord + Hash + fmt::Display + fmt::Debug
{
    /// Number of low address bits covered by one granule.
    const SHIFT: u32;
    /// Granule size in bytes.
    const SIZE: u64 = 1 << Self::SHIFT;
    /// Offset bits within one granule.
    const MASK: u64 = Self::SIZE - 1;

    fn as_str() -> &'static str;
}

macro_rules! granule {
    ($(#[$doc:meta])* $name:ident, $shift:literal, $label:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name;

        impl sealed::Sealed for $name {}

        impl PageSize for $name {
            const SHIFT: u32 = $shift;

            fn as_str() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(Self::as_str())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

granule!(
    /// Small page; the region allocator works in these.
    Size4K, 12, "4K"
);

granule!(
    /// Short-descriptor section, the unit of the kernel's linear map.
    Size1M, 20, "1M"
);
