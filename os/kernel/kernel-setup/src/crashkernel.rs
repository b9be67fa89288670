//! Memory set aside for a crash-capture kernel.

use crate::cmdline::{CommandLine, ParamError, memparse};
use kernel_info::memory::CRASH_ALIGN;
use kernel_memblock::{
    Memblock, MemblockError, MemblockRegion, Resource, ResourceTree,
};
use log::{info, warn};

const KEY: &str = "crashkernel";

/// A parsed `crashkernel=` request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CrashKernelRequest {
    pub size: u64,
    /// Fixed physical base; `None` lets the allocator choose.
    pub base: Option<u64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrashKernelError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("no free {size:#x} byte window for the crash kernel")]
    NoSpace { size: u64 },
    #[error("memory at {base:#x} is in use")]
    InUse { base: u64, source: MemblockError },
}

const fn malformed(reason: &'static str) -> ParamError {
    ParamError::Malformed { key: KEY, reason }
}

/// Parses the value of `crashkernel=` against `system_ram` bytes of memory.
///
/// Accepts `size[@offset]` and
/// `start-[end]:size[,start-[end]:size...][@offset]`, where a range matches
/// when `start <= system_ram < end`. Returns `None` when no range matches or
/// the size is zero.
///
/// # Errors
/// The value does not follow either syntax, or a range grants at least
/// `system_ram` bytes.
pub fn parse_crashkernel(
    value: &str,
    system_ram: u64,
) -> Result<Option<CrashKernelRequest>, ParamError> {
    let (size, rest) = if value.contains(':') {
        parse_ranges(value, system_ram)?
    } else {
        memparse(value).ok_or_else(|| malformed("memory value expected"))?
    };

    let base = match rest.strip_prefix('@') {
        Some(at) => Some(memparse(at).ok_or_else(|| malformed("memory value expected after '@'"))?.0),
        None if rest.is_empty() => None,
        None => return Err(malformed("unrecognized char")),
    };

    Ok((size != 0).then_some(CrashKernelRequest { size, base }))
}

fn parse_ranges(value: &str, system_ram: u64) -> Result<(u64, &str), ParamError> {
    let mut cur = value;
    let mut size = 0;
    loop {
        let (start, rest) = memparse(cur).ok_or_else(|| malformed("memory value expected"))?;
        let rest = rest.strip_prefix('-').ok_or_else(|| malformed("'-' expected"))?;

        let (end, rest) = if rest.starts_with(':') {
            (u64::MAX, rest)
        } else {
            let (end, rest) = memparse(rest).ok_or_else(|| malformed("memory value expected"))?;
            if end <= start {
                return Err(malformed("end <= start"));
            }
            (end, rest)
        };

        let rest = rest.strip_prefix(':').ok_or_else(|| malformed("':' expected"))?;
        let (range_size, rest) = memparse(rest).ok_or_else(|| malformed("memory value expected"))?;
        if range_size >= system_ram {
            return Err(malformed("invalid size"));
        }

        cur = rest;
        if (start..end).contains(&system_ram) {
            size = range_size;
            break;
        }
        match cur.strip_prefix(',') {
            Some(next) => cur = next,
            None => break,
        }
    }

    // Skip the ranges after the matching one.
    let tail = cur.find('@').map_or("", |at| &cur[at..]);
    Ok((size, tail))
}

/// Reserves the window requested by `crashkernel=` and records it as
/// `Crash kernel` in `iomem`.
///
/// `lowmem_limit` bounds both the memory the request is measured against and
/// the search for a free window. Returns `None` when nothing was requested.
///
/// # Errors
/// A malformed request, no free window, or memory already in use. Each is
/// logged; boot continues without crash capture.
pub fn reserve_crashkernel<M: Memblock + ?Sized, const N: usize>(
    cmdline: &CommandLine,
    memblock: &mut M,
    resources: &mut ResourceTree<N>,
    lowmem_limit: u64,
) -> Result<Option<MemblockRegion>, CrashKernelError> {
    let Some(value) = cmdline.get(KEY) else {
        return Ok(None);
    };
    let total_mem = memblock.mem_size_below(lowmem_limit);
    let request = parse_crashkernel(value, total_mem).inspect_err(|e| warn!("{e}"))?;
    let Some(CrashKernelRequest { size, base }) = request else {
        return Ok(None);
    };

    let base = match base {
        Some(base) => base,
        None => memblock
            .find_free(0, lowmem_limit, size, CRASH_ALIGN)
            .ok_or(CrashKernelError::NoSpace { size })
            .inspect_err(|_| warn!("crashkernel reservation failed - No suitable area found."))?,
    };

    if let Err(source) = memblock.reserve(base, size) {
        warn!("crashkernel reservation failed - memory is in use (0x{base:x})");
        return Err(CrashKernelError::InUse { base, source });
    }

    info!(
        "Reserving {}MB of memory at {}MB for crashkernel (System RAM: {}MB)",
        size >> 20,
        base >> 20,
        total_mem >> 20
    );

    if let Err(e) = resources.insert(resources.iomem(), Resource::busy_mem("Crash kernel", base, size)) {
        warn!("crashkernel: resource not recorded: {e}");
    }
    Ok(Some(MemblockRegion::new(base, size)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memblock::StaticMemblock;

    const GIB: u64 = 1 << 30;
    const MIB: u64 = 1 << 20;

    #[test]
    fn simple_form() {
        assert_eq!(
            parse_crashkernel("64M", GIB),
            Ok(Some(CrashKernelRequest { size: 64 * MIB, base: None }))
        );
        assert_eq!(
            parse_crashkernel("64M@0x70000000", GIB),
            Ok(Some(CrashKernelRequest { size: 64 * MIB, base: Some(0x7000_0000) }))
        );
        assert_eq!(parse_crashkernel("0", GIB), Ok(None));
        assert!(parse_crashkernel("64Mx", GIB).is_err());
        assert!(parse_crashkernel("@16M", GIB).is_err());
    }

    #[test]
    fn ranged_form_picks_matching_range() {
        let ranges = "512M-2G:64M,2G-:128M";
        assert_eq!(
            parse_crashkernel(ranges, GIB),
            Ok(Some(CrashKernelRequest { size: 64 * MIB, base: None }))
        );
        assert_eq!(
            parse_crashkernel(ranges, 4 * GIB),
            Ok(Some(CrashKernelRequest { size: 128 * MIB, base: None }))
        );
        assert_eq!(parse_crashkernel(ranges, 256 * MIB), Ok(None));
    }

    #[test]
    fn ranged_form_with_offset() {
        assert_eq!(
            parse_crashkernel("0-1G:32M,1G-:64M@16M", 512 * MIB),
            Ok(Some(CrashKernelRequest { size: 32 * MIB, base: Some(16 * MIB) }))
        );
    }

    #[test]
    fn ranged_form_errors() {
        assert!(parse_crashkernel("1G-512M:64M", GIB).is_err());
        assert!(parse_crashkernel("512M:64M", GIB).is_err());
        assert!(parse_crashkernel("512M-:2G", GIB).is_err());
        assert!(parse_crashkernel("512M-1G-64M", GIB).is_err());
    }

    fn setup() -> (StaticMemblock<8>, ResourceTree<8>) {
        let mut m = StaticMemblock::new();
        m.add(0x4000_0000, GIB).unwrap();
        (m, ResourceTree::new())
    }

    #[test]
    fn reservation_without_base_is_aligned_and_recorded() {
        let (mut m, mut res) = setup();
        let cl = CommandLine::new("console=ttyAMA0 crashkernel=64M");
        let region = reserve_crashkernel(&cl, &mut m, &mut res, 0x8000_0000)
            .unwrap()
            .unwrap();
        assert_eq!(region.base % CRASH_ALIGN, 0);
        assert_eq!(region.base, 0x7800_0000);
        assert_eq!(m.reserved_regions(), [region]);

        let id = res.find("Crash kernel").unwrap();
        assert_eq!(res.get(id).unwrap().start, 0x7800_0000);
        assert_eq!(res.get(id).unwrap().end, 0x7800_0000 + 64 * MIB - 1);
    }

    #[test]
    fn reservation_of_busy_memory_is_rejected() {
        let (mut m, mut res) = setup();
        m.reserve(0x6000_0000, MIB).unwrap();
        let cl = CommandLine::new("crashkernel=64M@0x60000000");
        let err = reserve_crashkernel(&cl, &mut m, &mut res, 0x8000_0000).unwrap_err();
        assert!(matches!(err, CrashKernelError::InUse { base: 0x6000_0000, .. }));
        assert!(res.find("Crash kernel").is_none());
    }

    #[test]
    fn no_request_no_reservation() {
        let (mut m, mut res) = setup();
        let cl = CommandLine::new("quiet");
        assert_eq!(reserve_crashkernel(&cl, &mut m, &mut res, 0x8000_0000), Ok(None));
        assert!(m.reserved_regions().is_empty());
    }
}
