//! Boot command line handling.

use core::fmt;
use kernel_info::memory::COMMAND_LINE_SIZE;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("{key}: value expected")]
    MissingValue { key: &'static str },
    #[error("{key}: {reason}")]
    Malformed {
        key: &'static str,
        reason: &'static str,
    },
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    let mut n = s.len().min(max);
    while !s.is_char_boundary(n) {
        n -= 1;
    }
    &s[..n]
}

/// Parses a size with an optional `K`, `M` or `G` suffix.
///
/// The number is decimal, hexadecimal with `0x`, or octal with a leading
/// `0`. A `0x` not followed by a hex digit is the number zero. Returns the value and the unparsed remainder, or `None` if `s` does
/// not start with a number or the value overflows.
#[must_use]
pub fn memparse(s: &str) -> Option<(u64, &str)> {
    let (radix, digits) = if let Some(hex) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|r| r.starts_with(|c: char| c.is_ascii_hexdigit()))
    {
        (16, hex)
    } else if let Some(octal) = s.strip_prefix('0').filter(|r| !r.is_empty()) {
        (8, octal)
    } else {
        (10, s)
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let mut value = match (end, radix) {
        (0, 8) => 0,
        (0, _) => return None,
        _ => u64::from_str_radix(&digits[..end], radix).ok()?,
    };

    let mut rest = &digits[end..];
    let shift = match rest.as_bytes().first() {
        Some(b'G' | b'g') => 30,
        Some(b'M' | b'm') => 20,
        Some(b'K' | b'k') => 10,
        _ => 0,
    };
    if shift != 0 {
        value = value.checked_mul(1 << shift)?;
        rest = &rest[1..];
    }
    Some((value, rest))
}

/// The saved copy of the boot command line.
#[derive(Clone)]
pub struct CommandLine {
    buf: [u8; COMMAND_LINE_SIZE],
    len: usize,
}

impl CommandLine {
    /// Copies `raw`, truncated to leave room for a terminator.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let kept = truncate(raw, COMMAND_LINE_SIZE - 1);
        let mut buf = [0; COMMAND_LINE_SIZE];
        buf[..kept.len()].copy_from_slice(kept.as_bytes());
        Self {
            buf,
            len: kept.len(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// `key[=value]` tokens in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.as_str().split_ascii_whitespace().map(|token| {
            token
                .split_once('=')
                .map_or((token, None), |(key, value)| (key, Some(value)))
        })
    }

    /// Value of the last occurrence of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params()
            .filter(|(k, _)| *k == key)
            .last()
            .and_then(|(_, v)| v)
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandLine").field(&self.as_str()).finish()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument of `mem=size[@start]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemParam {
    pub size: u64,
    pub start: u64,
}

impl MemParam {
    /// # Errors
    /// The size or the start address is not a number.
    pub fn parse(value: &str, default_start: u64) -> Result<Self, ParamError> {
        let malformed = |reason| ParamError::Malformed { key: "mem", reason };
        let (size, rest) = memparse(value).ok_or_else(|| malformed("memory value expected"))?;
        let start = match rest.strip_prefix('@') {
            Some(at) => {
                memparse(at)
                    .ok_or_else(|| malformed("memory value expected after '@'"))?
                    .0
            }
            None => default_start,
        };
        Ok(Self { size, start })
    }
}

/// Floating point emulator selected with `fpe=`.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct FpeType([u8; 8]);

impl FpeType {
    /// Keeps the first eight bytes of `value`, zero padded.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let kept = truncate(value, 8);
        let mut bytes = [0; 8];
        bytes[..kept.len()].copy_from_slice(kept.as_bytes());
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(8);
        core::str::from_utf8(&self.0[..len]).unwrap_or_default()
    }
}

impl fmt::Debug for FpeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FpeType").field(&self.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memparse_suffixes_and_radix() {
        assert_eq!(memparse("64M"), Some((64 << 20, "")));
        assert_eq!(memparse("512k@x"), Some((512 << 10, "@x")));
        assert_eq!(memparse("1G"), Some((1 << 30, "")));
        assert_eq!(memparse("0x1000"), Some((0x1000, "")));
        assert_eq!(memparse("010"), Some((8, "")));
        assert_eq!(memparse("0"), Some((0, "")));
        assert_eq!(memparse("M"), None);
        // A bare "0x" is a zero followed by junk.
        assert_eq!(memparse("0x"), Some((0, "x")));
        assert_eq!(memparse("0xg"), Some((0, "xg")));
        assert_eq!(memparse("0XfK"), Some((15 << 10, "")));
        assert_eq!(memparse("99999999999999999999G"), None);
    }

    #[test]
    fn command_line_is_truncated() {
        let long = "a".repeat(COMMAND_LINE_SIZE + 10);
        let cl = CommandLine::new(&long);
        assert_eq!(cl.as_str().len(), COMMAND_LINE_SIZE - 1);
    }

    #[test]
    fn params_split_on_whitespace() {
        let cl = CommandLine::new("console=ttyAMA0 quiet  mem=64M mem=128M");
        let params: Vec<_> = cl.params().collect();
        assert_eq!(
            params,
            [
                ("console", Some("ttyAMA0")),
                ("quiet", None),
                ("mem", Some("64M")),
                ("mem", Some("128M"))
            ]
        );
        assert_eq!(cl.get("mem"), Some("128M"));
        assert_eq!(cl.get("quiet"), None);
        assert_eq!(cl.get("root"), None);
    }

    #[test]
    fn mem_param() {
        assert_eq!(
            MemParam::parse("256M@0x60000000", 0x4000_0000),
            Ok(MemParam { size: 256 << 20, start: 0x6000_0000 })
        );
        assert_eq!(
            MemParam::parse("256M", 0x4000_0000),
            Ok(MemParam { size: 256 << 20, start: 0x4000_0000 })
        );
        assert!(MemParam::parse("lots", 0).is_err());
        assert!(MemParam::parse("1M@", 0).is_err());
    }

    #[test]
    fn fpe_keeps_eight_bytes() {
        assert_eq!(FpeType::parse("nwfpe").as_str(), "nwfpe");
        assert_eq!(FpeType::parse("fastfpe-extra").as_bytes(), b"fastfpe-");
        assert_eq!(FpeType::parse("").as_str(), "");
    }
}
