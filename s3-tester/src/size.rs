//! Human-readable byte sizes.
//!
//! Sizes are written as a (possibly fractional) number followed by an optional, case-insensitive
//! unit suffix. Decimal suffixes (`k`, `kb`, `m`, ...) scale by powers of 1000, binary suffixes
//! (`ki`, `kib`, `mi`, ...) by powers of 1024. A bare number or the `b` suffix means bytes.

use std::fmt;

use bytesize::ByteSize;

use crate::error::{ConfigError, ConfigResult};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

const SUFFIXES: &[(&str, u64)] = &[
    ("", 1),
    ("b", 1),
    ("k", 1000),
    ("kb", 1000),
    ("ki", KIB),
    ("kib", KIB),
    ("m", 1000 * 1000),
    ("mb", 1000 * 1000),
    ("mi", MIB),
    ("mib", MIB),
    ("g", 1000 * 1000 * 1000),
    ("gb", 1000 * 1000 * 1000),
    ("gi", GIB),
    ("gib", GIB),
    ("t", 1000 * 1000 * 1000 * 1000),
    ("tb", 1000 * 1000 * 1000 * 1000),
    ("ti", TIB),
    ("tib", TIB),
];

/// Parses a size such as `500KiB`, `1.5 MB` or `1000` into a [`ByteSize`].
///
/// Fractional results are truncated to whole bytes.
pub fn parse_size(input: &str) -> ConfigResult<ByteSize> {
    let invalid = |reason| ConfigError::InvalidSize {
        input: input.to_owned(),
        reason,
    };

    let trimmed = input.trim();
    let number_len = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, rest) = trimmed.split_at(number_len);
    let suffix = rest.trim_start();

    if number.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("expected a number followed by a unit"));
    }

    let suffix = suffix.to_ascii_lowercase();
    let factor = SUFFIXES
        .iter()
        .find(|(name, _)| *name == suffix)
        .map(|&(_, factor)| factor)
        .ok_or_else(|| invalid("unit not recognized"))?;

    let value: f64 = number.parse().map_err(|_| invalid("malformed number"))?;
    let bytes = value * factor as f64;
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(invalid("size out of range"));
    }

    Ok(ByteSize::b(bytes as u64))
}

/// Displays a size with binary units and two decimals, e.g. `10.00 KiB`.
///
/// Sizes below one KiB are printed as whole bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HumanSize(pub ByteSize);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.as_u64();
        let (divisor, unit) = match bytes {
            b if b < KIB => return write!(f, "{b} B"),
            b if b < MIB => (KIB, "KiB"),
            b if b < GIB => (MIB, "MiB"),
            b if b < TIB => (GIB, "GiB"),
            _ => (TIB, "TiB"),
        };
        write!(f, "{:.2} {unit}", bytes as f64 / divisor as f64)
    }
}

impl From<ByteSize> for HumanSize {
    fn from(size: ByteSize) -> Self {
        Self(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffix_table() {
        let cases = [
            ("1000", 1000),
            ("10B", 10),
            ("10K", 10_000),
            ("10Ki", 10_240),
            ("10KiB", 10_240),
            ("10kib", 10_240),
            ("10M", 10_000_000),
            ("10Mi", 10_485_760),
            ("10MiB", 10_485_760),
            ("10G", 10_000_000_000),
            ("10Gi", 10_737_418_240),
            ("10GiB", 10_737_418_240),
            ("10T", 10_000_000_000_000),
            ("10Ti", 10_995_116_277_760),
            ("10TiB", 10_995_116_277_760),
            ("500KiB", 512_000),
            ("1.5 KiB", 1536),
            ("0", 0),
        ];

        for (input, expected) in cases {
            let parsed = parse_size(input).unwrap_or_else(|e| panic!("{input}: {e}"));
            assert_eq!(parsed.as_u64(), expected, "input: {input}");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["invalid", "10X", "", "KiB", "1.2.3MiB", "10 K i B", "-5KiB", "10PiB"] {
            assert!(
                matches!(parse_size(input), Err(ConfigError::InvalidSize { .. })),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn formats_binary_units() {
        let cases = [
            (500, "500 B"),
            (1023, "1023 B"),
            (1024, "1.00 KiB"),
            (1025, "1.00 KiB"),
            (1100, "1.07 KiB"),
            (1_048_575, "1024.00 KiB"),
            (1_048_576, "1.00 MiB"),
            (1_048_577, "1.00 MiB"),
            (1_048_576 * 1024 - 1, "1024.00 MiB"),
            (1_048_576 * 1024, "1.00 GiB"),
            (1_048_576 * 1024 * 1023, "1023.00 GiB"),
            (1_048_576 * 1024 * 1024 - 1, "1024.00 GiB"),
            (1_048_576 * 1024 * 1024, "1.00 TiB"),
        ];

        for (bytes, expected) in cases {
            assert_eq!(HumanSize(ByteSize::b(bytes)).to_string(), expected);
        }
    }

    #[test]
    fn parse_and_format_agree() {
        let size = parse_size("10KiB").unwrap();
        assert_eq!(size.as_u64(), 10_240);
        assert_eq!(HumanSize(size).to_string(), "10.00 KiB");

        let size = parse_size("2.5GiB").unwrap();
        assert_eq!(HumanSize(size).to_string(), "2.50 GiB");
    }
}
