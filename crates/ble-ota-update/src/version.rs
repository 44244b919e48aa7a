//! Firmware version codes.
//!
//! Controller firmware reports versions such as `1.0.0.2-S3`: a dotted run of
//! integers, optionally followed by `-` and a free-text build suffix.
//!
//! Ordering only looks at the numbers. The suffix is kept for display but two
//! versions that differ only by suffix compare [`Ordering::Equal`]; the suffix
//! is treated as a build tag, not a release level.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parsed firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionCode {
    numbers: Vec<u64>,
    suffix: String,
    raw: String,
}

impl VersionCode {
    /// Parse a version string.
    ///
    /// Splits at the first `-` into numeric prefix and suffix, then splits
    /// the prefix on `.`. Segments that are not integers are dropped rather
    /// than rejected, so parsing never fails; an empty string yields an empty
    /// version.
    pub fn parse(s: &str) -> Self {
        let (prefix, suffix) = s.split_once('-').unwrap_or((s, ""));
        let numbers = prefix
            .split('.')
            .filter_map(|segment| segment.trim().parse::<u64>().ok())
            .collect();
        Self {
            numbers,
            suffix: suffix.to_string(),
            raw: s.to_string(),
        }
    }

    /// Numeric components, most significant first.
    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    /// Build suffix after the first `-`, or empty.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// String this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether no numeric component was recognised.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Compare numeric components, zero-padding the shorter side.
    ///
    /// `1.2` and `1.2.0` are equal; suffixes never take part.
    pub fn compare(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        let lhs = self.numbers.iter().copied().chain(std::iter::repeat(0));
        let rhs = other.numbers.iter().copied().chain(std::iter::repeat(0));
        lhs.zip(rhs)
            .take(len)
            .map(|(a, b)| a.cmp(&b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether `self` is strictly newer than `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl FromStr for VersionCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for VersionCode {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl std::fmt::Display for VersionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_suffix() {
        let v = VersionCode::parse("1.0.0.2-S3");
        assert_eq!(v.numbers(), &[1, 0, 0, 2]);
        assert_eq!(v.suffix(), "S3");
        assert_eq!(v.to_string(), "1.0.0.2-S3");
    }

    #[test]
    fn suffix_splits_on_first_dash_only() {
        let v = VersionCode::parse("2.1-rc-1");
        assert_eq!(v.numbers(), &[2, 1]);
        assert_eq!(v.suffix(), "rc-1");
    }

    #[test]
    fn non_numeric_segments_are_dropped() {
        let v = VersionCode::parse("1.x.3");
        assert_eq!(v.numbers(), &[1, 3]);
        assert!(VersionCode::parse("abc").is_empty());
    }

    #[test]
    fn empty_input() {
        let v = VersionCode::parse("");
        assert!(v.is_empty());
        assert_eq!(v.suffix(), "");
    }

    #[test]
    fn zero_padding_makes_equal() {
        let a = VersionCode::parse("1.2");
        let b = VersionCode::parse("1.2.0");
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(b.compare(&a), Ordering::Equal);
    }

    #[test]
    fn ordering_is_numeric() {
        let newer = VersionCode::parse("2.0.0");
        let older = VersionCode::parse("1.9.9");
        assert_eq!(newer.compare(&older), Ordering::Greater);
        assert_eq!(older.compare(&newer), Ordering::Less);
        assert!(VersionCode::parse("1.10").is_newer_than(&VersionCode::parse("1.9")));
    }

    #[test]
    fn suffix_is_ignored_in_ordering() {
        let a = VersionCode::parse("1.0.0.2-S3");
        let b = VersionCode::parse("1.0.0.2-S4");
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_ne!(a, b);
    }
}
