//! Core API version numbers as written in the registry (`number="1.2"`).
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A `major.minor` API version.
///
/// This is the registry's notation, not the packed integer encoding used by
/// `VK_MAKE_API_VERSION`. Versions are totally ordered by major, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

/// Error returned when a string does not start with an `X.Y` version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid API version (expected X.Y)")]
pub struct InvalidVersion(pub String);

impl ApiVersion {
    /// Construct a version from its parts.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for ApiVersion {
    type Err = InvalidVersion;

    /// Parse a leading `X.Y` version.
    ///
    /// Leading whitespace is skipped and anything after the minor number is
    /// ignored, so `"1.3.250"` and `"6.3-alpha"` parse as `1.3` and `6.3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.to_string());
        let trimmed = s.trim_start();
        let (major, rest) = split_number(trimmed).ok_or_else(invalid)?;
        let rest = rest.strip_prefix('.').ok_or_else(invalid)?;
        let (minor, _) = split_number(rest).ok_or_else(invalid)?;
        Ok(Self { major, minor })
    }
}

/// Split a leading run of ASCII digits off `s` and parse it.
fn split_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let (digits, rest) = s.split_at(end);
    digits.parse().ok().map(|n| (n, rest))
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        let v: ApiVersion = "1.3".parse().unwrap();
        assert_eq!(v, ApiVersion::new(1, 3));
    }

    #[test]
    fn ignores_trailing_text() {
        let v: ApiVersion = "6.3-alpha".parse().unwrap();
        assert_eq!(v, ApiVersion::new(6, 3));
        let v: ApiVersion = "  1.2.250 Champion Edition".parse().unwrap();
        assert_eq!(v, ApiVersion::new(1, 2));
    }

    #[test]
    fn rejects_garbage() {
        assert!("Frog".parse::<ApiVersion>().is_err());
        assert!("".parse::<ApiVersion>().is_err());
        assert!("1".parse::<ApiVersion>().is_err());
        assert!("1.".parse::<ApiVersion>().is_err());
        assert!("Ax.1.2".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn ordering_is_major_then_minor() {
        let v10 = ApiVersion::new(1, 0);
        let v13 = ApiVersion::new(1, 3);
        let v20 = ApiVersion::new(2, 0);
        assert!(v10 < v13);
        assert!(v13 < v20);
        assert_eq!(v10.cmp(&v10), std::cmp::Ordering::Equal);
    }

    #[test]
    fn display_round_trips() {
        let v: ApiVersion = "6.0.2 Champion Edition".parse().unwrap();
        assert_eq!(v.to_string(), "6.0");
        assert_eq!(v.to_string().parse::<ApiVersion>().unwrap(), v);
    }

    #[test]
    fn error_message_names_input() {
        let err = "Frog".parse::<ApiVersion>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Frog' is not a valid API version (expected X.Y)"
        );
    }
}
