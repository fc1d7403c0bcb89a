//! Program identifiers.
//!
//! Every module is keyed by a 64-bit program id. On disk the id is always
//! rendered as 16 upper-case hexadecimal digits, which is also the name of
//! the module's directory under the contents root.
//!
//! # Examples
//!
//! ```
//! use sysmod_core::id::ProgramId;
//! use std::str::FromStr;
//!
//! let id = ProgramId::from_str("0100000000000001").unwrap();
//! assert_eq!(id.as_u64(), 0x0100_0000_0000_0001);
//! assert_eq!(id.to_string(), "0100000000000001");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::IdError;

/// Program id of the overlay host process. It is never manageable.
pub const RESERVED_PROGRAM_ID: ProgramId = ProgramId(0x4200_0000_0007_E51A);

/// A 64-bit program identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
    /// Wrap a raw program id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ProgramId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for ProgramId {
    type Err = IdError;

    /// Parse a hexadecimal program id.
    ///
    /// Accepts an optional `0x`/`0X` prefix followed by 1 to 16 hex digits.
    /// Anything else is rejected rather than truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 16 || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(IdError::InvalidHex(s.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| IdError::InvalidHex(s.to_string()))
    }
}

impl Serialize for ProgramId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProgramId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zero_padded_upper_hex() {
        assert_eq!(ProgramId::new(0x1a).to_string(), "000000000000001A");
        assert_eq!(RESERVED_PROGRAM_ID.to_string(), "420000000007E51A");
    }

    #[test]
    fn test_parse_accepts_prefix_and_lowercase() {
        let expected = ProgramId::new(0x0100_0000_0000_0002);
        assert_eq!("0100000000000002".parse::<ProgramId>().unwrap(), expected);
        assert_eq!("0x0100000000000002".parse::<ProgramId>().unwrap(), expected);
        assert_eq!(" 0X100000000000002 ".parse::<ProgramId>().unwrap(), expected);
        assert_eq!(
            "420000000007e51a".parse::<ProgramId>().unwrap(),
            RESERVED_PROGRAM_ID
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "0x", "xyz", "12 34", "10000000000000000", "-1"] {
            assert!(bad.parse::<ProgramId>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let id = ProgramId::new(0x0100_0000_0000_0001);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0100000000000001\"");

        let back: ProgramId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ProgramId>("42").is_err());
    }
}
