//! Order reference codes.
//!
//! A reference code is assigned once, when an order is paid for, and is the
//! handle customers quote when asking for a refund.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ReferenceCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceCodeError {
    #[error("reference code must be exactly {expected} characters (got {actual})")]
    WrongLength { expected: usize, actual: usize },
    #[error("reference code may only contain lowercase letters and digits")]
    InvalidChar,
}

/// A 20 character `[a-z0-9]` order reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceCode(String);

impl ReferenceCode {
    /// Number of characters in a reference code.
    pub const LENGTH: usize = 20;

    /// Characters a reference code is drawn from.
    pub const ALPHABET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    /// Parse a reference code.
    ///
    /// # Errors
    ///
    /// Returns a [`ReferenceCodeError`] if the input is not exactly
    /// [`Self::LENGTH`] characters from [`Self::ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, ReferenceCodeError> {
        if s.len() != Self::LENGTH {
            return Err(ReferenceCodeError::WrongLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            return Err(ReferenceCodeError::InvalidChar);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReferenceCode {
    type Error = ReferenceCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceCode> for String {
    fn from(code: ReferenceCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let code = ReferenceCode::parse("abc123def456ghi789jk");
        assert!(code.is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            ReferenceCode::parse("short"),
            Err(ReferenceCodeError::WrongLength {
                expected: 20,
                actual: 5
            })
        );
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        assert_eq!(
            ReferenceCode::parse("ABC123def456ghi789jk"),
            Err(ReferenceCodeError::InvalidChar)
        );
    }
}
