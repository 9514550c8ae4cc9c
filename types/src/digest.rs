//! Administrator credential digest.
//!
//! Elections store a one-way hash of the administrator password, never the
//! plaintext. The digest is an opaque 32-byte value; how it is computed lives
//! in the credential crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 32-byte credential digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialDigest([u8; 32]);

impl CredentialDigest {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialDigest({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Failure to parse a digest from its hex form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestParseError {
    #[error("expected 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character {0:?}")]
    InvalidChar(char),
}

impl FromStr for CredentialDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(DigestParseError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex::decode_nibble(chunk[0] as char)?;
            let lo = hex::decode_nibble(chunk[1] as char)?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    use super::DigestParseError;

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode_nibble(c: char) -> Result<u8, DigestParseError> {
        c.to_digit(16)
            .map(|d| d as u8)
            .ok_or(DigestParseError::InvalidChar(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_roundtrip() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let digest = CredentialDigest::new(bytes);
        let parsed: CredentialDigest = digest.to_string().parse().unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "abcd".parse::<CredentialDigest>().unwrap_err();
        assert_eq!(err, DigestParseError::InvalidLength(4));
    }

    #[test]
    fn parse_rejects_non_hex() {
        let s = "zz".repeat(32);
        let err = s.parse::<CredentialDigest>().unwrap_err();
        assert_eq!(err, DigestParseError::InvalidChar('z'));
    }

    #[test]
    fn debug_is_truncated() {
        let digest = CredentialDigest::new([0xab; 32]);
        assert_eq!(format!("{:?}", digest), "CredentialDigest(abababab)");
    }
}
