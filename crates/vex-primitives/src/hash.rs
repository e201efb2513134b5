//! 32-byte hash type

use crate::error::PrimitiveError;
use primitive_types::U256;
use std::fmt;

/// 256-bit hash (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct H256([u8; 32]);

/// Alias for H256
pub type Hash = H256;

impl H256 {
    /// Size in bytes
    pub const LEN: usize = 32;

    /// Zero hash
    pub const ZERO: H256 = H256([0u8; 32]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }

    /// Create from a slice; fails unless exactly 32 bytes
    pub fn from_slice(slice: &[u8]) -> Result<Self, PrimitiveError> {
        if slice.len() != Self::LEN {
            return Err(PrimitiveError::InvalidLength {
                expected: Self::LEN,
                got: slice.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(H256(bytes))
    }

    /// Parse from a hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Reinterpret a 256-bit word as a hash (big-endian)
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        H256(bytes)
    }

    /// Reinterpret this hash as a 256-bit word (big-endian)
    pub fn into_word(self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Get as a byte array
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether all bytes are zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self.to_hex())
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }
}

impl AsRef<[u8]> for H256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert!(H256::ZERO.is_zero());
        let mut nonzero = [0u8; 32];
        nonzero[31] = 1;
        assert!(!H256::from_bytes(nonzero).is_zero());
    }

    #[test]
    fn test_from_slice_wrong_length() {
        assert!(H256::from_slice(&[0u8; 31]).is_err());
        assert!(H256::from_slice(&[0u8; 33]).is_err());
        assert!(H256::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_hex_round_trip() {
        let h = H256::from_bytes([0xCD; 32]);
        assert_eq!(H256::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn test_word_round_trip() {
        let h = H256::from_bytes([0x42; 32]);
        assert_eq!(H256::from_word(h.into_word()), h);
    }

    #[test]
    fn test_word_endianness() {
        // Low word goes into the last 8 bytes, big-endian.
        let h = H256::from_word(U256::from(0x0102u64));
        assert_eq!(h.as_bytes()[30], 0x01);
        assert_eq!(h.as_bytes()[31], 0x02);
    }
}
