//! # vex-primitives
//!
//! Primitive types for the VexChain node.
//!
//! The fundamental data types shared by every other crate: the 20-byte
//! [`Address`], the 32-byte [`H256`] hash, and the 256-bit [`U256`] word
//! (re-exported from `primitive-types`).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::Address;
pub use error::PrimitiveError;
pub use hash::{Hash, H256};

// Re-export primitive-types for the 256-bit machine word.
pub use primitive_types::U256;

/// Block height type
pub type BlockHeight = u64;

/// Transaction nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_basic() {
        let a = U256::from(7u64);
        let b = U256::from(5u64);
        assert_eq!(a + b, U256::from(12u64));
    }

    #[test]
    fn test_u256_wrapping() {
        let max = U256::MAX;
        assert_eq!(max.overflowing_add(U256::one()).0, U256::zero());
    }
}
