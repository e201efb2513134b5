//! # vex-crypto
//!
//! Keccak-256 hashing and contract-address derivation for VexChain.
//!
//! Signing and key recovery live with the transaction layer, not here; the
//! execution core only needs hashing and the two deterministic address
//! derivation schemes used by CREATE and CREATE2.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{create2_address, create_address, keccak256};
