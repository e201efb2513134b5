//! EVM memory implementation

use crate::error::{EvmError, EvmResult};
use crate::gas::cost;

/// Largest memory size for which the quadratic cost still fits in a u64.
const MAX_MEMORY_SIZE: u64 = 0x1FFFFFFFE0;

/// EVM memory (byte-addressable, expandable in 32-byte words).
///
/// Expansion gas is billed for the highest word ever touched. The cost of
/// the previous expansion is remembered so each resize only charges the
/// difference.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
    last_gas_cost: u64,
}

impl Memory {
    /// Create new empty memory.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            last_gas_cost: 0,
        }
    }

    /// Current memory size in bytes, always a multiple of 32.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Gas owed to grow to `new_size` bytes (already word-aligned).
    /// Updates the remembered expansion cost; call only when the
    /// returned amount is actually charged.
    pub fn expansion_gas(&mut self, new_size: u64) -> EvmResult<u64> {
        if new_size <= self.data.len() as u64 {
            return Ok(0);
        }
        if new_size > MAX_MEMORY_SIZE {
            return Err(EvmError::GasUintOverflow);
        }
        let words = new_size / 32;
        let total = words * words / cost::MEMORY_QUAD_DIVISOR + words * cost::MEMORY;
        let fee = total - self.last_gas_cost;
        self.last_gas_cost = total;
        Ok(fee)
    }

    /// Grow memory to at least `new_size` bytes, zero-filled and rounded
    /// up to a word boundary.
    pub fn resize(&mut self, new_size: u64) {
        let aligned = (new_size as usize).div_ceil(32) * 32;
        if aligned > self.data.len() {
            self.data.resize(aligned, 0);
        }
    }

    /// Load the 32-byte word at `offset`, zero-padded past the end.
    pub fn load(&self, offset: usize) -> [u8; 32] {
        let mut result = [0u8; 32];
        let end = (offset + 32).min(self.data.len());
        if offset < self.data.len() {
            result[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        result
    }

    /// Store a 32-byte word at `offset`.
    pub fn store(&mut self, offset: usize, value: &[u8; 32]) {
        self.resize((offset + 32) as u64);
        self.data[offset..offset + 32].copy_from_slice(value);
    }

    /// Store a single byte at `offset`.
    pub fn store8(&mut self, offset: usize, value: u8) {
        self.resize((offset + 1) as u64);
        self.data[offset] = value;
    }

    /// Load `size` bytes starting at `offset`, zero-padded past the end.
    pub fn load_slice(&self, offset: usize, size: usize) -> Vec<u8> {
        if size == 0 {
            return Vec::new();
        }
        let mut result = vec![0u8; size];
        let end = (offset + size).min(self.data.len());
        if offset < self.data.len() {
            result[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        result
    }

    /// Store a byte slice at `offset`.
    pub fn store_slice(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.resize((offset + data.len()) as u64);
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Copy `size` bytes from `src` to `dest` within memory, handling
    /// overlap in either direction.
    pub fn copy(&mut self, dest: usize, src: usize, size: usize) {
        if size == 0 {
            return;
        }
        self.resize((dest.max(src) + size) as u64);
        self.data.copy_within(src..src + size, dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_word_aligns() {
        let mut m = Memory::new();
        m.resize(1);
        assert_eq!(m.size(), 32);
        m.resize(33);
        assert_eq!(m.size(), 64);
        m.resize(10);
        assert_eq!(m.size(), 64);
    }

    #[test]
    fn expansion_gas_is_incremental() {
        let mut m = Memory::new();
        // one word: 1*1/512 + 3*1 = 3
        assert_eq!(m.expansion_gas(32).unwrap(), 3);
        m.resize(32);
        // ten words total: 100/512 + 30 = 30, minus the 3 already paid
        assert_eq!(m.expansion_gas(320).unwrap(), 27);
        m.resize(320);
        assert_eq!(m.expansion_gas(320).unwrap(), 0);
        assert_eq!(m.expansion_gas(64).unwrap(), 0);
    }

    #[test]
    fn expansion_gas_quadratic_term() {
        let mut m = Memory::new();
        // 1024 words = 32 KiB: 1024*1024/512 + 3*1024 = 2048 + 3072
        assert_eq!(m.expansion_gas(32 * 1024).unwrap(), 5120);
    }

    #[test]
    fn expansion_gas_overflow_guard() {
        let mut m = Memory::new();
        assert_eq!(
            m.expansion_gas(MAX_MEMORY_SIZE + 1),
            Err(EvmError::GasUintOverflow)
        );
    }

    #[test]
    fn load_pads_with_zeros() {
        let mut m = Memory::new();
        m.store8(0, 0xaa);
        let word = m.load(0);
        assert_eq!(word[0], 0xaa);
        assert_eq!(&word[1..], &[0u8; 31]);
        // load past the end is all zeros
        assert_eq!(m.load(1000), [0u8; 32]);
    }

    #[test]
    fn store_load_roundtrip() {
        let mut m = Memory::new();
        let mut word = [0u8; 32];
        word[31] = 0x42;
        m.store(64, &word);
        assert_eq!(m.load(64), word);
        assert_eq!(m.size(), 96);
    }

    #[test]
    fn copy_handles_overlap() {
        let mut m = Memory::new();
        m.store_slice(0, &[1, 2, 3, 4, 5]);
        m.copy(2, 0, 5);
        assert_eq!(m.load_slice(0, 7), vec![1, 2, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn load_slice_zero_size() {
        let m = Memory::new();
        assert!(m.load_slice(999, 0).is_empty());
    }
}
