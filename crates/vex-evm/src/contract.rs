//! Contract frame state: code, call parameters, gas counter and the
//! lazily computed jump destination analysis.

use crate::opcode;
use crate::word;
use bytes::Bytes;
use primitive_types::U256;
use vex_primitives::{Address, H256};

/// Bitmap over the code marking which byte positions are instruction
/// starts rather than PUSH immediate data.
#[derive(Clone, Debug)]
struct CodeBitmap(Vec<u64>);

impl CodeBitmap {
    fn analyze(code: &[u8]) -> Self {
        let mut bits = vec![0u64; code.len() / 64 + 1];
        let mut pc = 0usize;
        while pc < code.len() {
            bits[pc / 64] |= 1 << (pc % 64);
            pc += 1 + opcode::push_bytes(code[pc]).unwrap_or(0);
        }
        Self(bits)
    }

    fn is_code(&self, pos: usize) -> bool {
        self.0
            .get(pos / 64)
            .is_some_and(|w| w & (1 << (pos % 64)) != 0)
    }
}

/// The code being executed by one frame together with its call
/// parameters and remaining gas.
#[derive(Clone, Debug)]
pub struct Contract {
    /// Account that initiated this frame.
    pub caller: Address,
    /// Account in whose context the code runs.
    pub address: Address,
    /// Code being executed.
    pub code: Bytes,
    /// Keccak hash of the code.
    pub code_hash: H256,
    /// Call data.
    pub input: Bytes,
    /// Value transferred into the frame.
    pub value: U256,
    /// Remaining gas.
    pub gas: u64,
    jumpdests: Option<CodeBitmap>,
}

impl Contract {
    /// Build a frame contract. Jump destination analysis is deferred
    /// until the first JUMP.
    pub fn new(
        caller: Address,
        address: Address,
        code: Bytes,
        code_hash: H256,
        input: Bytes,
        value: U256,
        gas: u64,
    ) -> Self {
        Self {
            caller,
            address,
            code,
            code_hash,
            input,
            value,
            gas,
            jumpdests: None,
        }
    }

    /// Opcode byte at `pc`, STOP past the end of the code.
    pub fn op(&self, pc: u64) -> u8 {
        self.code.get(pc as usize).copied().unwrap_or(opcode::STOP)
    }

    /// Deduct `amount` from the remaining gas. False if it cannot be paid.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        match self.gas.checked_sub(amount) {
            Some(left) => {
                self.gas = left;
                true
            }
            None => false,
        }
    }

    /// Return unspent gas from a finished child frame.
    pub fn refund_gas(&mut self, amount: u64) {
        self.gas += amount;
    }

    /// True if `dest` lands on a JUMPDEST byte that is not inside PUSH
    /// immediate data.
    pub fn valid_jumpdest(&mut self, dest: &U256) -> bool {
        let Some(pos) = word::to_u64(dest) else {
            return false;
        };
        let pos = pos as usize;
        if self.code.get(pos) != Some(&opcode::JUMPDEST) {
            return false;
        }
        self.is_code(pos)
    }

    /// True if `pos` is an instruction start rather than PUSH data.
    pub fn is_code(&mut self, pos: usize) -> bool {
        if self.jumpdests.is_none() {
            self.jumpdests = Some(CodeBitmap::analyze(&self.code));
        }
        self.jumpdests.as_ref().is_some_and(|b| b.is_code(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vex_crypto::keccak256;

    fn contract(code: Vec<u8>) -> Contract {
        let hash = keccak256(&code);
        Contract::new(
            Address::ZERO,
            Address::ZERO,
            Bytes::from(code),
            hash,
            Bytes::new(),
            U256::zero(),
            1_000_000,
        )
    }

    #[test]
    fn op_past_end_is_stop() {
        let c = contract(vec![opcode::ADD]);
        assert_eq!(c.op(0), opcode::ADD);
        assert_eq!(c.op(1), opcode::STOP);
        assert_eq!(c.op(u64::MAX), opcode::STOP);
    }

    #[test]
    fn gas_accounting() {
        let mut c = contract(vec![]);
        assert!(c.use_gas(400_000));
        assert_eq!(c.gas, 600_000);
        assert!(!c.use_gas(600_001));
        assert_eq!(c.gas, 600_000);
        c.refund_gas(1_000);
        assert_eq!(c.gas, 601_000);
    }

    #[test]
    fn jumpdest_inside_push_data_is_invalid() {
        // PUSH2 0x5b5b JUMPDEST
        let mut c = contract(vec![opcode::PUSH1 + 1, 0x5b, 0x5b, opcode::JUMPDEST]);
        assert!(!c.valid_jumpdest(&U256::from(1u8)));
        assert!(!c.valid_jumpdest(&U256::from(2u8)));
        assert!(c.valid_jumpdest(&U256::from(3u8)));
    }

    #[test]
    fn jumpdest_must_be_jumpdest_byte() {
        let mut c = contract(vec![opcode::ADD, opcode::JUMPDEST]);
        assert!(!c.valid_jumpdest(&U256::from(0u8)));
        assert!(c.valid_jumpdest(&U256::from(1u8)));
        assert!(!c.valid_jumpdest(&U256::from(2u8)));
        // destinations beyond u64 can never be valid
        assert!(!c.valid_jumpdest(&(U256::from(u64::MAX) + 1)));
    }

    #[test]
    fn analysis_spans_word_boundaries() {
        // 70 JUMPDESTs, all valid
        let mut c = contract(vec![opcode::JUMPDEST; 70]);
        for pos in 0..70u8 {
            assert!(c.valid_jumpdest(&U256::from(pos)));
        }
    }
}
