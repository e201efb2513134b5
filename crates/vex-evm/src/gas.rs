//! Gas cost calculations

use crate::error::{EvmError, EvmResult};
use crate::evm::Evm;
use crate::interpreter::Frame;
use crate::word;
use primitive_types::U256;
use vex_primitives::{Address, H256};

/// Gas costs for EVM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Quick operations (ADDRESS, CALLER, PC, ...)
    pub const BASE: u64 = 2;
    /// Fastest operations (ADD, NOT, PUSH, DUP, ...)
    pub const VERYLOW: u64 = 3;
    /// Fast operations (MUL, DIV, ...)
    pub const LOW: u64 = 5;
    /// Mid operations (ADDMOD, MULMOD, JUMP)
    pub const MID: u64 = 8;
    /// Slow operations (JUMPI, EXP base)
    pub const HIGH: u64 = 10;
    /// External account access before the repricing era
    pub const EXT: u64 = 20;
    /// JUMPDEST marker
    pub const JUMPDEST: u64 = 1;

    /// KECCAK256 base cost
    pub const SHA3: u64 = 30;
    /// KECCAK256 per-word cost
    pub const SHA3_WORD: u64 = 6;
    /// Per-word cost of copy operations
    pub const COPY: u64 = 3;
    /// Per-word cost of memory expansion (linear term)
    pub const MEMORY: u64 = 3;
    /// Divisor of the quadratic memory expansion term
    pub const MEMORY_QUAD_DIVISOR: u64 = 512;

    /// SLOAD before the repricing era
    pub const SLOAD: u64 = 50;
    /// SLOAD after the repricing era
    pub const SLOAD_REPRICED: u64 = 800;
    /// SSTORE writing a non-zero value into an empty slot
    pub const SSTORE_SET: u64 = 20_000;
    /// SSTORE on an already occupied slot
    pub const SSTORE_RESET: u64 = 5_000;
    /// Refund for clearing a storage slot
    pub const SSTORE_REFUND: u64 = 15_000;
    /// TLOAD and TSTORE
    pub const TRANSIENT: u64 = 100;

    /// LOG base cost
    pub const LOG: u64 = 375;
    /// LOG per-topic cost
    pub const LOG_TOPIC: u64 = 375;
    /// LOG per-byte cost
    pub const LOG_DATA: u64 = 8;

    /// EXP per-exponent-byte cost before the repricing era
    pub const EXP_BYTE: u64 = 10;
    /// EXP per-exponent-byte cost after the repricing era
    pub const EXP_BYTE_REPRICED: u64 = 50;

    /// CREATE and CREATE2 base cost
    pub const CREATE: u64 = 32_000;
    /// Per-byte cost of depositing contract code
    pub const CREATE_DATA: u64 = 200;

    /// CALL family base cost before the repricing era
    pub const CALL: u64 = 40;
    /// CALL family base cost after the repricing era
    pub const CALL_REPRICED: u64 = 700;
    /// Surcharge for transferring value
    pub const CALL_VALUE: u64 = 9_000;
    /// Surcharge for calling into a previously non-existent account
    pub const CALL_NEW_ACCOUNT: u64 = 25_000;
    /// Free gas handed to the callee of a value transfer
    pub const CALL_STIPEND: u64 = 2_300;

    /// SELFDESTRUCT after the repricing era
    pub const SELFDESTRUCT: u64 = 5_000;
    /// SELFDESTRUCT surcharge when funds go to a fresh account
    pub const SELFDESTRUCT_NEW_ACCOUNT: u64 = 25_000;
    /// Refund for the first SELFDESTRUCT of an account
    pub const SELFDESTRUCT_REFUND: u64 = 24_000;

    /// EXTCODEHASH when introduced
    pub const EXTCODEHASH: u64 = 400;
    /// BALANCE before the repricing era
    pub const BALANCE: u64 = 20;
    /// CHAINID
    pub const CHAINID: u64 = 2;
    /// SELFBALANCE
    pub const SELFBALANCE: u64 = 5;
    /// BLOCKHASH
    pub const BLOCKHASH: u64 = 20;

    /// STAKE base cost
    pub const STAKE: u64 = 20_000;
    /// UNSTAKE base cost
    pub const UNSTAKE: u64 = 20_000;
    /// GETSTAKE base cost
    pub const GETSTAKE: u64 = 800;
    /// UNSTAKEALL base cost
    pub const UNSTAKEALL: u64 = 5_000;
    /// STAKENUM base cost
    pub const STAKENUM: u64 = 800;
    /// PRINTF base cost
    pub const PRINTF: u64 = 3;
    /// AUTH base cost
    pub const AUTH: u64 = 3_100;

    /// Maximum operand stack depth
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Maximum subroutine return stack depth
    pub const RETURN_STACK_LIMIT: usize = 1023;
    /// Maximum call/create frame depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Maximum size of deployed contract code in bytes
    pub const MAX_CODE_SIZE: usize = 24_576;
}

/// Number of 32-byte words needed to hold `size` bytes.
pub fn to_word_size(size: u64) -> EvmResult<u64> {
    size.checked_add(31)
        .map(|s| s / 32)
        .ok_or(EvmError::GasUintOverflow)
}

/// Gas forwarded to a child call: the smaller of the requested amount and
/// all but one 64th of what remains after the base charge.
pub fn call_gas(available: u64, base: u64, requested: &U256) -> EvmResult<u64> {
    let available = available.checked_sub(base).ok_or(EvmError::OutOfGas)?;
    let cap = available - available / 64;
    Ok(match word::to_u64(requested) {
        Some(r) if r < cap => r,
        _ => cap,
    })
}

fn add(a: u64, b: u64) -> EvmResult<u64> {
    a.checked_add(b).ok_or(EvmError::GasUintOverflow)
}

fn mul(a: u64, b: u64) -> EvmResult<u64> {
    a.checked_mul(b).ok_or(EvmError::GasUintOverflow)
}

/// Memory expansion only (MLOAD, MSTORE, RETURN, REVERT, PRINTF, AUTH, ...).
pub(crate) fn gas_memory(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    frame.memory.expansion_gas(mem_size)
}

/// EXP charges per significant byte of the exponent; the per-byte price
/// was raised by the repricing rules.
pub(crate) fn gas_exp(evm: &mut Evm<'_>, frame: &mut Frame, _mem: u64) -> EvmResult<u64> {
    let per_byte = if evm.rules.is_byzantium {
        cost::EXP_BYTE_REPRICED
    } else {
        cost::EXP_BYTE
    };
    mul(per_byte, word::byte_length(frame.stack.peek_at(1)?))
}

pub(crate) fn gas_keccak256(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let len = word::to_u64(frame.stack.peek_at(1)?).ok_or(EvmError::GasUintOverflow)?;
    let gas = frame.memory.expansion_gas(mem_size)?;
    add(gas, mul(cost::SHA3_WORD, to_word_size(len)?)?)
}

/// CALLDATACOPY, CODECOPY and RETURNDATACOPY: length is the third operand.
pub(crate) fn gas_copy(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let len = word::to_u64(frame.stack.peek_at(2)?).ok_or(EvmError::GasUintOverflow)?;
    let gas = frame.memory.expansion_gas(mem_size)?;
    add(gas, mul(cost::COPY, to_word_size(len)?)?)
}

/// EXTCODECOPY: length is the fourth operand.
pub(crate) fn gas_ext_copy(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let len = word::to_u64(frame.stack.peek_at(3)?).ok_or(EvmError::GasUintOverflow)?;
    let gas = frame.memory.expansion_gas(mem_size)?;
    add(gas, mul(cost::COPY, to_word_size(len)?)?)
}

pub(crate) fn gas_mcopy(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let len = word::to_u64(frame.stack.peek_at(2)?).ok_or(EvmError::GasUintOverflow)?;
    let gas = frame.memory.expansion_gas(mem_size)?;
    add(gas, mul(cost::COPY, to_word_size(len)?)?)
}

/// LOGn: the topic count is recovered from the opcode byte under the pc.
pub(crate) fn gas_log(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let topics = (frame.contract.op(frame.pc) - crate::opcode::LOG0) as u64;
    let len = word::to_u64(frame.stack.peek_at(1)?).ok_or(EvmError::GasUintOverflow)?;
    let mut gas = frame.memory.expansion_gas(mem_size)?;
    gas = add(gas, cost::LOG)?;
    gas = add(gas, mul(cost::LOG_TOPIC, topics)?)?;
    add(gas, mul(cost::LOG_DATA, len)?)
}

/// Legacy SSTORE pricing: 20000 to fill an empty slot, 5000 otherwise,
/// with a 15000 refund for clearing.
pub(crate) fn gas_sstore(evm: &mut Evm<'_>, frame: &mut Frame, _mem: u64) -> EvmResult<u64> {
    let key = H256::from_word(*frame.stack.peek_at(0)?);
    let value: U256 = *frame.stack.peek_at(1)?;
    let current = evm.state.storage(&frame.contract.address, &key);
    if current.is_zero() && !value.is_zero() {
        Ok(cost::SSTORE_SET)
    } else {
        if !current.is_zero() && value.is_zero() {
            evm.state.add_refund(cost::SSTORE_REFUND);
        }
        Ok(cost::SSTORE_RESET)
    }
}

pub(crate) fn gas_create(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    frame.memory.expansion_gas(mem_size)
}

/// CREATE2 additionally pays to hash the init code.
pub(crate) fn gas_create2(
    _evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let len = word::to_u64(frame.stack.peek_at(2)?).ok_or(EvmError::GasUintOverflow)?;
    let gas = frame.memory.expansion_gas(mem_size)?;
    add(gas, mul(cost::SHA3_WORD, to_word_size(len)?)?)
}

fn call_like(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
    has_value: bool,
) -> EvmResult<u64> {
    let mut gas = frame.memory.expansion_gas(mem_size)?;
    if has_value {
        let target = Address::from_word(*frame.stack.peek_at(1)?);
        let value = *frame.stack.peek_at(2)?;
        if !value.is_zero() {
            gas = add(gas, cost::CALL_VALUE)?;
            if evm.state.is_empty(&target) {
                gas = add(gas, cost::CALL_NEW_ACCOUNT)?;
            }
        }
    }
    let requested = *frame.stack.peek_at(0)?;
    evm.call_gas_tmp = call_gas(frame.contract.gas, gas, &requested)?;
    add(gas, evm.call_gas_tmp)
}

pub(crate) fn gas_call(evm: &mut Evm<'_>, frame: &mut Frame, mem_size: u64) -> EvmResult<u64> {
    call_like(evm, frame, mem_size, true)
}

/// CALLCODE runs in the caller's own account, so the new-account
/// surcharge never applies, but the value surcharge does.
pub(crate) fn gas_callcode(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    let mut gas = frame.memory.expansion_gas(mem_size)?;
    if !frame.stack.peek_at(2)?.is_zero() {
        gas = add(gas, cost::CALL_VALUE)?;
    }
    let requested = *frame.stack.peek_at(0)?;
    evm.call_gas_tmp = call_gas(frame.contract.gas, gas, &requested)?;
    add(gas, evm.call_gas_tmp)
}

pub(crate) fn gas_delegatecall(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    call_like(evm, frame, mem_size, false)
}

pub(crate) fn gas_staticcall(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    call_like(evm, frame, mem_size, false)
}

/// AUTHCALL prices like CALL but never grants the stipend.
pub(crate) fn gas_authcall(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    mem_size: u64,
) -> EvmResult<u64> {
    call_like(evm, frame, mem_size, true)
}

pub(crate) fn gas_selfdestruct(
    evm: &mut Evm<'_>,
    frame: &mut Frame,
    _mem: u64,
) -> EvmResult<u64> {
    let beneficiary = Address::from_word(*frame.stack.peek_at(0)?);
    let address = frame.contract.address;
    let mut gas = 0u64;
    if evm.state.is_empty(&beneficiary) && !evm.state.balance(&address).is_zero() {
        gas = cost::SELFDESTRUCT_NEW_ACCOUNT;
    }
    if !evm.state.has_suicided(&address) {
        evm.state.add_refund(cost::SELFDESTRUCT_REFUND);
    }
    Ok(gas)
}
