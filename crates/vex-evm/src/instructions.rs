//! Instruction implementations
//!
//! One function per opcode, dispatched through the jump table. Stack
//! depth is validated by the interpreter before dispatch, so bodies pop
//! and push freely; memory is already expanded by the time a body runs.
//!
//! The `mem_*` functions at the bottom compute, from the operand stack,
//! the highest memory byte an operation will touch. The interpreter uses
//! them to charge expansion gas and grow memory before execution.

use crate::error::{EvmError, EvmResult};
use crate::evm::{CallScheme, Evm, FrameRequest};
use crate::gas::cost;
use crate::interpreter::Frame;
use crate::opcode as op;
use crate::stack::Stack;
use crate::word;
use bytes::Bytes;
use primitive_types::U256;
use tracing::debug;
use vex_crypto::keccak256;
use vex_primitives::{Address, H256};

// ---- arithmetic ----

pub(crate) fn op_stop(_evm: &mut Evm<'_>, _frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    Ok(None)
}

pub(crate) fn op_add(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x.overflowing_add(*y).0;
    Ok(None)
}

pub(crate) fn op_mul(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x.overflowing_mul(*y).0;
    Ok(None)
}

pub(crate) fn op_sub(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x.overflowing_sub(*y).0;
    Ok(None)
}

pub(crate) fn op_div(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = if y.is_zero() { U256::zero() } else { x / *y };
    Ok(None)
}

pub(crate) fn op_sdiv(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::sdiv(x, *y);
    Ok(None)
}

pub(crate) fn op_mod(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = if y.is_zero() { U256::zero() } else { x % *y };
    Ok(None)
}

pub(crate) fn op_smod(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::smod(x, *y);
    Ok(None)
}

pub(crate) fn op_addmod(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.pop()?;
    let n = frame.stack.peek_mut()?;
    *n = word::addmod(x, y, *n);
    Ok(None)
}

pub(crate) fn op_mulmod(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.pop()?;
    let n = frame.stack.peek_mut()?;
    *n = word::mulmod(x, y, *n);
    Ok(None)
}

pub(crate) fn op_exp(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let base = frame.stack.pop()?;
    let power = frame.stack.peek_mut()?;
    *power = word::exp(base, *power);
    Ok(None)
}

pub(crate) fn op_signextend(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let back = frame.stack.pop()?;
    let value = frame.stack.peek_mut()?;
    *value = word::signextend(back, *value);
    Ok(None)
}

// ---- comparison and bitwise ----

pub(crate) fn op_lt(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::from_bool(x < *y);
    Ok(None)
}

pub(crate) fn op_gt(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::from_bool(x > *y);
    Ok(None)
}

pub(crate) fn op_slt(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::from_bool(word::slt(&x, y));
    Ok(None)
}

pub(crate) fn op_sgt(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::from_bool(word::sgt(&x, y));
    Ok(None)
}

pub(crate) fn op_eq(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = word::from_bool(x == *y);
    Ok(None)
}

pub(crate) fn op_iszero(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.peek_mut()?;
    *x = word::from_bool(x.is_zero());
    Ok(None)
}

pub(crate) fn op_and(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x & *y;
    Ok(None)
}

pub(crate) fn op_or(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x | *y;
    Ok(None)
}

pub(crate) fn op_xor(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.pop()?;
    let y = frame.stack.peek_mut()?;
    *y = x ^ *y;
    Ok(None)
}

pub(crate) fn op_not(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let x = frame.stack.peek_mut()?;
    *x = !*x;
    Ok(None)
}

pub(crate) fn op_byte(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let i = frame.stack.pop()?;
    let x = frame.stack.peek_mut()?;
    *x = word::byte(i, *x);
    Ok(None)
}

pub(crate) fn op_shl(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let shift = frame.stack.pop()?;
    let value = frame.stack.peek_mut()?;
    *value = word::shl(shift, *value);
    Ok(None)
}

pub(crate) fn op_shr(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let shift = frame.stack.pop()?;
    let value = frame.stack.peek_mut()?;
    *value = word::shr(shift, *value);
    Ok(None)
}

pub(crate) fn op_sar(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let shift = frame.stack.pop()?;
    let value = frame.stack.peek_mut()?;
    *value = word::sar(shift, *value);
    Ok(None)
}

// ---- hashing ----

pub(crate) fn op_keccak256(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let data = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    frame.stack.push(keccak256(&data).into_word())?;
    Ok(None)
}

// ---- environment ----

pub(crate) fn op_address(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(frame.contract.address.into_word())?;
    Ok(None)
}

pub(crate) fn op_balance(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let addr = Address::from_word(frame.stack.pop()?);
    evm.state.add_address_to_access_list(&addr);
    frame.stack.push(evm.state.balance(&addr))?;
    Ok(None)
}

pub(crate) fn op_origin(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(evm.tx.origin.into_word())?;
    Ok(None)
}

pub(crate) fn op_caller(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(frame.contract.caller.into_word())?;
    Ok(None)
}

pub(crate) fn op_callvalue(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(frame.contract.value)?;
    Ok(None)
}

pub(crate) fn op_calldataload(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let word = load_word(&frame.contract.input, &offset);
    frame.stack.push(word)?;
    Ok(None)
}

pub(crate) fn op_calldatasize(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.contract.input.len()))?;
    Ok(None)
}

pub(crate) fn op_calldatacopy(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let mem_offset = frame.stack.pop()?;
    let data_offset = frame.stack.pop()?;
    let len = frame.stack.pop()?.low_u64() as usize;
    if len > 0 {
        let data = padded_slice(&frame.contract.input, &data_offset, len);
        frame
            .memory
            .store_slice(mem_offset.low_u64() as usize, &data);
    }
    Ok(None)
}

pub(crate) fn op_codesize(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.contract.code.len()))?;
    Ok(None)
}

pub(crate) fn op_codecopy(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let mem_offset = frame.stack.pop()?;
    let code_offset = frame.stack.pop()?;
    let len = frame.stack.pop()?.low_u64() as usize;
    if len > 0 {
        let data = padded_slice(&frame.contract.code, &code_offset, len);
        frame
            .memory
            .store_slice(mem_offset.low_u64() as usize, &data);
    }
    Ok(None)
}

pub(crate) fn op_gasprice(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(evm.tx.gas_price)?;
    Ok(None)
}

pub(crate) fn op_extcodesize(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let addr = Address::from_word(frame.stack.pop()?);
    evm.state.add_address_to_access_list(&addr);
    frame.stack.push(U256::from(evm.state.code_size(&addr)))?;
    Ok(None)
}

pub(crate) fn op_extcodecopy(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let addr = Address::from_word(frame.stack.pop()?);
    evm.state.add_address_to_access_list(&addr);
    let mem_offset = frame.stack.pop()?;
    let code_offset = frame.stack.pop()?;
    let len = frame.stack.pop()?.low_u64() as usize;
    if len > 0 {
        let code = evm.state.code(&addr);
        let data = padded_slice(&code, &code_offset, len);
        frame
            .memory
            .store_slice(mem_offset.low_u64() as usize, &data);
    }
    Ok(None)
}

pub(crate) fn op_returndatasize(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.return_data.len()))?;
    Ok(None)
}

pub(crate) fn op_returndatacopy(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let mem_offset = frame.stack.pop()?;
    let data_offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let end = data_offset
        .checked_add(len)
        .ok_or(EvmError::ReturnDataOutOfBounds)?;
    if end > U256::from(frame.return_data.len()) {
        return Err(EvmError::ReturnDataOutOfBounds);
    }
    let len = len.low_u64() as usize;
    if len > 0 {
        let start = data_offset.low_u64() as usize;
        let data = frame.return_data.slice(start..start + len);
        frame
            .memory
            .store_slice(mem_offset.low_u64() as usize, &data);
    }
    Ok(None)
}

pub(crate) fn op_extcodehash(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let addr = Address::from_word(frame.stack.pop()?);
    evm.state.add_address_to_access_list(&addr);
    let hash = if evm.state.is_empty(&addr) {
        U256::zero()
    } else {
        evm.state.code_hash(&addr).into_word()
    };
    frame.stack.push(hash)?;
    Ok(None)
}

// ---- block ----

pub(crate) fn op_blockhash(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let requested = frame.stack.pop()?;
    let current = evm.block.number;
    let hash = match word::to_u64(&requested) {
        // only the 256 most recent blocks are visible
        Some(n) if n < current && current - n <= 256 => evm
            .block
            .block_hashes
            .get(&n)
            .copied()
            .unwrap_or(H256::ZERO),
        _ => H256::ZERO,
    };
    frame.stack.push(hash.into_word())?;
    Ok(None)
}

pub(crate) fn op_coinbase(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(evm.block.coinbase.into_word())?;
    Ok(None)
}

pub(crate) fn op_timestamp(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(evm.block.timestamp))?;
    Ok(None)
}

pub(crate) fn op_number(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(evm.block.number))?;
    Ok(None)
}

pub(crate) fn op_difficulty(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(evm.block.prevrandao.into_word())?;
    Ok(None)
}

pub(crate) fn op_gaslimit(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(evm.block.gas_limit))?;
    Ok(None)
}

pub(crate) fn op_chainid(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(evm.rules.chain_id))?;
    Ok(None)
}

pub(crate) fn op_selfbalance(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let balance = evm.state.balance(&frame.contract.address);
    frame.stack.push(balance)?;
    Ok(None)
}

pub(crate) fn op_basefee(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(evm.block.base_fee)?;
    Ok(None)
}

// ---- stack, memory, storage, flow ----

pub(crate) fn op_pop(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.pop()?;
    Ok(None)
}

pub(crate) fn op_mload(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.peek_mut()?;
    let word = frame.memory.load(offset.low_u64() as usize);
    *offset = U256::from_big_endian(&word);
    Ok(None)
}

pub(crate) fn op_mstore(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let value = frame.stack.pop()?;
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    frame.memory.store(offset.low_u64() as usize, &buf);
    Ok(None)
}

pub(crate) fn op_mstore8(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let value = frame.stack.pop()?;
    frame
        .memory
        .store8(offset.low_u64() as usize, value.low_u64() as u8);
    Ok(None)
}

pub(crate) fn op_sload(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let key = frame.stack.peek_mut()?;
    let value = evm
        .state
        .storage(&frame.contract.address, &H256::from_word(*key));
    *key = value.into_word();
    Ok(None)
}

pub(crate) fn op_sstore(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let key = H256::from_word(frame.stack.pop()?);
    let value = H256::from_word(frame.stack.pop()?);
    evm.state.set_storage(&frame.contract.address, key, value);
    Ok(None)
}

pub(crate) fn op_jump(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let dest = frame.stack.pop()?;
    if !frame.contract.valid_jumpdest(&dest) {
        return Err(EvmError::InvalidJump(dest.low_u64()));
    }
    frame.pc = dest.low_u64();
    Ok(None)
}

pub(crate) fn op_jumpi(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let dest = frame.stack.pop()?;
    let cond = frame.stack.pop()?;
    if cond.is_zero() {
        frame.pc += 1;
        return Ok(None);
    }
    if !frame.contract.valid_jumpdest(&dest) {
        return Err(EvmError::InvalidJump(dest.low_u64()));
    }
    frame.pc = dest.low_u64();
    Ok(None)
}

pub(crate) fn op_pc(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.pc))?;
    Ok(None)
}

pub(crate) fn op_msize(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.memory.size()))?;
    Ok(None)
}

pub(crate) fn op_gas(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(frame.contract.gas))?;
    Ok(None)
}

pub(crate) fn op_jumpdest(_evm: &mut Evm<'_>, _frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    Ok(None)
}

// ---- subroutines ----

/// BEGINSUB is only a landing marker for JUMPSUB; reaching it through
/// sequential execution aborts the frame.
pub(crate) fn op_beginsub(_evm: &mut Evm<'_>, _frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    Err(EvmError::InvalidSubroutineEntry)
}

pub(crate) fn op_jumpsub(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let dest = frame.stack.pop()?;
    let Some(pos) = word::to_u64(&dest) else {
        return Err(EvmError::InvalidSubroutineEntry);
    };
    if frame.contract.op(pos) != op::BEGINSUB || !frame.contract.is_code(pos as usize) {
        return Err(EvmError::InvalidSubroutineEntry);
    }
    frame.rstack.push(frame.pc)?;
    frame.pc = pos + 1;
    Ok(None)
}

pub(crate) fn op_returnsub(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.pc = frame.rstack.pop()? + 1;
    Ok(None)
}

// ---- transient storage and memory copy ----

pub(crate) fn op_tload(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let key = frame.stack.peek_mut()?;
    let value = evm
        .state
        .transient_storage(&frame.contract.address, &H256::from_word(*key));
    *key = value.into_word();
    Ok(None)
}

pub(crate) fn op_tstore(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let key = H256::from_word(frame.stack.pop()?);
    let value = H256::from_word(frame.stack.pop()?);
    evm.state
        .set_transient_storage(&frame.contract.address, key, value);
    Ok(None)
}

pub(crate) fn op_mcopy(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let dest = frame.stack.pop()?;
    let src = frame.stack.pop()?;
    let len = frame.stack.pop()?.low_u64() as usize;
    frame
        .memory
        .copy(dest.low_u64() as usize, src.low_u64() as usize, len);
    Ok(None)
}

// ---- push, dup, swap, log ----

pub(crate) fn op_push(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let n = (frame.contract.op(frame.pc) - op::PUSH1) as usize + 1;
    let code = &frame.contract.code;
    let start = frame.pc as usize + 1;
    let end = (start + n).min(code.len());
    // immediate bytes missing past the code end read as zero
    let mut buf = [0u8; 32];
    if start < code.len() {
        buf[32 - n..32 - n + (end - start)].copy_from_slice(&code[start..end]);
    }
    frame.stack.push(U256::from_big_endian(&buf))?;
    frame.pc += n as u64;
    Ok(None)
}

pub(crate) fn op_dup(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let n = (frame.contract.op(frame.pc) - op::DUP1) as usize;
    frame.stack.dup(n)?;
    Ok(None)
}

pub(crate) fn op_swap(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let n = (frame.contract.op(frame.pc) - op::SWAP1) as usize + 1;
    frame.stack.swap(n)?;
    Ok(None)
}

pub(crate) fn op_log(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let topic_count = (frame.contract.op(frame.pc) - op::LOG0) as usize;
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        topics.push(H256::from_word(frame.stack.pop()?));
    }
    let data = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    evm.state.add_log(crate::state::Log {
        address: frame.contract.address,
        topics,
        data,
        block_number: evm.block.number,
    });
    Ok(None)
}

// ---- VexChain extensions ----

/// Debug print for contract developers: logs the selected memory slice
/// through the node's tracing output.
pub(crate) fn op_printf(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let data = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    debug!(
        target: "vex_evm",
        contract = %frame.contract.address,
        text = %String::from_utf8_lossy(&data),
        raw = %hex::encode(&data),
        "contract printf"
    );
    Ok(None)
}

/// Move value from the executing account's balance into the stake of a
/// beneficiary. Pushes 1 on success, 0 if the balance cannot cover it.
pub(crate) fn op_stake(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let beneficiary = Address::from_word(frame.stack.pop()?);
    let amount = frame.stack.pop()?;
    let address = frame.contract.address;
    if evm.state.balance(&address) < amount {
        frame.stack.push(U256::zero())?;
        return Ok(None);
    }
    evm.state.sub_balance(&address, amount);
    evm.state.add_stake(&beneficiary, amount);
    debug!(target: "vex_evm", from = %address, to = %beneficiary, %amount, "stake");
    frame.stack.push(U256::one())?;
    Ok(None)
}

/// Move value out of a beneficiary's stake back into its balance.
/// Pushes 1 on success, 0 if the stake cannot cover it.
pub(crate) fn op_unstake(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let beneficiary = Address::from_word(frame.stack.pop()?);
    let amount = frame.stack.pop()?;
    if evm.state.stake_of(&beneficiary) < amount {
        frame.stack.push(U256::zero())?;
        return Ok(None);
    }
    evm.state.sub_stake(&beneficiary, amount);
    evm.state.add_balance(&beneficiary, amount);
    debug!(target: "vex_evm", to = %beneficiary, %amount, "unstake");
    frame.stack.push(U256::one())?;
    Ok(None)
}

pub(crate) fn op_getstake(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let addr = Address::from_word(frame.stack.pop()?);
    frame.stack.push(evm.state.stake_of(&addr))?;
    Ok(None)
}

/// Withdraw the executing account's whole stake into its balance and
/// push the amount withdrawn.
pub(crate) fn op_unstakeall(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let address = frame.contract.address;
    let amount = evm.state.remove_stake(&address);
    evm.state.add_balance(&address, amount);
    frame.stack.push(amount)?;
    Ok(None)
}

pub(crate) fn op_stakenum(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    frame.stack.push(U256::from(evm.state.stake_count()))?;
    Ok(None)
}

/// Claim authority over another account for subsequent AUTHCALLs in this
/// frame. The host validates the commitment; a rejected claim clears any
/// previously held authority.
pub(crate) fn op_auth(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let authority = Address::from_word(frame.stack.pop()?);
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let commit = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    let invoker = frame.contract.address;
    if evm.state.authorize(&invoker, &authority, &commit) {
        frame.authorized = Some(authority);
        frame.stack.push(U256::one())?;
    } else {
        frame.authorized = None;
        frame.stack.push(U256::zero())?;
    }
    Ok(None)
}

// ---- system ----

pub(crate) fn op_create(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let value = frame.stack.pop()?;
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let init_code = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);

    // all but one 64th of the remaining gas goes to the init frame
    let gas = frame.contract.gas - frame.contract.gas / 64;
    frame.contract.gas -= gas;

    evm.pending_request = Some(FrameRequest::Create {
        value,
        init_code: Bytes::from(init_code),
        gas,
        salt: None,
    });
    Ok(None)
}

pub(crate) fn op_create2(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let value = frame.stack.pop()?;
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let salt = H256::from_word(frame.stack.pop()?);
    let init_code = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);

    let gas = frame.contract.gas - frame.contract.gas / 64;
    frame.contract.gas -= gas;

    evm.pending_request = Some(FrameRequest::Create {
        value,
        init_code: Bytes::from(init_code),
        gas,
        salt: Some(salt),
    });
    Ok(None)
}

pub(crate) fn op_call(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let (to, value, input, out_offset, out_len) = pop_call_operands(frame, true)?;
    let mut gas = evm.call_gas_tmp;
    if !value.is_zero() {
        if evm.read_only {
            return Err(EvmError::WriteProtection);
        }
        gas += cost::CALL_STIPEND;
    }
    evm.pending_request = Some(FrameRequest::Call {
        scheme: CallScheme::Call,
        caller: frame.contract.address,
        address: to,
        code_addr: to,
        input,
        gas,
        value,
        out_offset,
        out_len,
    });
    Ok(None)
}

pub(crate) fn op_callcode(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let (to, value, input, out_offset, out_len) = pop_call_operands(frame, true)?;
    let mut gas = evm.call_gas_tmp;
    if !value.is_zero() {
        gas += cost::CALL_STIPEND;
    }
    evm.pending_request = Some(FrameRequest::Call {
        scheme: CallScheme::CallCode,
        caller: frame.contract.address,
        address: frame.contract.address,
        code_addr: to,
        input,
        gas,
        value,
        out_offset,
        out_len,
    });
    Ok(None)
}

pub(crate) fn op_delegatecall(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let (to, _, input, out_offset, out_len) = pop_call_operands(frame, false)?;
    evm.pending_request = Some(FrameRequest::Call {
        scheme: CallScheme::DelegateCall,
        caller: frame.contract.caller,
        address: frame.contract.address,
        code_addr: to,
        input,
        gas: evm.call_gas_tmp,
        value: frame.contract.value,
        out_offset,
        out_len,
    });
    Ok(None)
}

pub(crate) fn op_staticcall(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let (to, _, input, out_offset, out_len) = pop_call_operands(frame, false)?;
    evm.pending_request = Some(FrameRequest::Call {
        scheme: CallScheme::StaticCall,
        caller: frame.contract.address,
        address: to,
        code_addr: to,
        input,
        gas: evm.call_gas_tmp,
        value: U256::zero(),
        out_offset,
        out_len,
    });
    Ok(None)
}

/// Call with the caller set to the authority claimed by a prior AUTH.
/// No stipend is granted on value transfers.
pub(crate) fn op_authcall(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let authority = frame.authorized.ok_or(EvmError::AuthRequired)?;
    let (to, value, input, out_offset, out_len) = pop_call_operands(frame, true)?;
    if !value.is_zero() && evm.read_only {
        return Err(EvmError::WriteProtection);
    }
    evm.pending_request = Some(FrameRequest::Call {
        scheme: CallScheme::Call,
        caller: authority,
        address: to,
        code_addr: to,
        input,
        gas: evm.call_gas_tmp,
        value,
        out_offset,
        out_len,
    });
    Ok(None)
}

fn pop_call_operands(
    frame: &mut Frame,
    has_value: bool,
) -> EvmResult<(Address, U256, Bytes, usize, usize)> {
    // forwarded gas was fixed by the dynamic gas pass
    frame.stack.pop()?;
    let to = Address::from_word(frame.stack.pop()?);
    let value = if has_value {
        frame.stack.pop()?
    } else {
        U256::zero()
    };
    let in_offset = frame.stack.pop()?;
    let in_len = frame.stack.pop()?;
    let out_offset = frame.stack.pop()?;
    let out_len = frame.stack.pop()?;
    let input = Bytes::from(
        frame
            .memory
            .load_slice(in_offset.low_u64() as usize, in_len.low_u64() as usize),
    );
    Ok((
        to,
        value,
        input,
        out_offset.low_u64() as usize,
        out_len.low_u64() as usize,
    ))
}

pub(crate) fn op_return(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let data = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    Ok(Some(Bytes::from(data)))
}

pub(crate) fn op_revert(_evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let offset = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let data = frame
        .memory
        .load_slice(offset.low_u64() as usize, len.low_u64() as usize);
    Ok(Some(Bytes::from(data)))
}

pub(crate) fn op_selfdestruct(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Option<Bytes>> {
    let beneficiary = Address::from_word(frame.stack.pop()?);
    let address = frame.contract.address;
    let balance = evm.state.balance(&address);
    evm.state.sub_balance(&address, balance);
    evm.state.add_balance(&beneficiary, balance);
    evm.state.suicide(&address);
    debug!(target: "vex_evm", %address, %beneficiary, "selfdestruct");
    Ok(None)
}

// ---- memory size calculators ----

fn calc_mem(offset: &U256, len: &U256) -> EvmResult<u64> {
    if len.is_zero() {
        return Ok(0);
    }
    let offset = word::to_u64(offset).ok_or(EvmError::GasUintOverflow)?;
    let len = word::to_u64(len).ok_or(EvmError::GasUintOverflow)?;
    offset.checked_add(len).ok_or(EvmError::GasUintOverflow)
}

pub(crate) fn mem_keccak256(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, stack.peek_at(1)?)
}

pub(crate) fn mem_copy(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, stack.peek_at(2)?)
}

pub(crate) fn mem_ext_copy(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(1)?, stack.peek_at(3)?)
}

pub(crate) fn mem_mload(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, &U256::from(32u8))
}

pub(crate) fn mem_mstore(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, &U256::from(32u8))
}

pub(crate) fn mem_mstore8(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, &U256::one())
}

pub(crate) fn mem_return(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, stack.peek_at(1)?)
}

pub(crate) fn mem_log(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(0)?, stack.peek_at(1)?)
}

pub(crate) fn mem_mcopy(stack: &Stack) -> EvmResult<u64> {
    let dest = calc_mem(stack.peek_at(0)?, stack.peek_at(2)?)?;
    let src = calc_mem(stack.peek_at(1)?, stack.peek_at(2)?)?;
    Ok(dest.max(src))
}

pub(crate) fn mem_create(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(1)?, stack.peek_at(2)?)
}

pub(crate) fn mem_create2(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(1)?, stack.peek_at(2)?)
}

pub(crate) fn mem_call(stack: &Stack) -> EvmResult<u64> {
    let input = calc_mem(stack.peek_at(3)?, stack.peek_at(4)?)?;
    let output = calc_mem(stack.peek_at(5)?, stack.peek_at(6)?)?;
    Ok(input.max(output))
}

pub(crate) fn mem_delegatecall(stack: &Stack) -> EvmResult<u64> {
    let input = calc_mem(stack.peek_at(2)?, stack.peek_at(3)?)?;
    let output = calc_mem(stack.peek_at(4)?, stack.peek_at(5)?)?;
    Ok(input.max(output))
}

pub(crate) fn mem_auth(stack: &Stack) -> EvmResult<u64> {
    calc_mem(stack.peek_at(1)?, stack.peek_at(2)?)
}

// ---- helpers ----

/// 32-byte big-endian word at `offset` in `data`, zero-padded past the end.
fn load_word(data: &[u8], offset: &U256) -> U256 {
    let mut buf = [0u8; 32];
    if let Some(offset) = word::to_u64(offset) {
        let offset = offset as usize;
        if offset < data.len() {
            let end = (offset + 32).min(data.len());
            buf[..end - offset].copy_from_slice(&data[offset..end]);
        }
    }
    U256::from_big_endian(&buf)
}

/// `len` bytes of `data` starting at `offset`, zero-padded where the
/// source runs out.
fn padded_slice(data: &[u8], offset: &U256, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if let Some(offset) = word::to_u64(offset) {
        let offset = offset as usize;
        if offset < data.len() {
            let end = (offset + len).min(data.len());
            out[..end - offset].copy_from_slice(&data[offset..end]);
        }
    }
    out
}
