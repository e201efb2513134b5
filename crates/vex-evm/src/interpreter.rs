//! Bytecode execution loop
//!
//! [`run`] drives one frame: fetch the opcode, look it up in the jump
//! table, validate stack depth and static-call restrictions, charge
//! constant then dynamic gas, grow memory, and finally execute. Running
//! past the end of the code is an implicit STOP. A frame never runs its
//! children here. When a CALL or CREATE family instruction has staged a
//! child request on [`Evm`], [`run`] suspends and hands the request back
//! to the orchestrator, which keeps the chain of live frames on a heap
//! stack and resumes this frame once the child has settled.

use crate::contract::Contract;
use crate::error::{EvmError, EvmResult};
use crate::evm::{Evm, FrameRequest};
use crate::gas;
use crate::memory::Memory;
use crate::opcode;
use crate::stack::{ReturnStack, Stack};
use bytes::Bytes;
use tracing::trace;
use vex_primitives::Address;

/// Everything local to one call or create frame.
pub struct Frame {
    /// Code, call parameters and gas counter.
    pub contract: Contract,
    /// Operand stack.
    pub stack: Stack,
    /// Byte-addressable scratch memory.
    pub memory: Memory,
    /// Subroutine return stack.
    pub rstack: ReturnStack,
    /// Program counter.
    pub pc: u64,
    /// Output of the most recent child call.
    pub return_data: Bytes,
    /// Authority claimed by the most recent successful AUTH.
    pub authorized: Option<Address>,
}

impl Frame {
    /// Fresh frame around `contract`.
    pub fn new(contract: Contract) -> Self {
        Self {
            contract,
            stack: Stack::new(),
            memory: Memory::new(),
            rstack: ReturnStack::new(),
            pc: 0,
            return_data: Bytes::new(),
            authorized: None,
        }
    }
}

/// Why [`run`] returned without an error.
pub(crate) enum Step {
    /// The frame finished with this output.
    Done(Bytes),
    /// The frame wants a child frame executed before it can continue.
    /// Its program counter already points past the requesting
    /// instruction, so a later [`run`] resumes where it left off.
    Call(FrameRequest),
}

/// Execute `frame` until it finishes or requests a child frame.
pub(crate) fn run(evm: &mut Evm<'_>, frame: &mut Frame) -> EvmResult<Step> {
    loop {
        if frame.pc as usize >= frame.contract.code.len() {
            // implicit STOP
            return Ok(Step::Done(Bytes::new()));
        }
        let byte = frame.contract.op(frame.pc);
        let operation = *evm
            .table
            .op(byte)
            .ok_or(EvmError::InvalidOpcode(byte))?;

        let depth = frame.stack.len();
        if depth < operation.min_stack {
            return Err(EvmError::StackUnderflow);
        }
        if depth > operation.max_stack {
            return Err(EvmError::StackOverflow);
        }
        if evm.read_only && operation.writes {
            return Err(EvmError::WriteProtection);
        }

        trace!(
            target: "vex_evm",
            pc = frame.pc,
            op = opcode::name(byte),
            gas = frame.contract.gas,
            stack = depth,
        );

        if !frame.contract.use_gas(operation.constant_gas) {
            return Err(EvmError::OutOfGas);
        }

        let mut mem_size = 0u64;
        if let Some(mem_fn) = operation.memory_size {
            let needed = mem_fn(&frame.stack)?;
            mem_size = gas::to_word_size(needed)?
                .checked_mul(32)
                .ok_or(EvmError::GasUintOverflow)?;
        }
        if let Some(dyn_fn) = operation.dynamic_gas {
            let dynamic = dyn_fn(evm, frame, mem_size)?;
            if !frame.contract.use_gas(dynamic) {
                return Err(EvmError::OutOfGas);
            }
        }
        if mem_size > 0 {
            frame.memory.resize(mem_size);
        }

        let output = (operation.execute)(evm, frame)?;

        if operation.reverts {
            return Err(EvmError::Revert(output.unwrap_or_default().to_vec()));
        }
        if operation.halts {
            return Ok(Step::Done(output.unwrap_or_default()));
        }
        if !operation.jumps {
            frame.pc += 1;
        }
        if let Some(request) = evm.pending_request.take() {
            return Ok(Step::Call(request));
        }
    }
}
