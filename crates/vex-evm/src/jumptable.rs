//! Opcode dispatch table
//!
//! A [`JumpTable`] maps each opcode byte to its [`Operation`]: execute
//! function, gas schedule, stack requirements and control flags. The
//! table for a block is built by starting from the genesis table and
//! applying one patch per active rule set, oldest first, so a later rule
//! set can reprice or replace what an earlier one installed. The flat
//! gas rescale patch always runs last.

use crate::config::ChainRules;
use crate::error::EvmResult;
use crate::evm::Evm;
use crate::gas::{self, cost};
use crate::instructions as ins;
use crate::interpreter::Frame;
use crate::opcode as op;
use crate::stack::Stack;
use bytes::Bytes;

/// Instruction body. Returns the frame output for halting operations,
/// `None` otherwise.
pub type ExecuteFn = fn(&mut Evm<'_>, &mut Frame) -> EvmResult<Option<Bytes>>;

/// Dynamic gas calculator. Receives the word-aligned memory size the
/// operation needs and returns the gas owed on top of the constant cost.
pub type DynGasFn = fn(&mut Evm<'_>, &mut Frame, u64) -> EvmResult<u64>;

/// Computes the highest memory byte an operation will touch, from its
/// stack operands, before the operation runs.
pub type MemSizeFn = fn(&Stack) -> EvmResult<u64>;

/// Everything the interpreter needs to dispatch one opcode.
#[derive(Clone, Copy)]
pub struct Operation {
    /// Instruction body.
    pub execute: ExecuteFn,
    /// Gas charged unconditionally before execution.
    pub constant_gas: u64,
    /// Extra gas computed from operands, if any.
    pub dynamic_gas: Option<DynGasFn>,
    /// Fewest stack items the operation needs.
    pub min_stack: usize,
    /// Largest stack depth at which the operation still fits its pushes,
    /// encoded as `1024 + pops - pushes`.
    pub max_stack: usize,
    /// Memory requirement of the operation, if it touches memory.
    pub memory_size: Option<MemSizeFn>,
    /// Operation ends the frame.
    pub halts: bool,
    /// Operation sets the program counter itself.
    pub jumps: bool,
    /// Operation mutates state and is barred inside static calls.
    pub writes: bool,
    /// Operation reverts the frame.
    pub reverts: bool,
    /// Operation produces return data.
    pub returns: bool,
}

impl Operation {
    fn new(execute: ExecuteFn, constant_gas: u64, pops: usize, pushes: usize) -> Self {
        Self {
            execute,
            constant_gas,
            dynamic_gas: None,
            min_stack: pops,
            max_stack: cost::MAX_STACK_SIZE + pops - pushes,
            memory_size: None,
            halts: false,
            jumps: false,
            writes: false,
            reverts: false,
            returns: false,
        }
    }

    fn dyn_gas(mut self, f: DynGasFn) -> Self {
        self.dynamic_gas = Some(f);
        self
    }

    fn mem(mut self, f: MemSizeFn) -> Self {
        self.memory_size = Some(f);
        self
    }

    fn halting(mut self) -> Self {
        self.halts = true;
        self
    }

    fn jumping(mut self) -> Self {
        self.jumps = true;
        self
    }

    fn writing(mut self) -> Self {
        self.writes = true;
        self
    }

    fn reverting(mut self) -> Self {
        self.reverts = true;
        self
    }

    fn returning(mut self) -> Self {
        self.returns = true;
        self
    }
}

/// Dispatch table for one block's rule set.
pub struct JumpTable {
    ops: [Option<Operation>; 256],
}

impl JumpTable {
    /// Build the table for `rules`, layering fork patches over the
    /// genesis table.
    pub fn for_rules(rules: &ChainRules) -> Self {
        let mut table = Self::genesis();
        if rules.is_homestead {
            table.patch_homestead();
        }
        if rules.is_byzantium {
            table.patch_byzantium();
        }
        if rules.is_constantinople {
            table.patch_constantinople();
        }
        if rules.is_istanbul {
            table.patch_istanbul();
        }
        if rules.has_subroutines {
            table.patch_subroutines();
        }
        if rules.has_transient_storage {
            table.patch_transient_storage();
        }
        if rules.has_staking {
            table.patch_staking();
        }
        if let Some(factor) = rules.rescale {
            table.patch_rescale(factor);
        }
        table
    }

    /// Operation for `byte`, `None` for unassigned opcodes.
    pub fn op(&self, byte: u8) -> Option<&Operation> {
        self.ops[byte as usize].as_ref()
    }

    fn set(&mut self, byte: u8, operation: Operation) {
        self.ops[byte as usize] = Some(operation);
    }

    fn reprice(&mut self, byte: u8, constant_gas: u64) {
        if let Some(operation) = self.ops[byte as usize].as_mut() {
            operation.constant_gas = constant_gas;
        }
    }

    fn genesis() -> Self {
        let mut t = Self { ops: [None; 256] };

        t.set(op::STOP, Operation::new(ins::op_stop, cost::ZERO, 0, 0).halting());
        t.set(op::ADD, Operation::new(ins::op_add, cost::VERYLOW, 2, 1));
        t.set(op::MUL, Operation::new(ins::op_mul, cost::LOW, 2, 1));
        t.set(op::SUB, Operation::new(ins::op_sub, cost::VERYLOW, 2, 1));
        t.set(op::DIV, Operation::new(ins::op_div, cost::LOW, 2, 1));
        t.set(op::SDIV, Operation::new(ins::op_sdiv, cost::LOW, 2, 1));
        t.set(op::MOD, Operation::new(ins::op_mod, cost::LOW, 2, 1));
        t.set(op::SMOD, Operation::new(ins::op_smod, cost::LOW, 2, 1));
        t.set(op::ADDMOD, Operation::new(ins::op_addmod, cost::MID, 3, 1));
        t.set(op::MULMOD, Operation::new(ins::op_mulmod, cost::MID, 3, 1));
        t.set(
            op::EXP,
            Operation::new(ins::op_exp, cost::HIGH, 2, 1).dyn_gas(gas::gas_exp),
        );
        t.set(
            op::SIGNEXTEND,
            Operation::new(ins::op_signextend, cost::LOW, 2, 1),
        );

        t.set(op::LT, Operation::new(ins::op_lt, cost::VERYLOW, 2, 1));
        t.set(op::GT, Operation::new(ins::op_gt, cost::VERYLOW, 2, 1));
        t.set(op::SLT, Operation::new(ins::op_slt, cost::VERYLOW, 2, 1));
        t.set(op::SGT, Operation::new(ins::op_sgt, cost::VERYLOW, 2, 1));
        t.set(op::EQ, Operation::new(ins::op_eq, cost::VERYLOW, 2, 1));
        t.set(op::ISZERO, Operation::new(ins::op_iszero, cost::VERYLOW, 1, 1));
        t.set(op::AND, Operation::new(ins::op_and, cost::VERYLOW, 2, 1));
        t.set(op::OR, Operation::new(ins::op_or, cost::VERYLOW, 2, 1));
        t.set(op::XOR, Operation::new(ins::op_xor, cost::VERYLOW, 2, 1));
        t.set(op::NOT, Operation::new(ins::op_not, cost::VERYLOW, 1, 1));
        t.set(op::BYTE, Operation::new(ins::op_byte, cost::VERYLOW, 2, 1));

        t.set(
            op::KECCAK256,
            Operation::new(ins::op_keccak256, cost::SHA3, 2, 1)
                .dyn_gas(gas::gas_keccak256)
                .mem(ins::mem_keccak256),
        );

        t.set(op::ADDRESS, Operation::new(ins::op_address, cost::BASE, 0, 1));
        t.set(op::BALANCE, Operation::new(ins::op_balance, cost::BALANCE, 1, 1));
        t.set(op::ORIGIN, Operation::new(ins::op_origin, cost::BASE, 0, 1));
        t.set(op::CALLER, Operation::new(ins::op_caller, cost::BASE, 0, 1));
        t.set(
            op::CALLVALUE,
            Operation::new(ins::op_callvalue, cost::BASE, 0, 1),
        );
        t.set(
            op::CALLDATALOAD,
            Operation::new(ins::op_calldataload, cost::VERYLOW, 1, 1),
        );
        t.set(
            op::CALLDATASIZE,
            Operation::new(ins::op_calldatasize, cost::BASE, 0, 1),
        );
        t.set(
            op::CALLDATACOPY,
            Operation::new(ins::op_calldatacopy, cost::VERYLOW, 3, 0)
                .dyn_gas(gas::gas_copy)
                .mem(ins::mem_copy),
        );
        t.set(op::CODESIZE, Operation::new(ins::op_codesize, cost::BASE, 0, 1));
        t.set(
            op::CODECOPY,
            Operation::new(ins::op_codecopy, cost::VERYLOW, 3, 0)
                .dyn_gas(gas::gas_copy)
                .mem(ins::mem_copy),
        );
        t.set(op::GASPRICE, Operation::new(ins::op_gasprice, cost::BASE, 0, 1));
        t.set(
            op::EXTCODESIZE,
            Operation::new(ins::op_extcodesize, cost::EXT, 1, 1),
        );
        t.set(
            op::EXTCODECOPY,
            Operation::new(ins::op_extcodecopy, cost::EXT, 4, 0)
                .dyn_gas(gas::gas_ext_copy)
                .mem(ins::mem_ext_copy),
        );

        t.set(
            op::BLOCKHASH,
            Operation::new(ins::op_blockhash, cost::BLOCKHASH, 1, 1),
        );
        t.set(op::COINBASE, Operation::new(ins::op_coinbase, cost::BASE, 0, 1));
        t.set(
            op::TIMESTAMP,
            Operation::new(ins::op_timestamp, cost::BASE, 0, 1),
        );
        t.set(op::NUMBER, Operation::new(ins::op_number, cost::BASE, 0, 1));
        t.set(
            op::DIFFICULTY,
            Operation::new(ins::op_difficulty, cost::BASE, 0, 1),
        );
        t.set(op::GASLIMIT, Operation::new(ins::op_gaslimit, cost::BASE, 0, 1));

        t.set(op::POP, Operation::new(ins::op_pop, cost::BASE, 1, 0));
        t.set(
            op::MLOAD,
            Operation::new(ins::op_mload, cost::VERYLOW, 1, 1)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_mload),
        );
        t.set(
            op::MSTORE,
            Operation::new(ins::op_mstore, cost::VERYLOW, 2, 0)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_mstore),
        );
        t.set(
            op::MSTORE8,
            Operation::new(ins::op_mstore8, cost::VERYLOW, 2, 0)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_mstore8),
        );
        t.set(op::SLOAD, Operation::new(ins::op_sload, cost::SLOAD, 1, 1));
        t.set(
            op::SSTORE,
            Operation::new(ins::op_sstore, cost::ZERO, 2, 0)
                .dyn_gas(gas::gas_sstore)
                .writing(),
        );
        t.set(op::JUMP, Operation::new(ins::op_jump, cost::MID, 1, 0).jumping());
        t.set(
            op::JUMPI,
            Operation::new(ins::op_jumpi, cost::HIGH, 2, 0).jumping(),
        );
        t.set(op::PC, Operation::new(ins::op_pc, cost::BASE, 0, 1));
        t.set(op::MSIZE, Operation::new(ins::op_msize, cost::BASE, 0, 1));
        t.set(op::GAS, Operation::new(ins::op_gas, cost::BASE, 0, 1));
        t.set(
            op::JUMPDEST,
            Operation::new(ins::op_jumpdest, cost::JUMPDEST, 0, 0),
        );

        for byte in op::PUSH1..=op::PUSH32 {
            t.set(byte, Operation::new(ins::op_push, cost::VERYLOW, 0, 1));
        }
        for byte in op::DUP1..=op::DUP16 {
            let n = (byte - op::DUP1) as usize + 1;
            t.set(byte, Operation::new(ins::op_dup, cost::VERYLOW, n, n + 1));
        }
        for byte in op::SWAP1..=op::SWAP16 {
            let n = (byte - op::SWAP1) as usize + 1;
            t.set(byte, Operation::new(ins::op_swap, cost::VERYLOW, n + 1, n + 1));
        }
        for byte in op::LOG0..=op::LOG4 {
            let topics = (byte - op::LOG0) as usize;
            t.set(
                byte,
                Operation::new(ins::op_log, cost::ZERO, topics + 2, 0)
                    .dyn_gas(gas::gas_log)
                    .mem(ins::mem_log)
                    .writing(),
            );
        }

        t.set(
            op::CREATE,
            Operation::new(ins::op_create, cost::CREATE, 3, 1)
                .dyn_gas(gas::gas_create)
                .mem(ins::mem_create)
                .writing()
                .returning(),
        );
        t.set(
            op::CALL,
            Operation::new(ins::op_call, cost::CALL, 7, 1)
                .dyn_gas(gas::gas_call)
                .mem(ins::mem_call)
                .returning(),
        );
        t.set(
            op::CALLCODE,
            Operation::new(ins::op_callcode, cost::CALL, 7, 1)
                .dyn_gas(gas::gas_callcode)
                .mem(ins::mem_call)
                .returning(),
        );
        t.set(
            op::RETURN,
            Operation::new(ins::op_return, cost::ZERO, 2, 0)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_return)
                .halting(),
        );
        t.set(
            op::SELFDESTRUCT,
            Operation::new(ins::op_selfdestruct, cost::ZERO, 1, 0)
                .dyn_gas(gas::gas_selfdestruct)
                .halting()
                .writing(),
        );

        t
    }

    fn patch_homestead(&mut self) {
        self.set(
            op::DELEGATECALL,
            Operation::new(ins::op_delegatecall, cost::CALL, 6, 1)
                .dyn_gas(gas::gas_delegatecall)
                .mem(ins::mem_delegatecall)
                .returning(),
        );
    }

    fn patch_byzantium(&mut self) {
        self.set(
            op::REVERT,
            Operation::new(ins::op_revert, cost::ZERO, 2, 0)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_return)
                .reverting()
                .returning(),
        );
        self.set(
            op::RETURNDATASIZE,
            Operation::new(ins::op_returndatasize, cost::BASE, 0, 1),
        );
        self.set(
            op::RETURNDATACOPY,
            Operation::new(ins::op_returndatacopy, cost::VERYLOW, 3, 0)
                .dyn_gas(gas::gas_copy)
                .mem(ins::mem_copy),
        );
        self.set(
            op::STATICCALL,
            Operation::new(ins::op_staticcall, cost::CALL, 6, 1)
                .dyn_gas(gas::gas_staticcall)
                .mem(ins::mem_delegatecall)
                .returning(),
        );
    }

    fn patch_constantinople(&mut self) {
        self.set(op::SHL, Operation::new(ins::op_shl, cost::VERYLOW, 2, 1));
        self.set(op::SHR, Operation::new(ins::op_shr, cost::VERYLOW, 2, 1));
        self.set(op::SAR, Operation::new(ins::op_sar, cost::VERYLOW, 2, 1));
        self.set(
            op::EXTCODEHASH,
            Operation::new(ins::op_extcodehash, cost::EXTCODEHASH, 1, 1),
        );
        self.set(
            op::CREATE2,
            Operation::new(ins::op_create2, cost::CREATE, 4, 1)
                .dyn_gas(gas::gas_create2)
                .mem(ins::mem_create2)
                .writing()
                .returning(),
        );
    }

    /// State access repricing plus the chain introspection opcodes.
    fn patch_istanbul(&mut self) {
        self.set(op::CHAINID, Operation::new(ins::op_chainid, cost::CHAINID, 0, 1));
        self.set(
            op::SELFBALANCE,
            Operation::new(ins::op_selfbalance, cost::SELFBALANCE, 0, 1),
        );
        self.set(op::BASEFEE, Operation::new(ins::op_basefee, cost::BASE, 0, 1));

        self.reprice(op::SLOAD, cost::SLOAD_REPRICED);
        self.reprice(op::BALANCE, cost::CALL_REPRICED);
        self.reprice(op::EXTCODESIZE, cost::CALL_REPRICED);
        self.reprice(op::EXTCODECOPY, cost::CALL_REPRICED);
        self.reprice(op::EXTCODEHASH, cost::CALL_REPRICED);
        self.reprice(op::CALL, cost::CALL_REPRICED);
        self.reprice(op::CALLCODE, cost::CALL_REPRICED);
        self.reprice(op::DELEGATECALL, cost::CALL_REPRICED);
        self.reprice(op::STATICCALL, cost::CALL_REPRICED);
        self.reprice(op::SELFDESTRUCT, cost::SELFDESTRUCT);
    }

    fn patch_subroutines(&mut self) {
        self.set(
            op::BEGINSUB,
            Operation::new(ins::op_beginsub, cost::BASE, 0, 0),
        );
        self.set(
            op::JUMPSUB,
            Operation::new(ins::op_jumpsub, cost::HIGH, 1, 0).jumping(),
        );
        self.set(
            op::RETURNSUB,
            Operation::new(ins::op_returnsub, cost::LOW, 0, 0).jumping(),
        );
    }

    /// Replaces the subroutine opcodes byte for byte.
    fn patch_transient_storage(&mut self) {
        self.set(op::TLOAD, Operation::new(ins::op_tload, cost::TRANSIENT, 1, 1));
        self.set(
            op::TSTORE,
            Operation::new(ins::op_tstore, cost::TRANSIENT, 2, 0).writing(),
        );
        self.set(
            op::MCOPY,
            Operation::new(ins::op_mcopy, cost::VERYLOW, 3, 0)
                .dyn_gas(gas::gas_mcopy)
                .mem(ins::mem_mcopy),
        );
    }

    fn patch_staking(&mut self) {
        self.set(
            op::PRINTF,
            Operation::new(ins::op_printf, cost::PRINTF, 2, 0)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_return),
        );
        self.set(
            op::STAKE,
            Operation::new(ins::op_stake, cost::STAKE, 2, 1).writing(),
        );
        self.set(
            op::UNSTAKE,
            Operation::new(ins::op_unstake, cost::UNSTAKE, 2, 1).writing(),
        );
        self.set(
            op::GETSTAKE,
            Operation::new(ins::op_getstake, cost::GETSTAKE, 1, 1),
        );
        self.set(
            op::UNSTAKEALL,
            Operation::new(ins::op_unstakeall, cost::UNSTAKEALL, 0, 1).writing(),
        );
        self.set(
            op::STAKENUM,
            Operation::new(ins::op_stakenum, cost::STAKENUM, 0, 1),
        );
        self.set(
            op::AUTH,
            Operation::new(ins::op_auth, cost::AUTH, 3, 1)
                .dyn_gas(gas::gas_memory)
                .mem(ins::mem_auth),
        );
        self.set(
            op::AUTHCALL,
            Operation::new(ins::op_authcall, cost::CALL_REPRICED, 7, 1)
                .dyn_gas(gas::gas_authcall)
                .mem(ins::mem_call)
                .returning(),
        );
    }

    /// Flat multiplier over every constant cost. Applied after all other
    /// patches so it scales their prices too.
    fn patch_rescale(&mut self, factor: u64) {
        for entry in self.ops.iter_mut().flatten() {
            entry.constant_gas = entry.constant_gas.saturating_mul(factor);
        }
    }
}
