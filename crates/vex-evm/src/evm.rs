//! Call and create orchestration
//!
//! [`Evm`] owns the execution context for one transaction: chain rules,
//! block and transaction environment, the jump table for this block and
//! a mutable borrow of the host state. Entering a frame snapshots the
//! state and settling rolls back on failure, so a failed child never
//! damages its parent. Nested frames do not recurse through the Rust
//! call stack: the interpreter suspends when an instruction requests a
//! child, and [`Evm::run_loop`] keeps every live frame on a heap `Vec`,
//! pushing on entry and resuming the parent when the child settles.
//! The chain of frames is bounded by the protocol depth limit alone,
//! never by the size of the process stack.

use crate::config::{BlockContext, ChainConfig, ChainRules, TxContext};
use crate::contract::Contract;
use crate::error::{EvmError, EvmResult, Outcome};
use crate::gas::cost;
use crate::interpreter::{self, Frame, Step};
use crate::jumptable::JumpTable;
use crate::state::{Log, StateAccess};
use crate::word;
use bytes::Bytes;
use primitive_types::U256;
use tracing::debug;
use vex_crypto::{create2_address, create_address, keccak256};
use vex_primitives::{Address, H256};

/// Result of a call entry point.
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Data returned by the frame.
    pub output: Bytes,
    /// Gas left for the caller to reclaim.
    pub gas_left: u64,
    /// Logs emitted by the frame and its children. Empty unless the
    /// frame succeeded.
    pub logs: Vec<Log>,
    /// How the frame finished.
    pub outcome: Outcome,
}

/// Result of a create entry point.
#[derive(Debug, Clone)]
pub struct CreateResult {
    /// Address of the new contract. Only meaningful on success.
    pub address: Address,
    /// Data returned by the init frame. Revert payload on revert.
    pub output: Bytes,
    /// Gas left for the caller to reclaim.
    pub gas_left: u64,
    /// Logs emitted by the init frame. Empty unless it succeeded.
    pub logs: Vec<Log>,
    /// How the init frame finished.
    pub outcome: Outcome,
}

impl CallResult {
    fn halt(error: EvmError, gas_left: u64) -> Self {
        Self {
            output: Bytes::new(),
            gas_left,
            logs: Vec::new(),
            outcome: Outcome::Halt(error),
        }
    }
}

/// Which flavor of message call a frame runs under. The scheme decides
/// whose balance covers the value, whether the value actually moves,
/// whether the target account is materialized, and whether the subtree
/// is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallScheme {
    /// Plain CALL, and AUTHCALL with the authority as caller.
    Call,
    /// CALLCODE: foreign code in the caller's own account.
    CallCode,
    /// DELEGATECALL: foreign code with the parent's caller and value.
    DelegateCall,
    /// STATICCALL: plain call with zero value, writes forbidden below.
    StaticCall,
}

/// A child frame staged by a CALL or CREATE family instruction. The
/// instruction body fills this in and returns; the orchestrator picks
/// it up and enters the child without growing the Rust call stack.
pub(crate) enum FrameRequest {
    /// One of the message-call instructions.
    Call {
        scheme: CallScheme,
        caller: Address,
        /// Account the child executes as.
        address: Address,
        /// Account whose code the child runs.
        code_addr: Address,
        input: Bytes,
        gas: u64,
        value: U256,
        /// Where the parent wants the returned bytes copied.
        out_offset: usize,
        out_len: usize,
    },
    /// CREATE, or CREATE2 when `salt` is set.
    Create {
        value: U256,
        init_code: Bytes,
        gas: u64,
        salt: Option<H256>,
    },
}

/// A live frame plus everything needed to settle it and hand its result
/// to the frame below it on the stack.
struct FrameCtx {
    frame: Frame,
    kind: FrameKind,
    snapshot: usize,
    log_mark: usize,
    read_only_prev: bool,
}

enum FrameKind {
    Call { out_offset: usize, out_len: usize },
    Create { address: Address },
}

enum Dispatch {
    /// The child frame was entered and now runs on top of the stack.
    Pushed(FrameCtx),
    /// The request settled without running code; the parent already has
    /// the result applied.
    Handled,
}

/// One transaction's execution engine.
pub struct Evm<'a> {
    /// Activation schedule this engine was built from.
    pub config: ChainConfig,
    /// Rules in force for the current block.
    pub rules: ChainRules,
    /// Block environment.
    pub block: BlockContext,
    /// Transaction environment.
    pub tx: TxContext,
    /// Host state.
    pub state: &'a mut dyn StateAccess,
    pub(crate) table: JumpTable,
    pub(crate) depth: usize,
    pub(crate) read_only: bool,
    /// Gas forwarded to the next child call, fixed by the dynamic gas
    /// pass of the CALL family before the instruction body runs.
    pub(crate) call_gas_tmp: u64,
    /// Child frame staged by the instruction the interpreter just ran.
    pub(crate) pending_request: Option<FrameRequest>,
}

impl<'a> Evm<'a> {
    /// Build an engine for one transaction. The jump table is derived
    /// from `config` at the block's height.
    pub fn new(
        config: ChainConfig,
        block: BlockContext,
        tx: TxContext,
        state: &'a mut dyn StateAccess,
    ) -> Self {
        let rules = config.rules(block.number);
        let table = JumpTable::for_rules(&rules);
        Self {
            config,
            rules,
            block,
            tx,
            state,
            table,
            depth: 0,
            read_only: false,
            call_gas_tmp: 0,
            pending_request: None,
        }
    }

    /// Run the code at `to` in its own context, transferring `value`
    /// from `caller` first.
    pub fn call(
        &mut self,
        caller: Address,
        to: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> CallResult {
        self.drive_call(CallScheme::Call, caller, to, to, input, gas, value)
    }

    /// Run the code at `to` in the caller's own context. Value stays
    /// with the caller but must still be covered.
    pub fn call_code(
        &mut self,
        caller: Address,
        to: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> CallResult {
        self.drive_call(CallScheme::CallCode, caller, caller, to, input, gas, value)
    }

    /// Run the code at `to` with the parent's caller, address and value,
    /// as DELEGATECALL requires.
    pub fn delegate_call(
        &mut self,
        parent_caller: Address,
        parent_address: Address,
        to: Address,
        input: Bytes,
        gas: u64,
        parent_value: U256,
    ) -> CallResult {
        self.drive_call(
            CallScheme::DelegateCall,
            parent_caller,
            parent_address,
            to,
            input,
            gas,
            parent_value,
        )
    }

    /// Like [`Evm::call`] with zero value, with every state mutation in
    /// the subtree forbidden.
    pub fn static_call(
        &mut self,
        caller: Address,
        to: Address,
        input: Bytes,
        gas: u64,
    ) -> CallResult {
        self.drive_call(CallScheme::StaticCall, caller, to, to, input, gas, U256::zero())
    }

    /// Deploy a contract at the address derived from the caller and its
    /// current nonce.
    pub fn create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
    ) -> CreateResult {
        let address = create_address(&caller, self.state.nonce(&caller));
        self.drive_create(caller, init_code, gas, value, address)
    }

    /// Deploy a contract at the salted address derived from the caller,
    /// the salt and the init code hash.
    pub fn create2(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
        salt: H256,
    ) -> CreateResult {
        let code_hash = keccak256(&init_code);
        let address = create2_address(&caller, &salt, &code_hash);
        self.drive_create(caller, init_code, gas, value, address)
    }

    #[allow(clippy::too_many_arguments)]
    fn drive_call(
        &mut self,
        scheme: CallScheme,
        caller: Address,
        address: Address,
        code_addr: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> CallResult {
        match self.enter_call(scheme, caller, address, code_addr, input, gas, value, 0, 0) {
            Err(done) => done,
            Ok(root) => {
                let (result, root) = self.run_loop(root);
                self.leave(&root);
                let gas_left = root.frame.contract.gas;
                self.settle(result, gas_left, root.snapshot, root.log_mark)
            }
        }
    }

    fn drive_create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
        address: Address,
    ) -> CreateResult {
        match self.enter_create(caller, init_code, gas, value, address) {
            Err(done) => done,
            Ok(root) => {
                let (result, root) = self.run_loop(root);
                self.leave(&root);
                let gas_left = root.frame.contract.gas;
                self.settle_create(address, result, gas_left, root.snapshot, root.log_mark)
            }
        }
    }

    /// Run `root` and every frame it spawns to completion. Live frames
    /// sit on a heap `Vec`; the depth limit is the only bound on how
    /// many stack up. Returns the root's raw result together with its
    /// context, still unsettled.
    fn run_loop(&mut self, root: FrameCtx) -> (EvmResult<Bytes>, FrameCtx) {
        let mut current = root;
        let mut parents: Vec<FrameCtx> = Vec::new();
        loop {
            let mut result = match interpreter::run(self, &mut current.frame) {
                Ok(Step::Call(request)) => {
                    match self.enter_request(request, &mut current.frame) {
                        Ok(Dispatch::Pushed(child)) => {
                            parents.push(std::mem::replace(&mut current, child));
                            continue;
                        }
                        Ok(Dispatch::Handled) => continue,
                        Err(error) => Err(error),
                    }
                }
                Ok(Step::Done(output)) => Ok(output),
                Err(error) => Err(error),
            };

            // the frame on top is finished; settle it and feed the
            // result to the one below, unwinding further if applying
            // the result faults that frame as well
            loop {
                let Some(parent) = parents.pop() else {
                    return (result, current);
                };
                let finished = std::mem::replace(&mut current, parent);
                self.leave(&finished);
                let gas_left = finished.frame.contract.gas;
                let applied = match finished.kind {
                    FrameKind::Call { out_offset, out_len } => {
                        let settled =
                            self.settle(result, gas_left, finished.snapshot, finished.log_mark);
                        finish_call(&mut current.frame, settled, out_offset, out_len)
                    }
                    FrameKind::Create { address } => {
                        let settled = self.settle_create(
                            address,
                            result,
                            gas_left,
                            finished.snapshot,
                            finished.log_mark,
                        );
                        finish_create(&mut current.frame, settled)
                    }
                };
                match applied {
                    Ok(()) => break,
                    Err(error) => result = Err(error),
                }
            }
        }
    }

    /// Turn a staged [`FrameRequest`] into a live child frame, or apply
    /// its result to `parent` right away when no code needs to run.
    fn enter_request(
        &mut self,
        request: FrameRequest,
        parent: &mut Frame,
    ) -> EvmResult<Dispatch> {
        match request {
            FrameRequest::Call {
                scheme,
                caller,
                address,
                code_addr,
                input,
                gas,
                value,
                out_offset,
                out_len,
            } => match self.enter_call(
                scheme, caller, address, code_addr, input, gas, value, out_offset, out_len,
            ) {
                Ok(ctx) => Ok(Dispatch::Pushed(ctx)),
                Err(done) => {
                    finish_call(parent, done, out_offset, out_len)?;
                    Ok(Dispatch::Handled)
                }
            },
            FrameRequest::Create {
                value,
                init_code,
                gas,
                salt,
            } => {
                let caller = parent.contract.address;
                let address = match &salt {
                    Some(salt) => create2_address(&caller, salt, &keccak256(&init_code)),
                    None => create_address(&caller, self.state.nonce(&caller)),
                };
                match self.enter_create(caller, init_code, gas, value, address) {
                    Ok(ctx) => Ok(Dispatch::Pushed(ctx)),
                    Err(done) => {
                        finish_create(parent, done)?;
                        Ok(Dispatch::Handled)
                    }
                }
            }
        }
    }

    /// Open a message-call frame. `Err` carries a result that settled
    /// without executing code: depth or balance failures that keep the
    /// forwarded gas, and calls to accounts with no code.
    #[allow(clippy::too_many_arguments)]
    fn enter_call(
        &mut self,
        scheme: CallScheme,
        caller: Address,
        address: Address,
        code_addr: Address,
        input: Bytes,
        gas: u64,
        value: U256,
        out_offset: usize,
        out_len: usize,
    ) -> Result<FrameCtx, CallResult> {
        if self.depth >= cost::MAX_CALL_DEPTH {
            return Err(CallResult::halt(EvmError::DepthExceeded, gas));
        }
        let draws_value =
            !value.is_zero() && matches!(scheme, CallScheme::Call | CallScheme::CallCode);
        if draws_value && self.state.balance(&caller) < value {
            return Err(CallResult::halt(EvmError::InsufficientBalance, gas));
        }

        let snapshot = self.state.snapshot();
        self.state.add_address_to_access_list(&code_addr);
        if matches!(scheme, CallScheme::Call | CallScheme::StaticCall)
            && !self.state.exists(&address)
        {
            self.state.create_account(&address);
        }
        if !value.is_zero() && scheme == CallScheme::Call {
            self.state.sub_balance(&caller, value);
            self.state.add_balance(&address, value);
        }

        let code = self.state.code(&code_addr);
        if code.is_empty() {
            return Err(CallResult {
                output: Bytes::new(),
                gas_left: gas,
                logs: Vec::new(),
                outcome: Outcome::Success,
            });
        }

        let log_mark = self.state.logs().len();
        let code_hash = self.state.code_hash(&code_addr);
        let contract = Contract::new(caller, address, code, code_hash, input, value, gas);
        debug!(target: "vex_evm", depth = self.depth, to = %code_addr, gas, "call");
        let read_only_prev = self.read_only;
        if scheme == CallScheme::StaticCall {
            self.read_only = true;
        }
        self.depth += 1;
        Ok(FrameCtx {
            frame: Frame::new(contract),
            kind: FrameKind::Call {
                out_offset,
                out_len,
            },
            snapshot,
            log_mark,
            read_only_prev,
        })
    }

    /// Open an init frame for a contract deployment at `address`.
    fn enter_create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
        address: Address,
    ) -> Result<FrameCtx, CreateResult> {
        let halt = |error: EvmError, gas_left: u64| CreateResult {
            address: Address::ZERO,
            output: Bytes::new(),
            gas_left,
            logs: Vec::new(),
            outcome: Outcome::Halt(error),
        };

        if self.depth >= cost::MAX_CALL_DEPTH {
            return Err(halt(EvmError::DepthExceeded, gas));
        }
        if !value.is_zero() && self.state.balance(&caller) < value {
            return Err(halt(EvmError::InsufficientBalance, gas));
        }

        // the caller's nonce is spent even if the create fails below
        let nonce = self.state.nonce(&caller);
        self.state.set_nonce(&caller, nonce + 1);

        if self.state.nonce(&address) != 0 || !self.state.code(&address).is_empty() {
            return Err(halt(EvmError::ContractAddressCollision, 0));
        }

        let snapshot = self.state.snapshot();
        self.state.add_address_to_access_list(&address);
        self.state.create_account(&address);
        self.state.set_nonce(&address, 1);
        if !value.is_zero() {
            self.state.sub_balance(&caller, value);
            self.state.add_balance(&address, value);
        }

        let log_mark = self.state.logs().len();
        let code_hash = keccak256(&init_code);
        let contract = Contract::new(
            caller,
            address,
            init_code,
            code_hash,
            Bytes::new(),
            value,
            gas,
        );
        debug!(target: "vex_evm", depth = self.depth, %address, gas, "create");
        let read_only_prev = self.read_only;
        self.depth += 1;
        Ok(FrameCtx {
            frame: Frame::new(contract),
            kind: FrameKind::Create { address },
            snapshot,
            log_mark,
            read_only_prev,
        })
    }

    fn leave(&mut self, ctx: &FrameCtx) {
        self.depth -= 1;
        self.read_only = ctx.read_only_prev;
    }

    /// Charge the code deposit and store the runtime code, then settle
    /// like a call. The reported address is zero unless the deployment
    /// succeeded end to end.
    fn settle_create(
        &mut self,
        address: Address,
        result: EvmResult<Bytes>,
        mut gas_left: u64,
        snapshot: usize,
        log_mark: usize,
    ) -> CreateResult {
        let deposit_result = match result {
            Ok(output) => {
                if output.len() > cost::MAX_CODE_SIZE {
                    Err(EvmError::MaxCodeSizeExceeded)
                } else {
                    let deposit = output.len() as u64 * cost::CREATE_DATA;
                    if gas_left < deposit {
                        Err(EvmError::CodeStoreOutOfGas)
                    } else {
                        gas_left -= deposit;
                        self.state.set_code(&address, output.clone());
                        Ok(output)
                    }
                }
            }
            err => err,
        };

        let settled = self.settle(deposit_result, gas_left, snapshot, log_mark);
        CreateResult {
            address: if settled.outcome.is_success() {
                address
            } else {
                Address::ZERO
            },
            output: settled.output,
            gas_left: settled.gas_left,
            logs: settled.logs,
            outcome: settled.outcome,
        }
    }

    /// Apply the frame outcome: keep state and collect logs on success,
    /// roll back on revert keeping leftover gas, roll back and burn the
    /// leftover on any other error.
    fn settle(
        &mut self,
        result: EvmResult<Bytes>,
        gas_left: u64,
        snapshot: usize,
        log_mark: usize,
    ) -> CallResult {
        match result {
            Ok(output) => CallResult {
                output,
                gas_left,
                logs: self.state.logs()[log_mark..].to_vec(),
                outcome: Outcome::Success,
            },
            Err(EvmError::Revert(data)) => {
                self.state.revert_to(snapshot);
                CallResult {
                    output: Bytes::from(data),
                    gas_left,
                    logs: Vec::new(),
                    outcome: Outcome::Revert,
                }
            }
            Err(error) => {
                debug!(target: "vex_evm", depth = self.depth, %error, "frame halted");
                self.state.revert_to(snapshot);
                CallResult::halt(error, 0)
            }
        }
    }
}

/// Hand a settled child call back to `frame`: refund leftover gas, copy
/// the output into the requested memory window, expose it as return
/// data and push the status flag.
fn finish_call(
    frame: &mut Frame,
    result: CallResult,
    out_offset: usize,
    out_len: usize,
) -> EvmResult<()> {
    frame.contract.refund_gas(result.gas_left);
    match result.outcome {
        Outcome::Success | Outcome::Revert => {
            let n = out_len.min(result.output.len());
            if n > 0 {
                frame.memory.store_slice(out_offset, &result.output[..n]);
            }
            frame.return_data = result.output;
        }
        Outcome::Halt(_) => {
            frame.return_data = Bytes::new();
        }
    }
    frame
        .stack
        .push(word::from_bool(result.outcome.is_success()))?;
    Ok(())
}

/// Hand a settled deployment back to `frame`: refund leftover gas and
/// push the new address, or zero with the revert payload as return data.
fn finish_create(frame: &mut Frame, result: CreateResult) -> EvmResult<()> {
    frame.contract.refund_gas(result.gas_left);
    match result.outcome {
        Outcome::Success => {
            frame.return_data = Bytes::new();
            frame.stack.push(result.address.into_word())?;
        }
        Outcome::Revert => {
            frame.return_data = result.output;
            frame.stack.push(U256::zero())?;
        }
        Outcome::Halt(_) => {
            frame.return_data = Bytes::new();
            frame.stack.push(U256::zero())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode as op;
    use crate::state::MemoryState;

    fn caller() -> Address {
        Address::from_bytes([0x11; 20])
    }

    fn target() -> Address {
        Address::from_bytes([0x22; 20])
    }

    fn exec_with(
        state: &mut MemoryState,
        config: ChainConfig,
        code: Vec<u8>,
        gas: u64,
    ) -> CallResult {
        state.set_code(&target(), Bytes::from(code));
        let mut evm = Evm::new(
            config,
            BlockContext::default(),
            TxContext::default(),
            state,
        );
        evm.call(caller(), target(), Bytes::new(), gas, U256::zero())
    }

    fn exec(code: Vec<u8>, gas: u64) -> (CallResult, MemoryState) {
        let mut state = MemoryState::new();
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, gas);
        (result, state)
    }

    /// PUSH the return of a single 32-byte word already in stack top:
    /// MSTORE at 0 then RETURN 32 bytes.
    fn return_top() -> Vec<u8> {
        vec![
            op::PUSH1, 0, op::MSTORE, op::PUSH1, 32, op::PUSH1, 0, op::RETURN,
        ]
    }

    fn output_word(result: &CallResult) -> U256 {
        assert_eq!(result.output.len(), 32, "expected one word of output");
        U256::from_big_endian(&result.output)
    }

    #[test]
    fn add_and_return() {
        let mut code = vec![op::PUSH1, 1, op::PUSH1, 2, op::ADD];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::from(3u8));
        assert!(result.gas_left < 100_000);
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let mut code = vec![op::PUSH1, 0, op::PUSH1, 7, op::DIV];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::zero());
    }

    #[test]
    fn implicit_stop_past_code_end() {
        let (result, _) = exec(vec![op::PUSH1, 1], 100_000);
        assert!(result.outcome.is_success());
        assert!(result.output.is_empty());
    }

    #[test]
    fn invalid_opcode_burns_gas() {
        let (result, _) = exec(vec![op::INVALID], 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::InvalidOpcode(0xFE)));
        assert_eq!(result.gas_left, 0);
    }

    #[test]
    fn unassigned_byte_is_invalid() {
        let (result, _) = exec(vec![0xF8], 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::InvalidOpcode(0xF8)));
    }

    #[test]
    fn out_of_gas_halts() {
        // an infinite loop: JUMPDEST PUSH1 0 JUMP
        let code = vec![op::JUMPDEST, op::PUSH1, 0, op::JUMP];
        let (result, _) = exec(code, 1_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::OutOfGas));
        assert_eq!(result.gas_left, 0);
    }

    #[test]
    fn stack_underflow_detected_before_execution() {
        let (result, _) = exec(vec![op::ADD], 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::StackUnderflow));
    }

    #[test]
    fn jump_to_non_jumpdest_fails() {
        let (result, _) = exec(vec![op::PUSH1, 3, op::JUMP, op::STOP], 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::InvalidJump(3)));
    }

    #[test]
    fn jumpdest_inside_push_data_rejected() {
        // position 4 holds a JUMPDEST byte, but it is PUSH2 immediate data
        let code = vec![op::PUSH1, 4, op::JUMP, op::PUSH1 + 1, op::JUMPDEST, 0x00];
        let (result, _) = exec(code, 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::InvalidJump(4)));
    }

    #[test]
    fn jumpi_not_taken_falls_through() {
        // JUMPI with zero condition continues to the next instruction
        let mut code = vec![
            op::PUSH1, 0, // condition
            op::PUSH1, 99, // bogus destination, never inspected
            op::JUMPI,
            op::PUSH1, 5,
        ];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::from(5u8));
    }

    #[test]
    fn jumpi_taken() {
        let mut code = vec![
            op::PUSH1, 1, // condition
            op::PUSH1, 7, // destination
            op::JUMPI,
            op::INVALID, // skipped
            op::INVALID,
            op::JUMPDEST,
            op::PUSH1, 9,
        ];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::from(9u8));
    }

    #[test]
    fn push_truncated_at_code_end_reads_zeros() {
        // PUSH32 with only two immediate bytes present
        let code = vec![op::PUSH32, 0xAA, 0xBB];
        let (result, _) = exec(code, 100_000);
        // implicit stop afterwards; nothing to assert on output, but the
        // frame must succeed rather than over-read
        assert!(result.outcome.is_success());
    }

    #[test]
    fn revert_preserves_gas_and_payload() {
        // store 0xAB, revert with that byte
        let code = vec![
            op::PUSH1, 0xAB, op::PUSH1, 0, op::MSTORE8, op::PUSH1, 1, op::PUSH1, 0,
            op::REVERT,
        ];
        let mut state = MemoryState::new();
        state.set_balance(&target(), U256::from(55u64));
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 100_000);
        assert_eq!(result.outcome, Outcome::Revert);
        assert_eq!(result.output.as_ref(), &[0xAB]);
        assert!(result.gas_left > 0);
        assert!(result.logs.is_empty());
    }

    #[test]
    fn sstore_sload_roundtrip() {
        // SSTORE slot 1 = 42 then load it back and return
        let mut code = vec![
            op::PUSH1, 42, op::PUSH1, 1, op::SSTORE, op::PUSH1, 1, op::SLOAD,
        ];
        code.extend(return_top());
        let (result, state) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::from(42u8));
        let key = H256::from_word(U256::one());
        assert_eq!(
            state.storage(&target(), &key).into_word(),
            U256::from(42u8)
        );
    }

    #[test]
    fn sstore_clear_accumulates_refund() {
        let code = vec![
            op::PUSH1, 5, op::PUSH1, 0, op::SSTORE, // set
            op::PUSH1, 0, op::PUSH1, 0, op::SSTORE, // clear
        ];
        let (result, state) = exec(code, 100_000);
        assert!(result.outcome.is_success());
        assert_eq!(state.refund(), cost::SSTORE_REFUND);
    }

    #[test]
    fn exp_charges_per_exponent_byte() {
        let mut small = vec![op::PUSH1, 1, op::PUSH1, 2, op::EXP];
        small.extend(return_top());
        let mut large = vec![op::PUSH1 + 1, 1, 1, op::PUSH1, 2, op::EXP];
        large.extend(return_top());
        let (a, _) = exec(small, 100_000);
        let (b, _) = exec(large, 100_000);
        assert!(a.outcome.is_success() && b.outcome.is_success());
        // one extra exponent byte at the repriced rate
        assert_eq!(a.gas_left - b.gas_left, cost::EXP_BYTE_REPRICED);
    }

    #[test]
    fn logs_collected_on_success() {
        // LOG1 over one memory byte with topic 7
        let code = vec![
            op::PUSH1, 0xCD, op::PUSH1, 0, op::MSTORE8, // memory[0] = 0xCD
            op::PUSH1, 7, // topic
            op::PUSH1, 1, op::PUSH1, 0, // len, offset
            op::LOG0 + 1,
        ];
        let (result, state) = exec(code, 100_000);
        assert!(result.outcome.is_success());
        assert_eq!(result.logs.len(), 1);
        let log = &result.logs[0];
        assert_eq!(log.address, target());
        assert_eq!(log.topics, vec![H256::from_word(U256::from(7u8))]);
        assert_eq!(log.data, vec![0xCD]);
        assert_eq!(state.logs().len(), 1);
    }

    #[test]
    fn transient_storage_roundtrip() {
        let mut code = vec![
            op::PUSH1, 9, op::PUSH1, 3, op::TSTORE, op::PUSH1, 3, op::TLOAD,
        ];
        code.extend(return_top());
        let (result, state) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::from(9u8));
        let key = H256::from_word(U256::from(3u8));
        assert_eq!(
            state.transient_storage(&target(), &key).into_word(),
            U256::from(9u8)
        );
    }

    #[test]
    fn mcopy_moves_memory() {
        let mut code = vec![
            op::PUSH1, 0x5A, op::PUSH1, 0, op::MSTORE8, // memory[0] = 0x5A
            op::PUSH1, 1, op::PUSH1, 0, op::PUSH1, 31, op::MCOPY, // memory[31] = 0x5A
            op::PUSH1, 0, op::MLOAD,
        ];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        let word = output_word(&result);
        assert_eq!(word.low_u64() & 0xFF, 0x5A);
    }

    fn push_addr(code: &mut Vec<u8>, addr: Address) {
        code.push(op::PUSH1 + 19);
        code.extend_from_slice(addr.as_bytes());
    }

    /// CALL `addr` with no value or data, then return the success flag.
    fn call_and_return_flag(addr: Address) -> Vec<u8> {
        let mut code = vec![
            op::PUSH1, 0, // out len
            op::PUSH1, 0, // out offset
            op::PUSH1, 0, // in len
            op::PUSH1, 0, // in offset
            op::PUSH1, 0, // value
        ];
        push_addr(&mut code, addr);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF]); // gas
        code.push(op::CALL);
        code.extend(return_top());
        code
    }

    #[test]
    fn failed_child_contained_in_parent() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        state.set_code(&child, Bytes::from(vec![op::INVALID]));
        let result = exec_with(
            &mut state,
            ChainConfig::mainnet(),
            call_and_return_flag(child),
            200_000,
        );
        // parent succeeds, sees 0, and keeps its unforwarded gas
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::zero());
        assert!(result.gas_left > 0);
    }

    #[test]
    fn successful_child_pushes_one() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        state.set_code(&child, Bytes::from(vec![op::STOP]));
        let result = exec_with(
            &mut state,
            ChainConfig::mainnet(),
            call_and_return_flag(child),
            200_000,
        );
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::one());
    }

    #[test]
    fn reverted_child_rolls_back_but_keeps_gas_for_parent() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        // child: SSTORE then REVERT empty
        state.set_code(
            &child,
            Bytes::from(vec![
                op::PUSH1, 1, op::PUSH1, 0, op::SSTORE, op::PUSH1, 0, op::PUSH1, 0,
                op::REVERT,
            ]),
        );
        let result = exec_with(
            &mut state,
            ChainConfig::mainnet(),
            call_and_return_flag(child),
            200_000,
        );
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::zero());
        // child's write was rolled back
        assert!(state.storage(&child, &H256::ZERO).is_zero());
    }

    #[test]
    fn return_data_visible_after_revert() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        // child reverts with one byte 0xEE
        state.set_code(
            &child,
            Bytes::from(vec![
                op::PUSH1, 0xEE, op::PUSH1, 0, op::MSTORE8, op::PUSH1, 1, op::PUSH1, 0,
                op::REVERT,
            ]),
        );
        // parent calls child then returns RETURNDATASIZE
        let mut code = vec![
            op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0,
        ];
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::CALL, op::POP, op::RETURNDATASIZE]);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::one());
    }

    #[test]
    fn returndatacopy_out_of_bounds_halts() {
        // no prior call, return data is empty; copying one byte must fail
        let code = vec![op::PUSH1, 1, op::PUSH1, 0, op::PUSH1, 0, op::RETURNDATACOPY];
        let (result, _) = exec(code, 100_000);
        assert_eq!(
            result.outcome,
            Outcome::Halt(EvmError::ReturnDataOutOfBounds)
        );
    }

    #[test]
    fn call_transfers_value() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        state.set_balance(&target(), U256::from(1_000u64));
        // CALL child with value 250, no code at child
        let mut code = vec![
            op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 250,
        ];
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::CALL]);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::one());
        assert_eq!(state.balance(&child), U256::from(250u64));
        assert_eq!(state.balance(&target()), U256::from(750u64));
    }

    #[test]
    fn insufficient_balance_fails_the_call_not_the_frame() {
        let child = Address::from_bytes([0x33; 20]);
        // target has no balance but tries to send 250
        let mut code = vec![
            op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 250,
        ];
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::CALL]);
        code.extend(return_top());
        let (result, state) = exec(code, 200_000);
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::zero());
        assert_eq!(state.balance(&child), U256::zero());
    }

    #[test]
    fn static_call_blocks_writes() {
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        state.set_code(
            &child,
            Bytes::from(vec![op::PUSH1, 1, op::PUSH1, 0, op::SSTORE]),
        );
        // STATICCALL child, return flag
        let mut code = vec![op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0];
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::STATICCALL]);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), U256::zero());
        assert!(state.storage(&child, &H256::ZERO).is_zero());
    }

    #[test]
    fn delegatecall_runs_in_caller_context() {
        let lib = Address::from_bytes([0x44; 20]);
        let mut state = MemoryState::new();
        // library writes 7 into slot 0 of whoever runs it
        state.set_code(
            &lib,
            Bytes::from(vec![op::PUSH1, 7, op::PUSH1, 0, op::SSTORE]),
        );
        let mut code = vec![op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0];
        push_addr(&mut code, lib);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::DELEGATECALL]);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::one());
        // slot written on the caller, not the library
        assert_eq!(
            state.storage(&target(), &H256::ZERO).into_word(),
            U256::from(7u8)
        );
        assert!(state.storage(&lib, &H256::ZERO).is_zero());
    }

    #[test]
    fn depth_limit_fails_before_execution() {
        let mut state = MemoryState::new();
        state.set_code(&target(), Bytes::from(vec![op::STOP]));
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        evm.depth = cost::MAX_CALL_DEPTH;
        let result = evm.call(caller(), target(), Bytes::new(), 50_000, U256::zero());
        assert_eq!(result.outcome, Outcome::Halt(EvmError::DepthExceeded));
        // the caller keeps its gas, nothing ran
        assert_eq!(result.gas_left, 50_000);
    }

    #[test]
    fn create_deploys_runtime_code() {
        // init code: return 3 bytes of runtime [0x60, 0x01, 0x50]
        // (PUSH1 1 POP)
        let init = vec![
            op::PUSH1 + 2, 0x60, 0x01, 0x50, // PUSH3 runtime
            op::PUSH1, 0, op::MSTORE, // left-padded at offset 0
            op::PUSH1, 3, op::PUSH1, 29, op::RETURN, // last 3 bytes
        ];
        let mut state = MemoryState::new();
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        let result = evm.create(caller(), Bytes::from(init), 200_000, U256::zero());
        assert!(result.outcome.is_success());
        assert_eq!(result.address, create_address(&caller(), 0));
        assert_eq!(
            state.code(&result.address).as_ref(),
            &[0x60, 0x01, 0x50]
        );
        assert_eq!(state.nonce(&result.address), 1);
        assert_eq!(state.nonce(&caller()), 1);
    }

    #[test]
    fn create2_address_collision() {
        let init = Bytes::from(vec![op::STOP]);
        let salt = H256::ZERO;
        let mut state = MemoryState::new();
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        let first = evm.create2(caller(), init.clone(), 200_000, U256::zero(), salt);
        assert!(first.outcome.is_success());
        let second = evm.create2(caller(), init, 200_000, U256::zero(), salt);
        assert_eq!(
            second.outcome,
            Outcome::Halt(EvmError::ContractAddressCollision)
        );
        assert_eq!(second.gas_left, 0);
    }

    #[test]
    fn oversized_deployment_rejected() {
        // init returns 24577 zero bytes
        let init = vec![
            op::PUSH1 + 1, 0x60, 0x01, // PUSH2 24577
            op::PUSH1, 0, op::RETURN,
        ];
        let mut state = MemoryState::new();
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        let result = evm.create(caller(), Bytes::from(init), 500_000, U256::zero());
        assert_eq!(result.outcome, Outcome::Halt(EvmError::MaxCodeSizeExceeded));
    }

    #[test]
    fn code_deposit_out_of_gas() {
        // init returns 100 bytes; deposit costs 20000 which the frame
        // cannot cover
        let init = vec![op::PUSH1, 100, op::PUSH1, 0, op::RETURN];
        let mut state = MemoryState::new();
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        let result = evm.create(caller(), Bytes::from(init), 5_000, U256::zero());
        assert_eq!(result.outcome, Outcome::Halt(EvmError::CodeStoreOutOfGas));
    }

    #[test]
    fn selfdestruct_moves_balance() {
        let heir = Address::from_bytes([0x55; 20]);
        let mut state = MemoryState::new();
        state.set_balance(&target(), U256::from(900u64));
        let mut code = Vec::new();
        push_addr(&mut code, heir);
        code.push(op::SELFDESTRUCT);
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 100_000);
        assert!(result.outcome.is_success());
        assert_eq!(state.balance(&heir), U256::from(900u64));
        assert_eq!(state.balance(&target()), U256::zero());
        assert!(state.has_suicided(&target()));
        assert_eq!(state.refund(), cost::SELFDESTRUCT_REFUND);
    }

    #[test]
    fn stake_and_getstake() {
        let mut state = MemoryState::new();
        state.set_balance(&target(), U256::from(500u64));
        // stake 200 for ourselves, then read it back
        let mut code = vec![op::PUSH1, 200];
        push_addr(&mut code, target());
        code.push(op::STAKE);
        code.push(op::POP);
        push_addr(&mut code, target());
        code.push(op::GETSTAKE);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::from(200u64));
        assert_eq!(state.balance(&target()), U256::from(300u64));
        assert_eq!(state.stake_of(&target()), U256::from(200u64));
        assert_eq!(state.stake_count(), 1);
    }

    #[test]
    fn stake_beyond_balance_pushes_zero() {
        let mut state = MemoryState::new();
        state.set_balance(&target(), U256::from(10u64));
        let mut code = vec![op::PUSH1, 200];
        push_addr(&mut code, target());
        code.push(op::STAKE);
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::zero());
        assert_eq!(state.balance(&target()), U256::from(10u64));
        assert_eq!(state.stake_count(), 0);
    }

    #[test]
    fn unstakeall_returns_everything() {
        let mut state = MemoryState::new();
        state.add_stake(&target(), U256::from(777u64));
        let mut code = vec![op::UNSTAKEALL];
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::from(777u64));
        assert_eq!(state.balance(&target()), U256::from(777u64));
        assert_eq!(state.stake_count(), 0);
    }

    #[test]
    fn stakenum_counts_stakers() {
        let mut state = MemoryState::new();
        state.add_stake(&Address::from_bytes([1; 20]), U256::one());
        state.add_stake(&Address::from_bytes([2; 20]), U256::one());
        let mut code = vec![op::STAKENUM];
        code.extend(return_top());
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 200_000);
        assert_eq!(output_word(&result), U256::from(2u8));
    }

    #[test]
    fn printf_is_observable_and_harmless() {
        // write "hi" to memory and printf it
        let code = vec![
            op::PUSH1, b'h', op::PUSH1, 0, op::MSTORE8,
            op::PUSH1, b'i', op::PUSH1, 1, op::MSTORE8,
            op::PUSH1, 2, op::PUSH1, 0, op::PRINTF,
        ];
        let (result, _) = exec(code, 100_000);
        assert!(result.outcome.is_success());
    }

    #[test]
    fn auth_without_approval_pushes_zero() {
        let authority = Address::from_bytes([0x66; 20]);
        let mut code = vec![op::PUSH1, 0, op::PUSH1, 0];
        push_addr(&mut code, authority);
        code.push(op::AUTH);
        code.extend(return_top());
        let (result, _) = exec(code, 200_000);
        assert_eq!(output_word(&result), U256::zero());
    }

    #[test]
    fn authcall_requires_prior_auth() {
        let child = Address::from_bytes([0x33; 20]);
        let mut code = vec![
            op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0,
        ];
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::AUTHCALL]);
        let (result, _) = exec(code, 200_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::AuthRequired));
    }

    #[test]
    fn authcall_presents_authority_as_caller() {
        let authority = Address::from_bytes([0x66; 20]);
        let child = Address::from_bytes([0x33; 20]);
        let mut state = MemoryState::new();
        state.approve_authority(target(), authority);
        // child returns CALLER
        let mut child_code = vec![op::CALLER];
        child_code.extend(return_top());
        state.set_code(&child, Bytes::from(child_code));

        // AUTH(authority, empty commit), POP flag, AUTHCALL child with
        // 32-byte output area, then return that word
        let mut code = vec![op::PUSH1, 0, op::PUSH1, 0];
        push_addr(&mut code, authority);
        code.extend([op::AUTH, op::POP]);
        code.extend([
            op::PUSH1, 32, // out len
            op::PUSH1, 0, // out offset
            op::PUSH1, 0, op::PUSH1, 0, op::PUSH1, 0, // in len, in off, value
        ]);
        push_addr(&mut code, child);
        code.extend([op::PUSH1 + 1, 0xFF, 0xFF, op::AUTHCALL, op::POP]);
        code.extend([op::PUSH1, 32, op::PUSH1, 0, op::RETURN]);
        let result = exec_with(&mut state, ChainConfig::mainnet(), code, 300_000);
        assert!(result.outcome.is_success());
        assert_eq!(output_word(&result), authority.into_word());
    }

    #[test]
    fn subroutine_roundtrip() {
        let mut config = ChainConfig::mainnet();
        config.transient_height = None; // keep the subroutine opcodes live
        let code = vec![
            op::PUSH1, 4, op::JUMPSUB, op::STOP, op::BEGINSUB, op::RETURNSUB,
        ];
        let mut state = MemoryState::new();
        let result = exec_with(&mut state, config, code, 100_000);
        assert!(result.outcome.is_success());
    }

    #[test]
    fn beginsub_walked_into_aborts() {
        let mut config = ChainConfig::mainnet();
        config.transient_height = None;
        let mut state = MemoryState::new();
        let result = exec_with(&mut state, config, vec![op::BEGINSUB], 100_000);
        assert_eq!(
            result.outcome,
            Outcome::Halt(EvmError::InvalidSubroutineEntry)
        );
    }

    #[test]
    fn returnsub_on_empty_stack_aborts() {
        let mut config = ChainConfig::mainnet();
        config.transient_height = None;
        let mut state = MemoryState::new();
        let result = exec_with(&mut state, config, vec![op::RETURNSUB], 100_000);
        assert_eq!(result.outcome, Outcome::Halt(EvmError::InvalidReturnSub));
    }

    #[test]
    fn jumpsub_to_non_beginsub_aborts() {
        let mut config = ChainConfig::mainnet();
        config.transient_height = None;
        let mut state = MemoryState::new();
        let code = vec![op::PUSH1, 3, op::JUMPSUB, op::STOP];
        let result = exec_with(&mut state, config, code, 100_000);
        assert_eq!(
            result.outcome,
            Outcome::Halt(EvmError::InvalidSubroutineEntry)
        );
    }

    #[test]
    fn blockhash_serves_recent_window() {
        let mut state = MemoryState::new();
        state.set_code(
            &target(),
            Bytes::from({
                let mut c = vec![op::PUSH1, 99, op::BLOCKHASH];
                c.extend(return_top());
                c
            }),
        );
        let mut block = BlockContext {
            number: 100,
            ..Default::default()
        };
        let hash = H256::from_word(U256::from(0xDEADu64));
        block.block_hashes.insert(99, hash);
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            block,
            TxContext::default(),
            &mut state,
        );
        let result = evm.call(caller(), target(), Bytes::new(), 100_000, U256::zero());
        assert_eq!(output_word(&result), hash.into_word());
    }

    #[test]
    fn blockhash_outside_window_is_zero() {
        let mut state = MemoryState::new();
        state.set_code(
            &target(),
            Bytes::from({
                // querying the current block number yields zero
                let mut c = vec![op::PUSH1, 100, op::BLOCKHASH];
                c.extend(return_top());
                c
            }),
        );
        let block = BlockContext {
            number: 100,
            ..Default::default()
        };
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            block,
            TxContext::default(),
            &mut state,
        );
        let result = evm.call(caller(), target(), Bytes::new(), 100_000, U256::zero());
        assert_eq!(output_word(&result), U256::zero());
    }

    #[test]
    fn rescale_doubles_execution_cost() {
        let plain = ChainConfig::mainnet();
        let mut scaled = ChainConfig::mainnet();
        scaled.rescale_height = Some(0);
        scaled.rescale_factor = 2;

        let code = vec![op::PUSH1, 1, op::PUSH1, 2, op::ADD];
        let mut s1 = MemoryState::new();
        let r1 = exec_with(&mut s1, plain, code.clone(), 100_000);
        let mut s2 = MemoryState::new();
        let r2 = exec_with(&mut s2, scaled, code, 100_000);
        let used1 = 100_000 - r1.gas_left;
        let used2 = 100_000 - r2.gas_left;
        assert_eq!(used2, 2 * used1);
    }

    #[test]
    fn chainid_reflects_config() {
        let mut code = vec![op::CHAINID];
        code.extend(return_top());
        let (result, _) = exec(code, 100_000);
        assert_eq!(output_word(&result), U256::from(996u64));
    }

    #[test]
    fn call_to_empty_account_succeeds_without_frame() {
        let nobody = Address::from_bytes([0x77; 20]);
        let mut state = MemoryState::new();
        let mut evm = Evm::new(
            ChainConfig::mainnet(),
            BlockContext::default(),
            TxContext::default(),
            &mut state,
        );
        let result = evm.call(caller(), nobody, Bytes::new(), 21_000, U256::zero());
        assert!(result.outcome.is_success());
        assert_eq!(result.gas_left, 21_000);
    }

    /// A contract that forwards everything to itself stacks up frames
    /// until the depth limit cuts the chain. The frames live on the
    /// heap, so a thread with a small native stack must still carry all
    /// of them; each frame bumps a storage counter, so the final
    /// counter is the number of frames that actually ran.
    #[test]
    fn self_call_chain_ends_at_depth_limit() {
        let mut code = vec![
            op::PUSH1, 0, op::SLOAD, // counter
            op::PUSH1, 1, op::ADD,
            op::PUSH1, 0, op::SSTORE, // counter += 1
            op::PUSH1, 0, // out len
            op::PUSH1, 0, // out offset
            op::PUSH1, 0, // in len
            op::PUSH1, 0, // in offset
            op::PUSH1, 0, // value
        ];
        push_addr(&mut code, target());
        code.push(op::GAS); // request everything forwardable
        code.push(op::CALL);

        let handle = std::thread::Builder::new()
            .stack_size(512 * 1024)
            .spawn(move || {
                let mut state = MemoryState::new();
                let result =
                    exec_with(&mut state, ChainConfig::mainnet(), code, 10_000_000_000_000);
                (result, state)
            })
            .unwrap();
        let (result, state) = handle.join().unwrap();
        assert!(result.outcome.is_success());
        assert_eq!(
            state.storage(&target(), &H256::ZERO).into_word(),
            U256::from(cost::MAX_CALL_DEPTH)
        );
    }

    /// The CALL surcharges in isolation: a non-zero value costs
    /// CALL_VALUE, and landing it on a not-yet-existing account costs
    /// CALL_NEW_ACCOUNT on top. A zero-value call pays neither. The
    /// callees have no code, so every forwarded unit comes back and the
    /// unspent stipend offsets the value surcharge.
    #[test]
    fn call_value_and_new_account_surcharges() {
        fn call_with_value(to: Address, value: u8) -> Vec<u8> {
            let mut code = vec![
                op::PUSH1, 0, // out len
                op::PUSH1, 0, // out offset
                op::PUSH1, 0, // in len
                op::PUSH1, 0, // in offset
                op::PUSH1, value,
            ];
            push_addr(&mut code, to);
            code.extend([op::PUSH1 + 1, 0xFF, 0xFF]); // gas
            code.push(op::CALL);
            code
        }
        fn gas_used(state: &mut MemoryState, code: Vec<u8>) -> u64 {
            state.set_balance(&target(), U256::from(100u64));
            let result = exec_with(state, ChainConfig::mainnet(), code, 200_000);
            assert!(result.outcome.is_success());
            200_000 - result.gas_left
        }

        let fresh = Address::from_bytes([0x71; 20]);
        let fresh2 = Address::from_bytes([0x72; 20]);
        let existing = Address::from_bytes([0x73; 20]);

        let mut s0 = MemoryState::new();
        let zero_value = gas_used(&mut s0, call_with_value(fresh, 0));

        let mut s1 = MemoryState::new();
        s1.set_nonce(&existing, 1);
        let value_existing = gas_used(&mut s1, call_with_value(existing, 1));

        let mut s2 = MemoryState::new();
        let value_fresh = gas_used(&mut s2, call_with_value(fresh2, 1));

        assert_eq!(
            value_existing - zero_value,
            cost::CALL_VALUE - cost::CALL_STIPEND
        );
        assert_eq!(value_fresh - value_existing, cost::CALL_NEW_ACCOUNT);
    }

    #[test]
    fn touched_accounts_enter_the_access_list() {
        let other = Address::from_bytes([0x55; 20]);
        let mut code = Vec::new();
        push_addr(&mut code, other);
        code.push(op::BALANCE);
        let (_, state) = exec(code, 100_000);
        assert!(state.address_in_access_list(&other));
        // the called account itself is marked on frame entry
        assert!(state.address_in_access_list(&target()));
    }
}
