//! EVM error types

use thiserror::Error;

/// Errors raised while executing EVM bytecode.
///
/// Every variant except [`EvmError::Revert`] consumes all gas remaining in
/// the frame that raised it. `Revert` refunds the leftover gas to the caller
/// and carries the revert payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Frame ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Not enough gas left to pay the code deposit at the end of a create.
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,

    /// Call or create would exceed the maximum frame depth.
    #[error("max call depth exceeded")]
    DepthExceeded,

    /// Caller cannot cover the value being transferred.
    #[error("insufficient balance for transfer")]
    InsufficientBalance,

    /// Create target already has code or a non-zero nonce.
    #[error("contract address collision")]
    ContractAddressCollision,

    /// Execution hit a REVERT opcode; payload is the revert data.
    #[error("execution reverted")]
    Revert(Vec<u8>),

    /// New contract code exceeds the deploy size limit.
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,

    /// Jump destination is not a valid JUMPDEST.
    #[error("invalid jump destination {0}")]
    InvalidJump(u64),

    /// Gas or memory size computation overflowed a 64-bit integer.
    #[error("gas uint64 overflow")]
    GasUintOverflow,

    /// State-modifying opcode executed inside a static call.
    #[error("write protection")]
    WriteProtection,

    /// RETURNDATACOPY read past the end of the return buffer.
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Opcode byte has no entry in the active jump table.
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Operation pops more items than the stack holds.
    #[error("stack underflow")]
    StackUnderflow,

    /// Operation would push past the stack limit.
    #[error("stack overflow")]
    StackOverflow,

    /// BEGINSUB reached through sequential execution, or JUMPSUB targeted a
    /// byte that is not a BEGINSUB.
    #[error("invalid subroutine entry")]
    InvalidSubroutineEntry,

    /// Subroutine return stack grew past its limit.
    #[error("return stack limit reached")]
    ReturnStackExceeded,

    /// RETURNSUB with an empty return stack.
    #[error("invalid retsub")]
    InvalidReturnSub,

    /// AUTHCALL without a prior successful AUTH in the same frame.
    #[error("authcall without active authority")]
    AuthRequired,
}

/// Convenience alias used throughout the crate.
pub type EvmResult<T> = Result<T, EvmError>;

/// How a call or create frame finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Frame ran to completion; state changes are kept.
    Success,
    /// Frame reverted; state changes are rolled back, leftover gas survives.
    Revert,
    /// Frame halted on an error; state is rolled back and all gas is gone.
    Halt(EvmError),
}

impl Outcome {
    /// True only for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}
