//! EVM stack implementation

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::{MAX_STACK_SIZE, RETURN_STACK_LIMIT};
use primitive_types::U256;

/// EVM operand stack, at most 1024 256-bit words deep.
///
/// The interpreter validates the stack requirements of every operation
/// before dispatch, so instruction bodies can pop and push without
/// re-checking; the checks here remain as a hard backstop.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(16),
        }
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the stack holds no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Push a word.
    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(EvmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop the top word.
    pub fn pop(&mut self) -> EvmResult<U256> {
        self.data.pop().ok_or(EvmError::StackUnderflow)
    }

    /// Borrow the top word.
    pub fn peek(&self) -> EvmResult<&U256> {
        self.data.last().ok_or(EvmError::StackUnderflow)
    }

    /// Borrow the word `n` positions below the top (0 is the top).
    pub fn peek_at(&self, n: usize) -> EvmResult<&U256> {
        if n >= self.data.len() {
            return Err(EvmError::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - 1 - n])
    }

    /// Mutably borrow the top word. Used by instructions that replace
    /// the top in place instead of popping and pushing.
    pub fn peek_mut(&mut self) -> EvmResult<&mut U256> {
        self.data.last_mut().ok_or(EvmError::StackUnderflow)
    }

    /// Duplicate the word `n` positions below the top onto the top
    /// (DUP1 is `dup(0)`).
    pub fn dup(&mut self, n: usize) -> EvmResult<()> {
        let value = *self.peek_at(n)?;
        self.push(value)
    }

    /// Swap the top word with the word `n` positions below it
    /// (SWAP1 is `swap(1)`).
    pub fn swap(&mut self, n: usize) -> EvmResult<()> {
        if n >= self.data.len() {
            return Err(EvmError::StackUnderflow);
        }
        let top = self.data.len() - 1;
        self.data.swap(top, top - n);
        Ok(())
    }
}

/// Subroutine return stack, at most 1023 program counters deep.
///
/// Deliberately one short of the operand stack limit so that a frame can
/// never hold 1024 pending returns.
#[derive(Clone, Debug, Default)]
pub struct ReturnStack {
    data: Vec<u64>,
}

impl ReturnStack {
    /// Create an empty return stack.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no return addresses are pending.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record the program counter to return to.
    pub fn push(&mut self, pc: u64) -> EvmResult<()> {
        if self.data.len() >= RETURN_STACK_LIMIT {
            return Err(EvmError::ReturnStackExceeded);
        }
        self.data.push(pc);
        Ok(())
    }

    /// Pop the most recent return address.
    pub fn pop(&mut self) -> EvmResult<u64> {
        self.data.pop().ok_or(EvmError::InvalidReturnSub)
    }
}
