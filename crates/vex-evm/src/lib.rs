//! # vex-evm
//!
//! EVM execution engine for VexChain.
//!
//! This crate provides:
//! - Bytecode interpreter with jump-table dispatch
//! - Gas metering with fork-dependent schedules
//! - Call and create frame orchestration
//! - VexChain opcode extensions (staking, PRINTF, AUTH/AUTHCALL)
//!
//! Hosts embed the engine by implementing [`StateAccess`] over their
//! state database and driving [`Evm`] once per transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod contract;
pub mod error;
mod evm;
pub mod gas;
mod instructions;
pub mod interpreter;
pub mod jumptable;
pub mod memory;
pub mod opcode;
pub mod stack;
pub mod state;
pub mod word;

pub use config::{BlockContext, ChainConfig, ChainRules, TxContext};
pub use contract::Contract;
pub use error::{EvmError, EvmResult, Outcome};
pub use evm::{CallResult, CreateResult, Evm};
pub use interpreter::Frame;
pub use jumptable::JumpTable;
pub use memory::Memory;
pub use stack::{ReturnStack, Stack};
pub use state::{Log, MemoryState, StateAccess};
