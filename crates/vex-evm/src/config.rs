//! Chain configuration and execution context
//!
//! A [`ChainConfig`] records the block heights at which each rule set
//! activates. [`ChainConfig::rules`] flattens it into the [`ChainRules`]
//! for one block, which is what the jump table builder and the gas
//! calculators consult.

use primitive_types::U256;
use std::collections::HashMap;
use vex_primitives::{Address, BlockHeight, H256};

/// Activation schedule for the chain's rule sets. `None` means the rule
/// set never activates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Chain identifier exposed through CHAINID.
    pub chain_id: u64,
    /// DELEGATECALL and create-depth accounting.
    pub homestead_height: Option<BlockHeight>,
    /// REVERT, RETURNDATASIZE/COPY, STATICCALL and the EXP repricing.
    pub byzantium_height: Option<BlockHeight>,
    /// Shift opcodes, CREATE2 and EXTCODEHASH.
    pub constantinople_height: Option<BlockHeight>,
    /// CHAINID, SELFBALANCE and the state-access repricing.
    pub istanbul_height: Option<BlockHeight>,
    /// BEGINSUB/JUMPSUB/RETURNSUB.
    pub subroutine_height: Option<BlockHeight>,
    /// TLOAD/TSTORE/MCOPY; retires the subroutine opcodes.
    pub transient_height: Option<BlockHeight>,
    /// Staking opcodes, PRINTF and AUTH/AUTHCALL.
    pub staking_height: Option<BlockHeight>,
    /// Flat multiplier applied to every constant gas cost.
    pub rescale_height: Option<BlockHeight>,
    /// The multiplier used once `rescale_height` is reached.
    pub rescale_factor: u64,
}

impl ChainConfig {
    /// Configuration with every rule set active from genesis, as used on
    /// the VexChain main network.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 996,
            homestead_height: Some(0),
            byzantium_height: Some(0),
            constantinople_height: Some(0),
            istanbul_height: Some(0),
            subroutine_height: Some(0),
            transient_height: Some(0),
            staking_height: Some(0),
            rescale_height: None,
            rescale_factor: 1,
        }
    }

    /// The flattened rule set in force at `height`.
    pub fn rules(&self, height: BlockHeight) -> ChainRules {
        let active = |h: Option<BlockHeight>| h.is_some_and(|h| h <= height);
        ChainRules {
            chain_id: self.chain_id,
            is_homestead: active(self.homestead_height),
            is_byzantium: active(self.byzantium_height),
            is_constantinople: active(self.constantinople_height),
            is_istanbul: active(self.istanbul_height),
            has_subroutines: active(self.subroutine_height),
            has_transient_storage: active(self.transient_height),
            has_staking: active(self.staking_height),
            rescale: if active(self.rescale_height) {
                Some(self.rescale_factor)
            } else {
                None
            },
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// The rule sets in force for a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainRules {
    /// Chain identifier exposed through CHAINID.
    pub chain_id: u64,
    /// DELEGATECALL available.
    pub is_homestead: bool,
    /// REVERT, return-data opcodes, STATICCALL; EXP repriced.
    pub is_byzantium: bool,
    /// Shift opcodes, CREATE2, EXTCODEHASH.
    pub is_constantinople: bool,
    /// CHAINID, SELFBALANCE; state access repriced.
    pub is_istanbul: bool,
    /// Subroutine opcodes live (unless retired by transient storage).
    pub has_subroutines: bool,
    /// Transient storage and MCOPY live.
    pub has_transient_storage: bool,
    /// Staking opcodes, PRINTF, AUTH/AUTHCALL live.
    pub has_staking: bool,
    /// Flat constant-gas multiplier, if any.
    pub rescale: Option<u64>,
}

/// Block-level execution context.
#[derive(Clone, Debug, Default)]
pub struct BlockContext {
    /// Block height.
    pub number: BlockHeight,
    /// Unix timestamp of the block.
    pub timestamp: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Address collecting the block reward.
    pub coinbase: Address,
    /// Randomness beacon output, exposed through DIFFICULTY.
    pub prevrandao: H256,
    /// Base fee per gas.
    pub base_fee: U256,
    /// Hashes of recent blocks, served through BLOCKHASH. The host fills
    /// in up to the 256 most recent ancestors.
    pub block_hashes: HashMap<BlockHeight, H256>,
}

/// Transaction-level execution context.
#[derive(Clone, Debug, Default)]
pub struct TxContext {
    /// Signer of the outermost transaction, exposed through ORIGIN.
    pub origin: Address,
    /// Effective gas price, exposed through GASPRICE.
    pub gas_price: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_respect_heights() {
        let config = ChainConfig {
            chain_id: 7,
            homestead_height: Some(0),
            byzantium_height: Some(10),
            constantinople_height: Some(20),
            istanbul_height: Some(20),
            subroutine_height: Some(30),
            transient_height: Some(40),
            staking_height: None,
            rescale_height: Some(50),
            rescale_factor: 2,
        };

        let early = config.rules(5);
        assert!(early.is_homestead);
        assert!(!early.is_byzantium);
        assert_eq!(early.rescale, None);

        let mid = config.rules(25);
        assert!(mid.is_byzantium);
        assert!(mid.is_constantinople);
        assert!(mid.is_istanbul);
        assert!(!mid.has_subroutines);

        let late = config.rules(50);
        assert!(late.has_subroutines);
        assert!(late.has_transient_storage);
        assert!(!late.has_staking);
        assert_eq!(late.rescale, Some(2));
    }

    #[test]
    fn mainnet_everything_from_genesis() {
        let rules = ChainConfig::mainnet().rules(0);
        assert!(rules.is_homestead);
        assert!(rules.has_staking);
        assert!(rules.has_transient_storage);
        assert_eq!(rules.rescale, None);
        assert_eq!(rules.chain_id, 996);
    }

    #[test]
    fn activation_boundary_is_inclusive() {
        let mut config = ChainConfig::mainnet();
        config.byzantium_height = Some(100);
        assert!(!config.rules(99).is_byzantium);
        assert!(config.rules(100).is_byzantium);
    }
}
