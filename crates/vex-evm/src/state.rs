//! Host state interface and an in-memory implementation
//!
//! The interpreter reads and writes world state only through
//! [`StateAccess`]. A node embeds the EVM by implementing this trait over
//! its state database; [`MemoryState`] is the reference implementation
//! used in tests and tooling.

use bytes::Bytes;
use primitive_types::U256;
use std::collections::{HashMap, HashSet};
use vex_crypto::keccak256;
use vex_primitives::{Address, H256};

/// One LOG entry emitted during execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Account that emitted the log.
    pub address: Address,
    /// Up to four indexed topics.
    pub topics: Vec<H256>,
    /// Unindexed payload.
    pub data: Vec<u8>,
    /// Height of the block the log was emitted in.
    pub block_number: u64,
}

/// World state as seen by the interpreter.
///
/// Mutations between a `snapshot` and a `revert_to` of that snapshot must
/// be rolled back in full, including logs, refunds, transient storage and
/// stakes.
pub trait StateAccess {
    /// Balance of `addr`, zero for unknown accounts.
    fn balance(&self, addr: &Address) -> U256;
    /// Credit `amount` to `addr`, creating the account if needed.
    fn add_balance(&mut self, addr: &Address, amount: U256);
    /// Debit `amount` from `addr`. Callers check the balance first.
    fn sub_balance(&mut self, addr: &Address, amount: U256);
    /// Overwrite the balance of `addr`, creating the account if needed.
    fn set_balance(&mut self, addr: &Address, balance: U256);

    /// Nonce of `addr`.
    fn nonce(&self, addr: &Address) -> u64;
    /// Set the nonce of `addr`.
    fn set_nonce(&mut self, addr: &Address, nonce: u64);

    /// Code stored at `addr`, empty for non-contracts.
    fn code(&self, addr: &Address) -> Bytes;
    /// Keccak hash of the code at `addr`.
    fn code_hash(&self, addr: &Address) -> H256;
    /// Length of the code at `addr`.
    fn code_size(&self, addr: &Address) -> usize;
    /// Install code at `addr`.
    fn set_code(&mut self, addr: &Address, code: Bytes);

    /// Persistent storage slot, zero if unset.
    fn storage(&self, addr: &Address, key: &H256) -> H256;
    /// Write a persistent storage slot.
    fn set_storage(&mut self, addr: &Address, key: H256, value: H256);

    /// Transient storage slot, zero if unset. Cleared between
    /// transactions by the host.
    fn transient_storage(&self, addr: &Address, key: &H256) -> H256;
    /// Write a transient storage slot.
    fn set_transient_storage(&mut self, addr: &Address, key: H256, value: H256);

    /// Materialize an account record for `addr`.
    fn create_account(&mut self, addr: &Address);
    /// True if an account record exists for `addr`.
    fn exists(&self, addr: &Address) -> bool;
    /// True if `addr` has zero balance, zero nonce and no code.
    fn is_empty(&self, addr: &Address) -> bool;

    /// Mark `addr` self-destructed. False if it already was.
    fn suicide(&mut self, addr: &Address) -> bool;
    /// True if `addr` has been marked self-destructed this transaction.
    fn has_suicided(&self, addr: &Address) -> bool;

    /// Append a log entry.
    fn add_log(&mut self, log: Log);
    /// All logs appended so far this transaction.
    fn logs(&self) -> &[Log];

    /// Accumulate a gas refund.
    fn add_refund(&mut self, amount: u64);
    /// Total accumulated refund.
    fn refund(&self) -> u64;

    /// Stake currently held for `addr`.
    fn stake_of(&self, addr: &Address) -> U256;
    /// Add to the stake held for `addr`.
    fn add_stake(&mut self, addr: &Address, amount: U256);
    /// Remove part of the stake held for `addr`. Callers check the
    /// staked amount first.
    fn sub_stake(&mut self, addr: &Address, amount: U256);
    /// Drop the whole stake of `addr`, returning the amount removed.
    fn remove_stake(&mut self, addr: &Address) -> U256;
    /// Number of accounts currently holding a non-zero stake.
    fn stake_count(&self) -> u64;

    /// Record `addr` as touched by this transaction. The interpreter
    /// marks every account a BALANCE, EXTCODE* or call-family
    /// instruction reaches; the host seeds it from the transaction's
    /// declared access list.
    fn add_address_to_access_list(&mut self, addr: &Address);
    /// True if `addr` has been touched this transaction.
    fn address_in_access_list(&self, addr: &Address) -> bool;

    /// Decide whether `invoker` may act on behalf of `authority`,
    /// given the commitment bytes presented by AUTH. The host owns the
    /// actual signature or policy check.
    fn authorize(&mut self, invoker: &Address, authority: &Address, commit: &[u8]) -> bool;

    /// Take a snapshot of the current state.
    fn snapshot(&mut self) -> usize;
    /// Roll back to a snapshot taken earlier in this transaction.
    fn revert_to(&mut self, snapshot: usize);
}

#[derive(Clone, Debug, Default)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Bytes,
    suicided: bool,
}

#[derive(Clone, Debug, Default)]
struct World {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, H256), H256>,
    transient: HashMap<(Address, H256), H256>,
    logs: Vec<Log>,
    refund: u64,
    stakes: HashMap<Address, U256>,
    authorities: HashSet<(Address, Address)>,
    access_list: HashSet<Address>,
}

/// In-memory [`StateAccess`] implementation with clone-based snapshots.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    world: World,
    snapshots: Vec<World>,
}

impl MemoryState {
    /// Fresh empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit `invoker` to claim authority over `authority` through AUTH.
    pub fn approve_authority(&mut self, invoker: Address, authority: Address) {
        self.world.authorities.insert((invoker, authority));
    }

    /// Drop all transient storage slots. Called by the host between
    /// transactions.
    pub fn clear_transient_storage(&mut self) {
        self.world.transient.clear();
    }
}

impl StateAccess for MemoryState {
    fn balance(&self, addr: &Address) -> U256 {
        self.world
            .accounts
            .get(addr)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    fn add_balance(&mut self, addr: &Address, amount: U256) {
        let account = self.world.accounts.entry(*addr).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    fn sub_balance(&mut self, addr: &Address, amount: U256) {
        let account = self.world.accounts.entry(*addr).or_default();
        account.balance = account.balance.saturating_sub(amount);
    }

    fn set_balance(&mut self, addr: &Address, balance: U256) {
        self.world.accounts.entry(*addr).or_default().balance = balance;
    }

    fn nonce(&self, addr: &Address) -> u64 {
        self.world
            .accounts
            .get(addr)
            .map(|a| a.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, addr: &Address, nonce: u64) {
        self.world.accounts.entry(*addr).or_default().nonce = nonce;
    }

    fn code(&self, addr: &Address) -> Bytes {
        self.world
            .accounts
            .get(addr)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    fn code_hash(&self, addr: &Address) -> H256 {
        match self.world.accounts.get(addr) {
            Some(a) => keccak256(&a.code),
            None => H256::ZERO,
        }
    }

    fn code_size(&self, addr: &Address) -> usize {
        self.world
            .accounts
            .get(addr)
            .map(|a| a.code.len())
            .unwrap_or_default()
    }

    fn set_code(&mut self, addr: &Address, code: Bytes) {
        self.world.accounts.entry(*addr).or_default().code = code;
    }

    fn storage(&self, addr: &Address, key: &H256) -> H256 {
        self.world
            .storage
            .get(&(*addr, *key))
            .copied()
            .unwrap_or(H256::ZERO)
    }

    fn set_storage(&mut self, addr: &Address, key: H256, value: H256) {
        if value.is_zero() {
            self.world.storage.remove(&(*addr, key));
        } else {
            self.world.storage.insert((*addr, key), value);
        }
    }

    fn transient_storage(&self, addr: &Address, key: &H256) -> H256 {
        self.world
            .transient
            .get(&(*addr, *key))
            .copied()
            .unwrap_or(H256::ZERO)
    }

    fn set_transient_storage(&mut self, addr: &Address, key: H256, value: H256) {
        if value.is_zero() {
            self.world.transient.remove(&(*addr, key));
        } else {
            self.world.transient.insert((*addr, key), value);
        }
    }

    fn create_account(&mut self, addr: &Address) {
        self.world.accounts.entry(*addr).or_default();
    }

    fn exists(&self, addr: &Address) -> bool {
        self.world.accounts.contains_key(addr)
    }

    fn is_empty(&self, addr: &Address) -> bool {
        match self.world.accounts.get(addr) {
            Some(a) => a.balance.is_zero() && a.nonce == 0 && a.code.is_empty(),
            None => true,
        }
    }

    fn suicide(&mut self, addr: &Address) -> bool {
        let account = self.world.accounts.entry(*addr).or_default();
        if account.suicided {
            return false;
        }
        account.suicided = true;
        account.balance = U256::zero();
        true
    }

    fn has_suicided(&self, addr: &Address) -> bool {
        self.world
            .accounts
            .get(addr)
            .is_some_and(|a| a.suicided)
    }

    fn add_log(&mut self, log: Log) {
        self.world.logs.push(log);
    }

    fn logs(&self) -> &[Log] {
        &self.world.logs
    }

    fn add_refund(&mut self, amount: u64) {
        self.world.refund += amount;
    }

    fn refund(&self) -> u64 {
        self.world.refund
    }

    fn stake_of(&self, addr: &Address) -> U256 {
        self.world.stakes.get(addr).copied().unwrap_or_default()
    }

    fn add_stake(&mut self, addr: &Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let stake = self.world.stakes.entry(*addr).or_default();
        *stake = stake.saturating_add(amount);
    }

    fn sub_stake(&mut self, addr: &Address, amount: U256) {
        if let Some(stake) = self.world.stakes.get_mut(addr) {
            *stake = stake.saturating_sub(amount);
            if stake.is_zero() {
                self.world.stakes.remove(addr);
            }
        }
    }

    fn remove_stake(&mut self, addr: &Address) -> U256 {
        self.world.stakes.remove(addr).unwrap_or_default()
    }

    fn stake_count(&self) -> u64 {
        self.world.stakes.len() as u64
    }

    fn add_address_to_access_list(&mut self, addr: &Address) {
        self.world.access_list.insert(*addr);
    }

    fn address_in_access_list(&self, addr: &Address) -> bool {
        self.world.access_list.contains(addr)
    }

    fn authorize(&mut self, invoker: &Address, authority: &Address, _commit: &[u8]) -> bool {
        self.world.authorities.contains(&(*invoker, *authority))
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.world.clone());
        self.snapshots.len() - 1
    }

    fn revert_to(&mut self, snapshot: usize) {
        self.world = self.snapshots[snapshot].clone();
        self.snapshots.truncate(snapshot);
    }
}
