//! Simulated chain state: single source of truth for account balances,
//! contract code, contract storage, nonces, and the block pointer.
//!
//! # Determinism
//! Same operation order yields the same final state. No randomness or
//! system time anywhere in the mutation path.
//!
//! # Snapshots
//! `snapshot()` captures the full state in O(1) by cloning `Arc`s;
//! `restore()` replaces the live tables with the captured ones. For any
//! state S, `restore(&S.snapshot())` is the identity, and restore is
//! idempotent. Snapshots are immutable after creation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::TestchainError;

/// Address type (alias for String). Canonical form: `0x` + 40 hex chars.
pub type Address = String;

/// Contract storage slot key (alias for String).
pub type StorageKey = String;

/// Trait for types that can produce immutable chain snapshots.
pub trait Snapshotable {
    /// Produces an immutable snapshot of the current state. Deterministic:
    /// same state yields an equal snapshot.
    fn snapshot(&self) -> ChainSnapshot;
}

/// Errors produced by state operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("No contract code at {0}")]
    NoContract(Address),
}

impl From<StateError> for TestchainError {
    fn from(err: StateError) -> Self {
        TestchainError::State(err.to_string())
    }
}

/// Immutable capture of the full simulated chain state: account table,
/// code table, storage table, and block pointer. Creation is O(1) via
/// `Arc`; no mutation methods exist.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    balances: Arc<HashMap<Address, u128>>,
    code: Arc<HashMap<Address, Bytes>>,
    storage: Arc<HashMap<(Address, StorageKey), String>>,
    nonces: Arc<HashMap<Address, u64>>,
    block_number: u64,
}

impl ChainSnapshot {
    fn balances_arc(&self) -> &Arc<HashMap<Address, u128>> {
        &self.balances
    }

    /// Returns the balance for the address, or 0 if absent.
    pub fn get_balance(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn get_nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or(0)
    }

    /// Contract code as a hex string; `"0x"` when no code is deployed.
    pub fn code_hex(&self, address: &Address) -> String {
        match self.code.get(address) {
            Some(code) => format!("0x{}", hex::encode(code)),
            None => "0x".to_string(),
        }
    }

    pub fn get_storage(&self, address: &Address, key: &str) -> Option<&str> {
        self.storage
            .get(&(address.clone(), key.to_string()))
            .map(String::as_str)
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Returns all balances, sorted by address for deterministic ordering.
    pub fn get_all_balances(&self) -> Vec<(Address, u128)> {
        let mut v: Vec<_> = self
            .balances
            .iter()
            .map(|(addr, bal)| (addr.clone(), *bal))
            .collect();
        v.sort_by(|a, b| a.0.cmp(&b.0));
        v
    }

    /// Computes the deterministic state root over sorted tables plus the
    /// block pointer. Equal snapshots have equal roots.
    pub fn compute_state_root(&self) -> String {
        let mut hasher = Sha256::new();
        for (addr, bal) in self.get_all_balances() {
            hasher.update(addr.as_bytes());
            hasher.update(bal.to_le_bytes());
        }
        let mut code: Vec<_> = self.code.iter().collect();
        code.sort_by(|a, b| a.0.cmp(b.0));
        for (addr, blob) in code {
            hasher.update(addr.as_bytes());
            hasher.update(blob);
        }
        let mut storage: Vec<_> = self.storage.iter().collect();
        storage.sort_by(|a, b| a.0.cmp(b.0));
        for ((addr, key), value) in storage {
            hasher.update(addr.as_bytes());
            hasher.update(key.as_bytes());
            hasher.update(value.as_bytes());
        }
        let mut nonces: Vec<_> = self.nonces.iter().collect();
        nonces.sort_by(|a, b| a.0.cmp(b.0));
        for (addr, nonce) in nonces {
            hasher.update(addr.as_bytes());
            hasher.update(nonce.to_le_bytes());
        }
        hasher.update(self.block_number.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.code.is_empty()
            && self.storage.is_empty()
            && self.nonces.is_empty()
            && self.block_number == 0
    }
}

impl PartialEq for ChainSnapshot {
    fn eq(&self, other: &Self) -> bool {
        *self.balances == *other.balances
            && *self.code == *other.code
            && *self.storage == *other.storage
            && *self.nonces == *other.nonces
            && self.block_number == other.block_number
    }
}

impl Eq for ChainSnapshot {}

/// Live simulated chain state. Tables are copy-on-write: snapshots share
/// the underlying maps until the next mutation.
#[derive(Debug)]
pub struct ChainState {
    balances: RwLock<Arc<HashMap<Address, u128>>>,
    code: RwLock<Arc<HashMap<Address, Bytes>>>,
    storage: RwLock<Arc<HashMap<(Address, StorageKey), String>>>,
    nonces: RwLock<Arc<HashMap<Address, u64>>>,
    block_number: RwLock<u64>,
}

impl ChainState {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(Arc::new(HashMap::new())),
            code: RwLock::new(Arc::new(HashMap::new())),
            storage: RwLock::new(Arc::new(HashMap::new())),
            nonces: RwLock::new(Arc::new(HashMap::new())),
            block_number: RwLock::new(0),
        }
    }

    /// Account balance in wei. Returns 0 if missing.
    pub fn get_balance(&self, address: &Address) -> u128 {
        let balances = self.balances.read().unwrap();
        balances.get(address).copied().unwrap_or(0)
    }

    pub fn set_balance(&self, address: &Address, balance: u128) {
        let mut balances = self.balances.write().unwrap();
        Arc::make_mut(&mut balances).insert(address.clone(), balance);
    }

    /// Moves `amount` wei from one account to another. No partial effect:
    /// the debit is checked before any table is touched.
    pub fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), StateError> {
        let mut balances = self.balances.write().unwrap();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(StateError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }
        let table = Arc::make_mut(&mut balances);
        table.insert(from.clone(), from_balance - amount);
        let to_balance = table.get(to).copied().unwrap_or(0);
        table.insert(to.clone(), to_balance + amount);
        Ok(())
    }

    /// Contract code, if any is deployed at the address.
    pub fn get_code(&self, address: &Address) -> Option<Bytes> {
        let code = self.code.read().unwrap();
        code.get(address).cloned()
    }

    /// Contract code as a hex string; `"0x"` when no code is deployed.
    pub fn code_hex(&self, address: &Address) -> String {
        match self.get_code(address) {
            Some(code) => format!("0x{}", hex::encode(&code)),
            None => "0x".to_string(),
        }
    }

    pub fn set_code(&self, address: &Address, blob: Bytes) {
        let mut code = self.code.write().unwrap();
        Arc::make_mut(&mut code).insert(address.clone(), blob);
    }

    pub fn remove_code(&self, address: &Address) {
        let mut code = self.code.write().unwrap();
        Arc::make_mut(&mut code).remove(address);
    }

    pub fn get_storage(&self, address: &Address, key: &str) -> Option<String> {
        let storage = self.storage.read().unwrap();
        storage.get(&(address.clone(), key.to_string())).cloned()
    }

    pub fn set_storage(&self, address: &Address, key: &str, value: &str) {
        let mut storage = self.storage.write().unwrap();
        Arc::make_mut(&mut storage).insert((address.clone(), key.to_string()), value.to_string());
    }

    /// Removes every storage slot belonging to the address.
    pub fn clear_storage(&self, address: &Address) {
        let mut storage = self.storage.write().unwrap();
        Arc::make_mut(&mut storage).retain(|(addr, _), _| addr != address);
    }

    pub fn get_nonce(&self, address: &Address) -> u64 {
        let nonces = self.nonces.read().unwrap();
        nonces.get(address).copied().unwrap_or(0)
    }

    /// Increments the account nonce, returning the value consumed by the
    /// current transaction.
    pub fn bump_nonce(&self, address: &Address) -> u64 {
        let mut nonces = self.nonces.write().unwrap();
        let table = Arc::make_mut(&mut nonces);
        let current = table.get(address).copied().unwrap_or(0);
        table.insert(address.clone(), current + 1);
        current
    }

    pub fn block_number(&self) -> u64 {
        *self.block_number.read().unwrap()
    }

    /// Advances the block pointer by one, returning the new block number.
    pub fn advance_block(&self) -> u64 {
        let mut block = self.block_number.write().unwrap();
        *block += 1;
        *block
    }

    /// Creates an immutable snapshot of the current state. O(1): only the
    /// `Arc`s are cloned; table data is shared copy-on-write until the next
    /// mutation. Same state yields an equal snapshot; the state itself is
    /// unchanged.
    pub fn snapshot(&self) -> ChainSnapshot {
        let balances = self.balances.read().unwrap();
        let code = self.code.read().unwrap();
        let storage = self.storage.read().unwrap();
        let nonces = self.nonces.read().unwrap();
        let block_number = self.block_number.read().unwrap();
        ChainSnapshot {
            balances: balances.clone(),
            code: code.clone(),
            storage: storage.clone(),
            nonces: nonces.clone(),
            block_number: *block_number,
        }
    }

    /// Restores the state from a snapshot, rolling back every change made
    /// since its capture. O(1): replaces the `Arc` references. Atomic with
    /// respect to callers that honor the single-writer discipline; the
    /// snapshot itself is never modified, so restore is idempotent.
    pub fn restore(&self, snapshot: &ChainSnapshot) {
        let mut balances = self.balances.write().unwrap();
        let mut code = self.code.write().unwrap();
        let mut storage = self.storage.write().unwrap();
        let mut nonces = self.nonces.write().unwrap();
        let mut block_number = self.block_number.write().unwrap();
        *balances = snapshot.balances_arc().clone();
        *code = snapshot.code.clone();
        *storage = snapshot.storage.clone();
        *nonces = snapshot.nonces.clone();
        *block_number = snapshot.block_number;
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshotable for ChainState {
    fn snapshot(&self) -> ChainSnapshot {
        ChainState::snapshot(self)
    }
}
