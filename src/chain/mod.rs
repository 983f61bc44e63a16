//! Simulated local chain: the context handle threaded through signers,
//! contract calls, and the fixture cache. No hidden globals; every
//! operation goes through an explicit `&Chain`.
//!
//! Execution is single-threaded cooperative: callers are expected to run
//! strictly sequentially against one chain instance. Every transaction
//! (value transfer, deployment, state-changing contract call) bumps the
//! sender nonce and advances the block pointer by one.

pub mod currency;
pub mod state;
pub mod transaction;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::accounts::{derive_signers, Signer};
use crate::chain::currency::WEI_PER_ETHER;
use crate::chain::state::{Address, ChainSnapshot, ChainState, Snapshotable, StateError};
use crate::chain::transaction::TransferRequest;
use crate::error::{Result, TestchainError};
use crate::mnemonic::DEV_MNEMONIC;

/// Default number of funded dev signers.
pub const DEFAULT_SIGNER_COUNT: usize = 3;

/// Default starting balance per signer: 10 000 ether.
pub const DEFAULT_INITIAL_BALANCE_WEI: u128 = 10_000 * WEI_PER_ETHER;

/// Chain construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// BIP39 mnemonic the signer set is derived from.
    pub mnemonic: String,
    /// Number of funded signers, derived at indices `0..signer_count`.
    pub signer_count: usize,
    /// Starting balance of each signer, in wei.
    pub initial_balance_wei: u128,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            mnemonic: DEV_MNEMONIC.to_string(),
            signer_count: DEFAULT_SIGNER_COUNT,
            initial_balance_wei: DEFAULT_INITIAL_BALANCE_WEI,
        }
    }
}

/// The simulated chain: state tables plus the derived signer set.
///
/// Signers are fixed at construction; restoring a snapshot rolls back
/// balances, code, storage, nonces, and the block pointer, never the
/// signer identities.
#[derive(Debug)]
pub struct Chain {
    state: ChainState,
    signers: Vec<Signer>,
    config: ChainConfig,
}

impl Chain {
    /// Builds a chain with the default dev config: three signers from the
    /// well-known dev mnemonic, 10 000 ether each.
    pub fn new() -> Result<Self> {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Result<Self> {
        let signers = derive_signers(&config.mnemonic, config.signer_count)?;
        let state = ChainState::new();
        for signer in &signers {
            state.set_balance(signer.address(), config.initial_balance_wei);
        }
        log::debug!(
            "chain initialized: {} signers funded with {} wei each",
            signers.len(),
            config.initial_balance_wei
        );
        Ok(Self {
            state,
            signers,
            config,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The funded dev signers, in derivation order.
    pub fn signers(&self) -> &[Signer] {
        &self.signers
    }

    /// Direct access to the state tables.
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Account balance in wei.
    pub fn get_balance(&self, address: &Address) -> u128 {
        self.state.get_balance(address)
    }

    /// Contract code at the address as a hex string; `"0x"` when none.
    pub fn code_at(&self, address: &Address) -> String {
        self.state.code_hex(address)
    }

    pub fn block_number(&self) -> u64 {
        self.state.block_number()
    }

    /// Executes a plain value transfer. Crediting a contract address is the
    /// receive path: the contract balance simply grows. Bumps the sender
    /// nonce and advances the block.
    pub fn send_transaction(&self, request: &TransferRequest) -> Result<()> {
        request.validate_basic()?;
        self.require_known_sender(&request.from)?;
        self.state
            .transfer(&request.from, &request.to, request.value_wei)
            .map_err(TestchainError::from)?;
        self.state.bump_nonce(&request.from);
        let block = self.state.advance_block();
        log::debug!(
            "transfer: {} -> {} value {} wei (block {})",
            request.from,
            request.to,
            request.value_wei,
            block
        );
        Ok(())
    }

    /// Installs contract code at a deterministic address derived from the
    /// deployer address and its current nonce.
    pub(crate) fn create_contract(&self, deployer: &Address, code: Bytes) -> Result<Address> {
        self.require_known_sender(deployer)?;
        let nonce = self.state.bump_nonce(deployer);
        let address = contract_address(deployer, nonce);
        self.state.set_code(&address, code);
        let block = self.state.advance_block();
        log::debug!(
            "contract deployed at {} by {} (nonce {}, block {})",
            address,
            deployer,
            nonce,
            block
        );
        Ok(address)
    }

    /// Validation phase of a state-changing contract call: the caller must
    /// be a known signer and the target must carry code. Mutates nothing,
    /// so a revert raised after this leaves the chain untouched.
    pub(crate) fn begin_call(&self, caller: &Address, contract: &Address) -> Result<()> {
        self.require_known_sender(caller)?;
        if self.state.get_code(contract).is_none() {
            return Err(StateError::NoContract(contract.clone()).into());
        }
        Ok(())
    }

    /// Completion phase of a state-changing contract call: consumes the
    /// caller nonce and advances the block.
    pub(crate) fn finish_call(&self, caller: &Address) {
        self.state.bump_nonce(caller);
        self.state.advance_block();
    }

    fn require_known_sender(&self, address: &Address) -> Result<()> {
        if self.signers.iter().any(|s| s.address() == address) {
            return Ok(());
        }
        Err(TestchainError::Validation(format!(
            "unknown sender: {} is not a derived signer",
            address
        )))
    }
}

impl Snapshotable for Chain {
    fn snapshot(&self) -> ChainSnapshot {
        self.state.snapshot()
    }
}

/// Deterministic contract address: last 20 bytes of
/// SHA-256(deployer ‖ nonce), hex-encoded with a `0x` prefix.
fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("0x{}", &digest[digest.len() - 40..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_funds_signers() {
        let chain = Chain::new().unwrap();
        assert_eq!(chain.signers().len(), DEFAULT_SIGNER_COUNT);
        for signer in chain.signers() {
            assert_eq!(chain.get_balance(signer.address()), DEFAULT_INITIAL_BALANCE_WEI);
        }
        assert_eq!(chain.block_number(), 0);
    }

    #[test]
    fn test_chain_is_deterministic() {
        let a = Chain::new().unwrap();
        let b = Chain::new().unwrap();
        assert_eq!(
            a.signers().iter().map(|s| s.address().clone()).collect::<Vec<_>>(),
            b.signers().iter().map(|s| s.address().clone()).collect::<Vec<_>>()
        );
        assert_eq!(a.state().snapshot(), b.state().snapshot());
    }

    #[test]
    fn test_send_transaction_moves_value() {
        let chain = Chain::new().unwrap();
        let from = chain.signers()[0].address().clone();
        let to = chain.signers()[1].address().clone();

        chain
            .send_transaction(&TransferRequest::new(from.clone(), to.clone(), 1_000))
            .unwrap();

        assert_eq!(chain.get_balance(&from), DEFAULT_INITIAL_BALANCE_WEI - 1_000);
        assert_eq!(chain.get_balance(&to), DEFAULT_INITIAL_BALANCE_WEI + 1_000);
        assert_eq!(chain.state().get_nonce(&from), 1);
        assert_eq!(chain.block_number(), 1);
    }

    #[test]
    fn test_send_transaction_rejects_unknown_sender() {
        let chain = Chain::new().unwrap();
        let to = chain.signers()[0].address().clone();
        let stranger = "0xcccccccccccccccccccccccccccccccccccccccc".to_string();
        let result = chain.send_transaction(&TransferRequest::new(stranger, to, 1));
        assert!(result.is_err());
        assert_eq!(chain.block_number(), 0);
    }

    #[test]
    fn test_send_transaction_insufficient_funds_has_no_effect() {
        let chain = Chain::new().unwrap();
        let from = chain.signers()[0].address().clone();
        let to = chain.signers()[1].address().clone();
        let result = chain.send_transaction(&TransferRequest::new(
            from.clone(),
            to,
            DEFAULT_INITIAL_BALANCE_WEI + 1,
        ));
        assert!(result.is_err());
        assert_eq!(chain.get_balance(&from), DEFAULT_INITIAL_BALANCE_WEI);
        assert_eq!(chain.state().get_nonce(&from), 0);
        assert_eq!(chain.block_number(), 0);
    }

    #[test]
    fn test_create_contract_derives_stable_addresses() {
        let a = Chain::new().unwrap();
        let b = Chain::new().unwrap();
        let deployer_a = a.signers()[0].address().clone();
        let deployer_b = b.signers()[0].address().clone();

        let addr_a = a
            .create_contract(&deployer_a, Bytes::from_static(&[0x01]))
            .unwrap();
        let addr_b = b
            .create_contract(&deployer_b, Bytes::from_static(&[0x01]))
            .unwrap();

        assert_eq!(addr_a, addr_b);
        assert_eq!(a.code_at(&addr_a), "0x01");
    }

    #[test]
    fn test_create_contract_distinct_per_nonce() {
        let chain = Chain::new().unwrap();
        let deployer = chain.signers()[0].address().clone();
        let first = chain
            .create_contract(&deployer, Bytes::from_static(&[0x01]))
            .unwrap();
        let second = chain
            .create_contract(&deployer, Bytes::from_static(&[0x01]))
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_custom_config() {
        let config = ChainConfig {
            signer_count: 5,
            initial_balance_wei: 7 * WEI_PER_ETHER,
            ..ChainConfig::default()
        };
        let chain = Chain::with_config(config).unwrap();
        assert_eq!(chain.signers().len(), 5);
        assert_eq!(
            chain.get_balance(chain.signers()[4].address()),
            7 * WEI_PER_ETHER
        );
    }

    #[test]
    fn test_begin_call_requires_contract_code() {
        let chain = Chain::new().unwrap();
        let caller = chain.signers()[0].address().clone();
        let nowhere = "0xdddddddddddddddddddddddddddddddddddddddd".to_string();
        assert!(chain.begin_call(&caller, &nowhere).is_err());
    }
}
