pub mod accounts;
pub mod chain;
pub mod contract;
pub mod error;
pub mod fixture;
pub mod mnemonic;

pub use mnemonic::{generate_mnemonic, validate_mnemonic, DEV_MNEMONIC};
pub use accounts::{address_from_public_key, derive_signers, Signer, SignerSummary};
pub use error::{Result, TestchainError};

// Chain API exports
pub use chain::{Chain, ChainConfig, DEFAULT_INITIAL_BALANCE_WEI, DEFAULT_SIGNER_COUNT};
pub use chain::currency::{format_ether, parse_ether, WEI_PER_ETHER};
pub use chain::state::{Address, ChainSnapshot, ChainState, Snapshotable, StateError, StorageKey};
pub use chain::transaction::{TransferRequest, TransferValidationError};

// Contract and fixture exports
pub use contract::faucet::{Faucet, WITHDRAW_LIMIT_WEI};
pub use contract::RevertReason;
pub use fixture::{FixtureCache, FixtureFn};
