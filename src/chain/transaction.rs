//! Value-transfer request format for the simulated chain.
//!
//! A transfer only moves wei; contract calls go through the typed contract
//! handles. Validation is structural (address shape) and stateless; balance
//! checks happen at execution time against the live state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::state::Address;
use crate::error::TestchainError;

/// Errors produced by transfer validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferValidationError {
    #[error("Invalid address {0}: expected 0x followed by 40 hex chars")]
    InvalidAddress(String),

    #[error("Sender and recipient are the same address: {0}")]
    SelfTransfer(String),
}

impl From<TransferValidationError> for TestchainError {
    fn from(err: TransferValidationError) -> Self {
        TestchainError::Validation(err.to_string())
    }
}

/// Result type for transfer validation.
pub type ValidationResult = std::result::Result<(), TransferValidationError>;

/// A plain value transfer: `from` pays `value_wei` to `to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRequest {
    /// Sender address
    pub from: Address,

    /// Recipient address (account or contract)
    pub to: Address,

    /// Amount in wei
    pub value_wei: u128,
}

impl TransferRequest {
    pub fn new(from: Address, to: Address, value_wei: u128) -> Self {
        Self { from, to, value_wei }
    }

    /// Structural validation: both addresses canonical, distinct endpoints.
    /// Zero-value transfers are allowed.
    pub fn validate_basic(&self) -> ValidationResult {
        if !is_canonical_address(&self.from) {
            return Err(TransferValidationError::InvalidAddress(self.from.clone()));
        }
        if !is_canonical_address(&self.to) {
            return Err(TransferValidationError::InvalidAddress(self.to.clone()));
        }
        if self.from == self.to {
            return Err(TransferValidationError::SelfTransfer(self.from.clone()));
        }
        Ok(())
    }
}

/// Canonical address shape: `0x` + 40 lowercase hex chars.
pub fn is_canonical_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
