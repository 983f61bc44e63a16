use thiserror::Error;

use crate::contract::RevertReason;

#[derive(Error, Debug)]
pub enum TestchainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("BIP39 error: {0}")]
    Bip39(String),

    #[error("BIP32 error: {0}")]
    Bip32(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    /// A contract call rejected with a human-readable reason.
    /// Chain state is unchanged when this is returned.
    #[error("Reverted: {0}")]
    Revert(#[from] RevertReason),
}

impl TestchainError {
    /// The exact revert reason string, when the error is a revert.
    /// Tests match on this verbatim.
    pub fn revert_reason(&self) -> Option<&'static str> {
        match self {
            TestchainError::Revert(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TestchainError>;

impl From<bip39::Error> for TestchainError {
    fn from(err: bip39::Error) -> Self {
        TestchainError::Bip39(err.to_string())
    }
}

impl From<secp256k1::Error> for TestchainError {
    fn from(err: secp256k1::Error) -> Self {
        TestchainError::Crypto(err.to_string())
    }
}

impl From<bip32::Error> for TestchainError {
    fn from(err: bip32::Error) -> Self {
        TestchainError::Bip32(err.to_string())
    }
}
