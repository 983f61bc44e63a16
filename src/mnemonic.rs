use bip39::{Language, Mnemonic};
use rand::Rng;

use crate::error::Result;

/// Well-known development mnemonic. Every chain built with the default
/// config derives its signers from this phrase, so addresses are stable
/// across runs and machines. Never fund it with real value.
pub const DEV_MNEMONIC: &str =
    "test test test test test test test test test test test junk";

/// Generates a fresh BIP39 mnemonic phrase (24 words, 256 bits of entropy)
/// for operators who want a chain with non-default signer addresses.
pub fn generate_mnemonic() -> Result<String> {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill(&mut entropy);

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)?;
    Ok(mnemonic.to_string())
}

/// Validates a BIP39 mnemonic phrase
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, mnemonic).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_mnemonic() {
        let mnemonic = generate_mnemonic().unwrap();
        assert!(!mnemonic.is_empty());
        assert_eq!(mnemonic.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&mnemonic));
    }

    #[test]
    fn test_validate_mnemonic() {
        assert!(validate_mnemonic(DEV_MNEMONIC));
        assert!(!validate_mnemonic("invalid mnemonic phrase here"));
    }

    #[test]
    fn test_generated_mnemonics_differ() {
        let a = generate_mnemonic().unwrap();
        let b = generate_mnemonic().unwrap();
        assert_ne!(a, b);
    }
}
