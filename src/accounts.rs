//! Deterministic dev signer derivation.
//!
//! Signers are derived from a BIP39 mnemonic along the BIP32 path
//! `m/44'/60'/0'/0/{index}`. Same mnemonic, same index → same address,
//! on every run and every machine. The chain funds these accounts at
//! construction; restoring a snapshot never regenerates them.

use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::chain::state::Address;
use crate::error::{Result, TestchainError};
use crate::mnemonic::validate_mnemonic;

/// Number of address bytes taken from the hashed public key.
const ADDRESS_LEN: usize = 20;

/// A funded development account: derived keypair plus its chain address.
#[derive(Debug, Clone)]
pub struct Signer {
    index: u32,
    address: Address,
    public_key: PublicKey,
    secret_key: SecretKey,
}

/// Serializable signer view for CLI and diagnostic output. Carries no key
/// material beyond the public key.
#[derive(Debug, Clone, Serialize)]
pub struct SignerSummary {
    pub index: u32,
    pub address: Address,
    pub public_key: String,
    pub derivation_path: String,
}

impl Signer {
    /// BIP44 index of this signer within its mnemonic.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Chain address, `0x` + 40 lowercase hex chars.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// secp256k1 public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// secp256k1 secret key. Dev-only material.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn summary(&self) -> SignerSummary {
        SignerSummary {
            index: self.index,
            address: self.address.clone(),
            public_key: hex::encode(self.public_key.serialize()),
            derivation_path: signer_path(self.index),
        }
    }
}

/// Derivation path for signer `index`.
fn signer_path(index: u32) -> String {
    format!("m/44'/60'/0'/0/{}", index)
}

/// Derives the chain address from a public key: last 20 bytes of the
/// SHA-256 of the uncompressed key body, hex-encoded with a `0x` prefix.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let mut hasher = Sha256::new();
    // Skip the 0x04 marker byte; hash the 64-byte coordinate body.
    hasher.update(&uncompressed[1..]);
    let digest = hex::encode(hasher.finalize());
    format!("0x{}", &digest[digest.len() - ADDRESS_LEN * 2..])
}

/// Derives `count` signers from the mnemonic, indices `0..count`.
pub fn derive_signers(mnemonic: &str, count: usize) -> Result<Vec<Signer>> {
    if count == 0 {
        return Err(TestchainError::Validation(
            "signer count must be greater than 0".to_string(),
        ));
    }
    if !validate_mnemonic(mnemonic) {
        return Err(TestchainError::Validation(
            "Provided mnemonic is not valid according to BIP39".to_string(),
        ));
    }

    let secp = Secp256k1::new();
    let mnemonic_obj = Mnemonic::parse_in_normalized(Language::English, mnemonic)?;
    let master_seed = mnemonic_obj.to_seed("");
    let root_xprv = XPrv::new(&master_seed)?;

    let mut signers = Vec::with_capacity(count);
    for index in 0..count as u32 {
        let derivation_path: DerivationPath = signer_path(index)
            .parse()
            .map_err(|e| TestchainError::Bip32(format!("Invalid derivation path: {}", e)))?;

        let node = derivation_path
            .iter()
            .fold(Ok(root_xprv.clone()), |acc: bip32::Result<XPrv>, child_num| {
                acc?.derive_child(child_num)
            })?;
        let secret_key = SecretKey::from_slice(&node.private_key().to_bytes())
            .map_err(|e| TestchainError::Crypto(format!("Invalid private key: {}", e)))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        signers.push(Signer {
            index,
            address: address_from_public_key(&public_key),
            public_key,
            secret_key,
        });
    }

    Ok(signers)
}
