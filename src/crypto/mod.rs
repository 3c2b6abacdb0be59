//! Account signing identities and signature verification.
//!
//! An account id is the hex-encoded Ed25519 public key of the account, so
//! verification needs no key registry: the authoring account id embedded in
//! a packet is itself the verification key.
//!
//! Key material is constructed per use (per test, per session) rather than
//! held in any process-wide singleton.

use ring::rand::SystemRandom;
use ring::signature::{self, Ed25519KeyPair, KeyPair};
use thiserror::Error;

use crate::model::AccountId;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed")]
    KeyGeneration,

    #[error("account id is not a valid hex-encoded public key")]
    MalformedAccountId,

    #[error("signature verification failed")]
    BadSignature,
}

/// An account's Ed25519 signing keypair.
pub struct AccountKey {
    keypair: Ed25519KeyPair,
    account: AccountId,
}

impl AccountKey {
    /// Generate a fresh keypair with the system RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let rng = SystemRandom::new();
        let pkcs8 =
            Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| CryptoError::KeyGeneration)?;
        let keypair =
            Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| CryptoError::KeyGeneration)?;
        let account = AccountId(hex::encode(keypair.public_key().as_ref()));
        Ok(Self { keypair, account })
    }

    /// The account identity derived from this key (hex public key).
    pub fn account_id(&self) -> &AccountId {
        &self.account
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message).as_ref().to_vec()
    }
}

/// Verify `signature` over `message` against the public key encoded in
/// `account`.
pub fn verify(account: &AccountId, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key_bytes = hex::decode(&account.0).map_err(|_| CryptoError::MalformedAccountId)?;
    let public_key = signature::UnparsedPublicKey::new(&signature::ED25519, key_bytes);
    public_key
        .verify(message, signature)
        .map_err(|_| CryptoError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let key = AccountKey::generate().unwrap();
        let sig = key.sign(b"bulletin payload");
        verify(key.account_id(), b"bulletin payload", &sig).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let key = AccountKey::generate().unwrap();
        let sig = key.sign(b"bulletin payload");
        let err = verify(key.account_id(), b"tampered payload", &sig).unwrap_err();
        assert!(matches!(err, CryptoError::BadSignature));
    }

    #[test]
    fn verify_rejects_wrong_account() {
        let signer = AccountKey::generate().unwrap();
        let other = AccountKey::generate().unwrap();
        let sig = signer.sign(b"payload");
        assert!(verify(other.account_id(), b"payload", &sig).is_err());
    }

    #[test]
    fn verify_rejects_malformed_account_id() {
        let key = AccountKey::generate().unwrap();
        let sig = key.sign(b"payload");
        let bogus = AccountId("not hex!".to_string());
        let err = verify(&bogus, b"payload", &sig).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedAccountId));
    }

    #[test]
    fn distinct_keys_get_distinct_accounts() {
        let a = AccountKey::generate().unwrap();
        let b = AccountKey::generate().unwrap();
        assert_ne!(a.account_id(), b.account_id());
    }
}
