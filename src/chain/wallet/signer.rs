use anyhow::Result;
use async_trait::async_trait;
use secp256k1::{Message, Secp256k1};
use sha2::{Digest, Sha256};

use crate::chain::traits::Signer;
use crate::chain::types::SignerOutput;
use crate::chain::wallet::CosmosWallet;

/// Signs with a key held in memory
/// Signatures are 64-byte compact secp256k1 over SHA256 of the sign bytes
pub struct LocalSigner {
    secp: Secp256k1<secp256k1::All>,
    wallet: CosmosWallet,
}

impl LocalSigner {
    pub fn new(wallet: CosmosWallet) -> Self {
        Self {
            secp: Secp256k1::new(),
            wallet,
        }
    }

    pub fn address(&self) -> &str {
        &self.wallet.address
    }

    /// Sign bytes synchronously
    pub fn sign_bytes(&self, sign_bytes: &[u8]) -> Result<SignerOutput> {
        let hash: [u8; 32] = Sha256::digest(sign_bytes).into();
        let message = Message::from_digest_slice(&hash)?;

        // libsecp256k1 always produces low-S signatures, which the node requires
        let signature = self.secp.sign_ecdsa(&message, &self.wallet.private_key()?);

        Ok(SignerOutput {
            signature: signature.serialize_compact().to_vec(),
            public_key: self.wallet.public_key_compressed().to_vec(),
        })
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(&self, sign_bytes: &[u8]) -> Result<SignerOutput> {
        self.sign_bytes(sign_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{ecdsa::Signature, PublicKey};

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn signer() -> LocalSigner {
        LocalSigner::new(CosmosWallet::from_mnemonic_default(MNEMONIC).unwrap())
    }

    #[test]
    fn test_signature_shape() {
        let output = signer().sign_bytes(b"test transaction data").unwrap();

        assert_eq!(output.signature.len(), 64);
        assert_eq!(output.public_key.len(), 33);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = signer();
        let first = signer.sign_bytes(b"payload").unwrap();
        let second = signer.sign_bytes(b"payload").unwrap();
        assert_eq!(first, second);

        let other = signer.sign_bytes(b"other payload").unwrap();
        assert_ne!(first.signature, other.signature);
    }

    #[test]
    fn test_signature_verifies() {
        let payload = br#"{"account_number":"1","chain_id":"test","sequence":"0"}"#;
        let output = signer().sign_bytes(payload).unwrap();

        let secp = Secp256k1::verification_only();
        let hash: [u8; 32] = Sha256::digest(payload).into();
        let message = Message::from_digest_slice(&hash).unwrap();
        let signature = Signature::from_compact(&output.signature).unwrap();
        let public_key = PublicKey::from_slice(&output.public_key).unwrap();

        assert!(secp.verify_ecdsa(&message, &signature, &public_key).is_ok());
    }

    #[tokio::test]
    async fn test_async_sign_matches_sync() {
        let signer = signer();
        let via_trait = signer.sign(b"payload").await.unwrap();
        assert_eq!(via_trait, signer.sign_bytes(b"payload").unwrap());
    }
}
