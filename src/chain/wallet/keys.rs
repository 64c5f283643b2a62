use anyhow::{anyhow, Result};
use bech32::{self, Hrp};
use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// BIP44 path for coin type 118 (ATOM and most Cosmos chains)
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";
pub const DEFAULT_ADDRESS_PREFIX: &str = "cosmos";

/// Key pair for a Cosmos account
/// Private key bytes are wiped on drop
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct CosmosWallet {
    #[zeroize(skip)] // Public data doesn't need zeroizing
    pub address: String,

    private_key_bytes: [u8; 32],
    public_key_bytes: [u8; 33],
}

impl CosmosWallet {
    /// Derive the wallet from a BIP39 mnemonic, optional passphrase and
    /// bech32 address prefix
    pub fn from_mnemonic(mnemonic_str: &str, passphrase: &str, prefix: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse(mnemonic_str.trim())
            .map_err(|e| anyhow!("Invalid mnemonic: {}", e))?;
        let mut seed = mnemonic.to_seed(passphrase);

        let path: DerivationPath = COSMOS_HD_PATH
            .parse()
            .map_err(|e| anyhow!("Invalid derivation path: {}", e))?;
        let derived = XPrv::derive_from_path(seed, &path)
            .map_err(|e| anyhow!("Failed to derive key: {}", e));
        seed.zeroize();
        let mut private_key = derived?.to_bytes();

        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&private_key)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let address = cosmos_address(&public_key, prefix)?;

        let private_key_bytes = private_key;
        private_key.zeroize();

        Ok(Self {
            address,
            private_key_bytes,
            public_key_bytes: public_key.serialize(),
        })
    }

    /// Derive with no passphrase and the `cosmos` prefix
    pub fn from_mnemonic_default(mnemonic_str: &str) -> Result<Self> {
        Self::from_mnemonic(mnemonic_str, "", DEFAULT_ADDRESS_PREFIX)
    }

    /// Note: Caller is responsible for secure handling
    pub fn private_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.private_key_bytes)
            .map_err(|e| anyhow!("Invalid private key: {}", e))
    }

    /// Compressed secp256k1 public key (33 bytes)
    pub fn public_key_compressed(&self) -> [u8; 33] {
        self.public_key_bytes
    }
}

/// bech32(prefix, RIPEMD160(SHA256(compressed public key)))
fn cosmos_address(public_key: &PublicKey, prefix: &str) -> Result<String> {
    let sha = Sha256::digest(public_key.serialize());
    let hash = Ripemd160::digest(sha);

    let hrp = Hrp::parse(prefix).map_err(|e| anyhow!("Invalid address prefix {:?}: {}", prefix, e))?;
    let encoded = bech32::encode::<bech32::Bech32>(hrp, &hash)?;

    Ok(encoded)
}
