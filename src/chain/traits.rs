/// Collaborator contracts the send pipeline depends on
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::chain::types::{AccountMeta, SignerOutput};
use crate::error::TransportError;

/// Looks up the current account number and sequence of an address
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn account(&self, address: &str) -> Result<AccountMeta>;
}

/// Anything that can sign canonical sign bytes: local keys, hardware
/// wallets, remote signing services
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, sign_bytes: &[u8]) -> Result<SignerOutput>;
}

/// Fetches a transaction by hash; an error means it is not visible yet
#[async_trait]
pub trait TxQuery: Send + Sync {
    async fn tx(&self, hash: &str) -> Result<Value>;
}

/// Posts a JSON body and returns the parsed JSON reply
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> std::result::Result<Value, TransportError>;
}

/// Translates a chain result code into readable text
pub trait CodeLookup: Send + Sync {
    /// Must return something for every code, known or not
    fn message_for(&self, code: u32) -> String;
}
