/// Send pipeline: account lookup, signing, broadcast and reply
/// normalization, plus the handle used to wait for inclusion
use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::chain::client::LcdClient;
use crate::chain::codes::SdkErrorCodes;
use crate::chain::inclusion::InclusionPoller;
use crate::chain::response::normalize;
use crate::chain::traits::{AccountLookup, CodeLookup, Signer, Transport, TxQuery};
use crate::chain::tx_builder::{attach_signature, broadcast_body, build_unsigned, sign_message};
use crate::chain::types::{BroadcastMode, TransactionRequest};
use crate::error::SendError;

/// Node and broadcast settings for a `TxSender`
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// REST endpoint, e.g. "http://localhost:1317"
    pub node_url: String,
    pub chain_id: String,
    pub broadcast_mode: BroadcastMode,
    /// Budget used by `SendHandle::check_inclusion`
    pub inclusion: InclusionPoller,
    /// HTTP timeout for the default REST collaborators
    pub request_timeout: Duration,
}

impl SenderConfig {
    pub fn new(node_url: impl Into<String>, chain_id: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            chain_id: chain_id.into(),
            broadcast_mode: BroadcastMode::default(),
            inclusion: InclusionPoller::default(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Broadcast endpoint
    pub fn txs_url(&self) -> String {
        format!("{}/txs", self.node_url.trim_end_matches('/'))
    }
}

/// External services the pipeline talks to
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountLookup>,
    pub transport: Arc<dyn Transport>,
    pub txs: Arc<dyn TxQuery>,
    pub codes: Arc<dyn CodeLookup>,
}

impl Collaborators {
    /// REST client for everything, SDK codespace for error codes
    pub fn lcd(client: LcdClient) -> Self {
        let client = Arc::new(client);
        Self {
            accounts: client.clone(),
            transport: client.clone(),
            txs: client,
            codes: Arc::new(SdkErrorCodes),
        }
    }
}

/// Builds, signs and broadcasts single-signer transactions
#[derive(Clone)]
pub struct TxSender {
    config: SenderConfig,
    collaborators: Collaborators,
}

impl TxSender {
    pub fn new(config: SenderConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Sender backed by the node's REST API
    pub fn from_lcd(config: SenderConfig) -> Result<Self> {
        let client = LcdClient::new(config.node_url.clone(), config.request_timeout)?;
        Ok(Self::new(config, Collaborators::lcd(client)))
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Send one transaction from `sender_address`
    ///
    /// The account state is fetched fresh on every call. A stale sequence
    /// is not retried; it comes back as a `ChainRejection`.
    pub async fn send(
        &self,
        request: &TransactionRequest,
        sender_address: &str,
        signer: &dyn Signer,
    ) -> Result<SendHandle, SendError> {
        let unsigned = build_unsigned(request)?;

        let account = self
            .collaborators
            .accounts
            .account(sender_address)
            .await
            .map_err(SendError::AccountLookup)?;
        log::debug!(
            "Signing for {} with account_number={}, sequence={}",
            sender_address,
            account.account_number,
            account.sequence
        );

        let sign_bytes = sign_message(&unsigned, &account, &self.config.chain_id).to_sign_bytes()?;
        let output = signer.sign(&sign_bytes).await.map_err(SendError::Signing)?;

        let signed = attach_signature(&unsigned, &output, &account);
        let body = broadcast_body(&signed, &self.config.broadcast_mode)?;

        let url = self.config.txs_url();
        log::info!(
            "Broadcasting {} message(s) to {} (mode {})",
            signed.messages.len(),
            url,
            self.config.broadcast_mode
        );
        let reply = self.collaborators.transport.post_json(&url, &body).await;

        let accepted = normalize(&reply, self.collaborators.codes.as_ref()).map_err(|e| {
            log::warn!("Broadcast failed: {}", e);
            e
        })?;
        log::info!("Transaction accepted: {}", accepted.hash);

        Ok(SendHandle {
            hash: accepted.hash,
            sequence: account.sequence,
            query: self.collaborators.txs.clone(),
            poller: self.config.inclusion,
        })
    }
}

/// Result of a successful broadcast
///
/// `check_inclusion` polls again on every call; nothing is cached.
#[derive(Clone)]
pub struct SendHandle {
    pub hash: String,
    /// Sequence the transaction was signed with
    pub sequence: u64,
    query: Arc<dyn TxQuery>,
    poller: InclusionPoller,
}

impl SendHandle {
    /// Wait until the transaction is in a block, within the poll budget
    pub async fn check_inclusion(&self) -> Result<Value, SendError> {
        self.poller.wait_for(&self.hash, self.query.as_ref()).await
    }

    /// Like `check_inclusion`, stopping early when `abort` turns true
    pub async fn check_inclusion_or_abort(
        &self,
        abort: watch::Receiver<bool>,
    ) -> Result<Value, SendError> {
        self.poller
            .wait_for_or_abort(&self.hash, self.query.as_ref(), abort)
            .await
    }

    /// Use a different poll budget for this handle
    pub fn with_poller(mut self, poller: InclusionPoller) -> Self {
        self.poller = poller;
        self
    }
}

impl fmt::Debug for SendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendHandle")
            .field("hash", &self.hash)
            .field("sequence", &self.sequence)
            .field("poller", &self.poller)
            .finish()
    }
}
