pub mod client;
pub mod codes;
pub mod inclusion;
pub mod response;
pub mod sender;
pub mod traits;
pub mod tx_builder;
pub mod types;
pub mod wallet;

pub use client::LcdClient;
pub use codes::SdkErrorCodes;
pub use inclusion::InclusionPoller;
pub use response::{normalize, Accepted, BroadcastReply};
pub use sender::{Collaborators, SendHandle, SenderConfig, TxSender};
pub use traits::{AccountLookup, CodeLookup, Signer, Transport, TxQuery};
pub use types::{
    AccountMeta, BroadcastMode, Coin, GasPrice, SignMessage, SignatureEnvelope, SignerOutput,
    StdTx, TransactionRequest,
};
pub use wallet::{CosmosWallet, LocalSigner};
