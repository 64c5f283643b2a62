// Library exports for cosmos_tx_sender

pub mod chain;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use chain::{
    CosmosWallet, InclusionPoller, LcdClient, LocalSigner, SendHandle, SenderConfig,
    TransactionRequest, TxSender,
};
pub use error::{SendError, TransportError};
